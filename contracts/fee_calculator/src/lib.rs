//! # Fee Calculator
//!
//! Fee rate registry: one fee rate per operation type (basis points) and the
//! treasury / reward-pool split used for quotes. Rates are supplied at
//! initialization; only `ParameterSetter` holders can change them afterwards.

#![no_std]

use custody_shared::access;
use custody_shared::bps::{apply_bps, check_rate, split_fee, validated_split};
use custody_shared::types::require_non_zero;
use custody_shared::{Capability, DistributionSplit, Error, OperationType};
use soroban_sdk::{contract, contractimpl, contracttype, log, Address, Env, Symbol};

/// Initial rate per operation type, in basis points.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FeeSchedule {
    pub invest_bps: u32,
    pub divest_bps: u32,
    pub emergency_exit_bps: u32,
}

/// Fee for one operation and how it would be distributed.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FeeQuote {
    pub fee: i128,
    pub treasury_fee: i128,
    pub reward_fee: i128,
    /// What proceeds to the destination after the fee is withheld.
    pub net_amount: i128,
}

#[contracttype]
pub enum DataKey {
    Initialized,
    /// Rate in basis points per operation type.
    FeeBps(OperationType),
    Split,
}

#[contract]
pub struct FeeCalculator;

#[contractimpl]
impl FeeCalculator {
    /// Initialize rates and split. `admin` manages capabilities,
    /// `parameter_setter` may update rates and the split.
    pub fn initialize(
        e: Env,
        admin: Address,
        parameter_setter: Address,
        schedule: FeeSchedule,
        treasury_share: u32,
        reward_share: u32,
    ) -> Result<(), Error> {
        if e.storage().instance().has(&DataKey::Initialized) {
            return Err(Error::AlreadyInitialized);
        }
        admin.require_auth();
        require_non_zero(&e, &parameter_setter)?;
        let split = validated_split(treasury_share, reward_share)?;
        let rates = [
            (OperationType::Invest, check_rate(schedule.invest_bps)?),
            (OperationType::Divest, check_rate(schedule.divest_bps)?),
            (OperationType::EmergencyExit, check_rate(schedule.emergency_exit_bps)?),
        ];
        for (operation, bps) in rates {
            e.storage().instance().set(&DataKey::FeeBps(operation), &bps);
        }
        e.storage().instance().set(&DataKey::Split, &split);
        e.storage().instance().set(&DataKey::Initialized, &true);
        access::assign(&e, &admin, Capability::Admin);
        access::assign(&e, &parameter_setter, Capability::ParameterSetter);
        e.events().publish(
            (Symbol::new(&e, "fee_calculator_initialized"),),
            (admin, schedule, split),
        );
        Ok(())
    }

    /// `floor(amount * rate / 10000)` for `operation`. Pure.
    pub fn calculate_fee(e: Env, operation: OperationType, amount: i128) -> Result<i128, Error> {
        apply_bps(amount, read_rate(&e, operation)?)
    }

    /// Fee, its treasury / reward split and the net amount for `operation`.
    pub fn quote(e: Env, operation: OperationType, amount: i128) -> Result<FeeQuote, Error> {
        let fee = apply_bps(amount, read_rate(&e, operation)?)?;
        let (treasury_fee, reward_fee) = split_fee(fee, &read_split(&e)?)?;
        Ok(FeeQuote {
            fee,
            treasury_fee,
            reward_fee,
            net_amount: amount - fee,
        })
    }

    /// Set the rate for `operation`. Caller must hold `ParameterSetter`.
    pub fn update_fee_percentage(
        e: Env,
        caller: Address,
        operation: OperationType,
        new_bps: u32,
    ) -> Result<(), Error> {
        access::require_capability(&e, &caller, Capability::ParameterSetter)?;
        if new_bps > custody_shared::bps::BASIS_POINTS {
            log!(&e, "fee rate out of range: {}", new_bps);
            return Err(Error::OutOfRange);
        }
        let old_bps = read_rate(&e, operation)?;
        e.storage()
            .instance()
            .set(&DataKey::FeeBps(operation), &new_bps);
        e.events().publish(
            (Symbol::new(&e, "fee_percentage_updated"), operation),
            (old_bps, new_bps),
        );
        Ok(())
    }

    /// Replace the split. Both shares are written together or not at all.
    pub fn update_distribution_split(
        e: Env,
        caller: Address,
        treasury_share: u32,
        reward_share: u32,
    ) -> Result<(), Error> {
        access::require_capability(&e, &caller, Capability::ParameterSetter)?;
        let split = validated_split(treasury_share, reward_share)?;
        let old = read_split(&e)?;
        e.storage().instance().set(&DataKey::Split, &split);
        e.events().publish(
            (Symbol::new(&e, "distribution_split_updated"),),
            (old, split),
        );
        Ok(())
    }

    pub fn get_fee_percentage(e: Env, operation: OperationType) -> Result<u32, Error> {
        read_rate(&e, operation)
    }

    pub fn get_fee_schedule(e: Env) -> Result<FeeSchedule, Error> {
        Ok(FeeSchedule {
            invest_bps: read_rate(&e, OperationType::Invest)?,
            divest_bps: read_rate(&e, OperationType::Divest)?,
            emergency_exit_bps: read_rate(&e, OperationType::EmergencyExit)?,
        })
    }

    pub fn get_distribution_split(e: Env) -> Result<DistributionSplit, Error> {
        read_split(&e)
    }

    pub fn grant_capability(
        e: Env,
        granter: Address,
        account: Address,
        capability: Capability,
    ) -> Result<(), Error> {
        access::grant_capability(&e, &granter, &account, capability)
    }

    pub fn revoke_capability(
        e: Env,
        revoker: Address,
        account: Address,
        capability: Capability,
    ) -> Result<(), Error> {
        access::revoke_capability(&e, &revoker, &account, capability)
    }

    pub fn renounce_capability(e: Env, account: Address, capability: Capability) -> Result<(), Error> {
        access::renounce_capability(&e, &account, capability)
    }

    pub fn has_capability(e: Env, account: Address, capability: Capability) -> bool {
        access::has_capability(&e, &account, capability)
    }
}

fn read_rate(e: &Env, operation: OperationType) -> Result<u32, Error> {
    e.storage()
        .instance()
        .get(&DataKey::FeeBps(operation))
        .ok_or(Error::NotInitialized)
}

fn read_split(e: &Env) -> Result<DistributionSplit, Error> {
    e.storage()
        .instance()
        .get(&DataKey::Split)
        .ok_or(Error::NotInitialized)
}

//! # Fee Processor
//!
//! Collects the fee on a value-changing operation and splits it between the
//! custody treasury and the reward pool. The fee itself is quoted by the fee
//! calculator; the split applied here is the processor's own configuration.
//!
//! A collection either moves every share or nothing: any failed transfer makes
//! `collect_fee` return an error and the host discards the whole invocation.

#![no_std]

use custody_shared::access;
use custody_shared::allowance;
use custody_shared::bps::{split_fee, validated_split};
use custody_shared::guard::{self, non_reentrant};
use custody_shared::interfaces::{FeeRateClient, TreasuryLedgerClient};
use custody_shared::types::require_non_zero;
use custody_shared::{Capability, DistributionSplit, Error, OperationType};
use soroban_sdk::auth::{ContractContext, InvokerContractAuthEntry, SubContractInvocation};
use soroban_sdk::{
    contract, contractimpl, contracttype, log, vec, Address, Env, IntoVal, String, Symbol,
};

/// Lifetime of the allowance handed to the treasury for one deposit. The
/// treasury consumes it within the same invocation.
pub const TREASURY_APPROVAL_LEDGERS: u32 = 100;

#[contracttype]
pub enum DataKey {
    FeeCalculator,
    Treasury,
    RewardPool,
    Split,
    /// Cumulative fees collected per asset.
    TotalCollected(Address),
}

#[contract]
pub struct FeeProcessor;

#[contractimpl]
impl FeeProcessor {
    /// Initialize the processor.
    /// @param admin Manages capabilities and runs the setters
    /// @param fee_calculator Fee rate source
    /// @param treasury Custody treasury receiving the treasury share
    /// @param reward_pool Account receiving the reward share
    pub fn initialize(
        e: Env,
        admin: Address,
        fee_calculator: Address,
        treasury: Address,
        reward_pool: Address,
        treasury_share: u32,
        reward_share: u32,
    ) -> Result<(), Error> {
        if e.storage().instance().has(&DataKey::FeeCalculator) {
            return Err(Error::AlreadyInitialized);
        }
        admin.require_auth();
        require_non_zero(&e, &fee_calculator)?;
        require_non_zero(&e, &treasury)?;
        require_non_zero(&e, &reward_pool)?;
        let split = validated_split(treasury_share, reward_share)?;

        let storage = e.storage().instance();
        storage.set(&DataKey::FeeCalculator, &fee_calculator);
        storage.set(&DataKey::Treasury, &treasury);
        storage.set(&DataKey::RewardPool, &reward_pool);
        storage.set(&DataKey::Split, &split);
        access::assign(&e, &admin, Capability::Admin);
        e.events().publish(
            (Symbol::new(&e, "fee_processor_initialized"),),
            (admin, treasury, reward_pool, split),
        );
        Ok(())
    }

    /// Collect the fee on `amount` for `operation` from `caller`, who must
    /// hold `AuthorizedCaller` and have approved this contract for the fee.
    /// Returns the fee; 0 means nothing moved and nothing was recorded.
    pub fn collect_fee(
        e: Env,
        caller: Address,
        operation: OperationType,
        asset: Address,
        amount: i128,
    ) -> Result<i128, Error> {
        access::require_capability(&e, &caller, Capability::AuthorizedCaller)?;
        let calculator = FeeRateClient::new(&e, &address_at(&e, &DataKey::FeeCalculator)?);
        let fee = match calculator.try_calculate_fee(&operation, &amount) {
            Ok(Ok(fee)) => fee,
            Err(Ok(err)) => return Err(err),
            _ => return Err(Error::CollaboratorFailed),
        };
        if fee == 0 {
            return Ok(0);
        }
        let (treasury_fee, reward_fee) = split_fee(fee, &read_split(&e)?)?;
        let treasury = address_at(&e, &DataKey::Treasury)?;
        let reward_pool = address_at(&e, &DataKey::RewardPool)?;
        let native = match TreasuryLedgerClient::new(&e, &treasury).try_get_native_asset() {
            Ok(Ok(native)) => native,
            _ => return Err(Error::CollaboratorFailed),
        };

        non_reentrant(&e, || {
            let this = e.current_contract_address();
            allowance::pull_from(&e, &asset, &caller, &this, fee)?;
            if treasury_fee > 0 {
                deposit_into_treasury(&e, &treasury, &asset, asset == native, treasury_fee)?;
            }
            if reward_fee > 0 {
                allowance::transfer_out(&e, &asset, &reward_pool, reward_fee)?;
            }

            let key = DataKey::TotalCollected(asset.clone());
            let total: i128 = e.storage().instance().get(&key).unwrap_or(0);
            let total = total.checked_add(fee).ok_or(Error::ArithmeticOverflow)?;
            e.storage().instance().set(&key, &total);
            e.events().publish(
                (Symbol::new(&e, "fee_collected"), operation),
                (asset.clone(), fee, treasury_fee, reward_fee),
            );
            Ok(fee)
        })
    }

    /// Replace the split applied by `collect_fee`. Admin only.
    pub fn update_distribution_percentages(
        e: Env,
        caller: Address,
        treasury_share: u32,
        reward_share: u32,
    ) -> Result<(), Error> {
        access::require_capability(&e, &caller, Capability::Admin)?;
        let split = validated_split(treasury_share, reward_share)?;
        let old = read_split(&e)?;
        e.storage().instance().set(&DataKey::Split, &split);
        e.events().publish(
            (Symbol::new(&e, "distribution_percentages_updated"),),
            (old, split),
        );
        Ok(())
    }

    pub fn update_treasury(e: Env, caller: Address, treasury: Address) -> Result<(), Error> {
        replace_address(&e, &caller, DataKey::Treasury, treasury, "treasury_updated")
    }

    pub fn update_reward_pool(e: Env, caller: Address, reward_pool: Address) -> Result<(), Error> {
        replace_address(&e, &caller, DataKey::RewardPool, reward_pool, "reward_pool_updated")
    }

    pub fn update_fee_calculator(
        e: Env,
        caller: Address,
        fee_calculator: Address,
    ) -> Result<(), Error> {
        replace_address(
            &e,
            &caller,
            DataKey::FeeCalculator,
            fee_calculator,
            "fee_calculator_updated",
        )
    }

    pub fn get_distribution_percentages(e: Env) -> Result<DistributionSplit, Error> {
        read_split(&e)
    }

    pub fn get_treasury(e: Env) -> Result<Address, Error> {
        address_at(&e, &DataKey::Treasury)
    }

    pub fn get_reward_pool(e: Env) -> Result<Address, Error> {
        address_at(&e, &DataKey::RewardPool)
    }

    pub fn get_fee_calculator(e: Env) -> Result<Address, Error> {
        address_at(&e, &DataKey::FeeCalculator)
    }

    /// Cumulative fees collected in `asset`.
    pub fn get_total_collected(e: Env, asset: Address) -> i128 {
        e.storage()
            .instance()
            .get(&DataKey::TotalCollected(asset))
            .unwrap_or(0)
    }

    pub fn is_locked(e: Env) -> bool {
        guard::is_entered(&e)
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

fn address_at(e: &Env, key: &DataKey) -> Result<Address, Error> {
    e.storage().instance().get(key).ok_or(Error::NotInitialized)
}

fn read_split(e: &Env) -> Result<DistributionSplit, Error> {
    e.storage()
        .instance()
        .get(&DataKey::Split)
        .ok_or(Error::NotInitialized)
}

fn replace_address(
    e: &Env,
    caller: &Address,
    key: DataKey,
    new: Address,
    event: &str,
) -> Result<(), Error> {
    access::require_capability(e, caller, Capability::Admin)?;
    require_non_zero(e, &new)?;
    let old = address_at(e, &key)?;
    e.storage().instance().set(&key, &new);
    e.events().publish((Symbol::new(e, event),), (old, new));
    Ok(())
}

/// Hand `amount` to the treasury through its `deposit`, so the receipt is
/// credited to its ledger. The native asset is pushed: the treasury's
/// transfer out of this contract is pre-authorized. Any other asset is
/// pulled by the treasury against an allowance sized to the deposit.
fn deposit_into_treasury(
    e: &Env,
    treasury: &Address,
    asset: &Address,
    is_native: bool,
    amount: i128,
) -> Result<(), Error> {
    let this = e.current_contract_address();
    let ledger = TreasuryLedgerClient::new(e, treasury);

    if is_native {
        e.authorize_as_current_contract(vec![
            e,
            InvokerContractAuthEntry::Contract(SubContractInvocation {
                context: ContractContext {
                    contract: asset.clone(),
                    fn_name: Symbol::new(e, "transfer"),
                    args: (this.clone(), treasury.clone(), amount).into_val(e),
                },
                sub_invocations: vec![e],
            }),
        ]);
    } else {
        let expiration = e
            .ledger()
            .sequence()
            .saturating_add(TREASURY_APPROVAL_LEDGERS);
        allowance::approve_optimized(e, asset, treasury, amount, expiration)?;
    }

    let memo = String::from_str(e, "protocol fee");
    match ledger.try_deposit(&this, asset, &amount, &memo) {
        Ok(Ok(())) => Ok(()),
        _ => {
            log!(e, "treasury rejected fee deposit of {}", amount);
            Err(Error::TransferFailed)
        }
    }
}

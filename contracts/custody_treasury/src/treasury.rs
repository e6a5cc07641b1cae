//! # Custody Treasury Contract
//!
//! Sole custodian of protocol funds. Keeps a per-asset ledger, accepts
//! deposits, serves withdrawals to the governance controller, relays transfers
//! between protocol components that granted it spending rights, and pays out
//! reward batches. Every balance-moving entry point runs under the reentrancy
//! guard and performs its checks before its effects and its effects before the
//! token call.

use custody_shared::access;
use custody_shared::allowance::{self, live_allowance, live_balance};
use custody_shared::guard::{self, non_reentrant};
use custody_shared::types::require_non_zero;
use custody_shared::{ApprovalReport, Capability, Error};
use soroban_sdk::{contract, contractimpl, contracttype, log, Address, Env, String, Symbol, Vec};

/// Default lifetime of allowances granted by the treasury, in ledgers.
pub const DEFAULT_APPROVAL_TTL: u32 = 100_000;

/// Fund source for accounting and reporting.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FundSource {
    /// Received from a `FeeCollector` (the fee orchestrator).
    ProtocolFee = 0,
    /// Any other deposit.
    Deposit = 1,
}

#[contracttype]
pub enum DataKey {
    /// Native asset contract; deposits of it are pushed by the depositor.
    NativeAsset,
    /// Lifetime in ledgers of allowances the treasury grants.
    ApprovalTtl,
    /// Ledger balance per asset.
    Balance(Address),
    /// Cumulative amount received per (asset, source). Informational only;
    /// withdrawals reduce `Balance` alone.
    ReceivedBySource(Address, FundSource),
}

#[contract]
pub struct CustodyTreasury;

#[contractimpl]
impl CustodyTreasury {
    /// Initialize the treasury.
    /// @param admin Manages capabilities, allowances, relays and payouts
    /// @param controller Protocol governance; the only account allowed to withdraw
    /// @param native_asset Native asset contract
    /// @param approval_ttl_ledgers Lifetime of allowances granted by the treasury
    pub fn initialize(
        e: Env,
        admin: Address,
        controller: Address,
        native_asset: Address,
        approval_ttl_ledgers: u32,
    ) -> Result<(), Error> {
        if e.storage().instance().has(&DataKey::NativeAsset) {
            return Err(Error::AlreadyInitialized);
        }
        admin.require_auth();
        require_non_zero(&e, &controller)?;
        if approval_ttl_ledgers == 0 {
            return Err(Error::InvalidAmount);
        }
        e.storage()
            .instance()
            .set(&DataKey::NativeAsset, &native_asset);
        e.storage()
            .instance()
            .set(&DataKey::ApprovalTtl, &approval_ttl_ledgers);
        access::assign(&e, &admin, Capability::Admin);
        access::assign(&e, &controller, Capability::Controller);
        e.events().publish(
            (Symbol::new(&e, "treasury_initialized"),),
            (admin, controller, native_asset),
        );
        Ok(())
    }

    /// Accept `amount` of `asset` from `from` into the ledger.
    ///
    /// The native asset is pushed by `from` within this call; any other asset
    /// is pulled with the allowance `from` granted the treasury. Deposits by
    /// `FeeCollector` holders are attributed to `FundSource::ProtocolFee`.
    pub fn deposit(
        e: Env,
        from: Address,
        asset: Address,
        amount: i128,
        memo: String,
    ) -> Result<(), Error> {
        from.require_auth();
        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        let native = native_asset(&e)?;
        non_reentrant(&e, || {
            let this = e.current_contract_address();
            let before = live_balance(&e, &asset, &this)?;
            if asset == native {
                allowance::push_from(&e, &asset, &from, &this, amount)?;
            } else {
                let granted = live_allowance(&e, &asset, &from, &this)?;
                if granted < amount {
                    log!(&e, "deposit allowance {} below {}", granted, amount);
                    return Err(Error::InsufficientAllowance);
                }
                allowance::pull_from(&e, &asset, &from, &this, amount)?;
            }
            let after = live_balance(&e, &asset, &this)?;
            if after.checked_sub(before) != Some(amount) {
                return Err(Error::AmountMismatch);
            }

            let source = if access::has_capability(&e, &from, Capability::FeeCollector) {
                FundSource::ProtocolFee
            } else {
                FundSource::Deposit
            };
            credit(&e, &asset, amount)?;
            let key_source = DataKey::ReceivedBySource(asset.clone(), source);
            let received: i128 = e.storage().instance().get(&key_source).unwrap_or(0);
            let received = received
                .checked_add(amount)
                .ok_or(Error::ArithmeticOverflow)?;
            e.storage().instance().set(&key_source, &received);
            e.events().publish(
                (Symbol::new(&e, "treasury_deposit"), asset.clone(), from.clone()),
                (amount, source, memo.clone()),
            );
            Ok(())
        })
    }

    /// Pay `amount` of `asset` out of the ledger to `recipient`. Controller only.
    pub fn withdraw(
        e: Env,
        caller: Address,
        asset: Address,
        recipient: Address,
        amount: i128,
    ) -> Result<(), Error> {
        access::require_capability(&e, &caller, Capability::Controller)?;
        non_reentrant(&e, || {
            require_non_zero(&e, &recipient)?;
            if amount <= 0 {
                return Err(Error::InvalidAmount);
            }
            debit(&e, &asset, amount)?;
            e.events().publish(
                (Symbol::new(&e, "treasury_withdrawal"), asset.clone(), recipient.clone()),
                (amount, caller.clone()),
            );
            allowance::transfer_out(&e, &asset, &recipient, amount)
        })
    }

    /// Set the allowance of `spender` over the treasury's `asset`. Admin only.
    pub fn allow_token_transfer(
        e: Env,
        caller: Address,
        asset: Address,
        spender: Address,
        amount: i128,
    ) -> Result<ApprovalReport, Error> {
        access::require_capability(&e, &caller, Capability::Admin)?;
        require_non_zero(&e, &spender)?;
        let expiration = approval_expiration(&e)?;
        non_reentrant(&e, || {
            allowance::approve_optimized(&e, &asset, &spender, amount, expiration)
        })
    }

    /// Raise the allowance of `spender` by `added`. Admin or fund manager;
    /// a fund manager may only raise an allowance that already exists.
    pub fn increase_allowance(
        e: Env,
        caller: Address,
        asset: Address,
        spender: Address,
        added: i128,
    ) -> Result<ApprovalReport, Error> {
        access::require_any_capability(
            &e,
            &caller,
            &[Capability::Admin, Capability::FundManager],
        )?;
        require_non_zero(&e, &spender)?;
        if added <= 0 {
            return Err(Error::InvalidAmount);
        }
        let expiration = approval_expiration(&e)?;
        non_reentrant(&e, || {
            let current = live_allowance(&e, &asset, &e.current_contract_address(), &spender)?;
            if current == 0 && !access::has_capability(&e, &caller, Capability::Admin) {
                log!(&e, "fund manager cannot open a new allowance");
                return Err(Error::Unauthorized);
            }
            let target = current
                .checked_add(added)
                .ok_or(Error::ArithmeticOverflow)?;
            allowance::approve_optimized(&e, &asset, &spender, target, expiration)
        })
    }

    /// Lower the allowance of `spender` by `subtracted`. Admin or fund manager.
    pub fn decrease_allowance(
        e: Env,
        caller: Address,
        asset: Address,
        spender: Address,
        subtracted: i128,
    ) -> Result<ApprovalReport, Error> {
        access::require_any_capability(
            &e,
            &caller,
            &[Capability::Admin, Capability::FundManager],
        )?;
        if subtracted <= 0 {
            return Err(Error::InvalidAmount);
        }
        let expiration = approval_expiration(&e)?;
        non_reentrant(&e, || {
            let current = live_allowance(&e, &asset, &e.current_contract_address(), &spender)?;
            if current < subtracted {
                return Err(Error::InsufficientAllowance);
            }
            allowance::approve_optimized(&e, &asset, &spender, current - subtracted, expiration)
        })
    }

    /// Drop the allowance of `spender` to zero. Admin or fund manager.
    pub fn clear_approval(
        e: Env,
        caller: Address,
        asset: Address,
        spender: Address,
    ) -> Result<ApprovalReport, Error> {
        access::require_any_capability(
            &e,
            &caller,
            &[Capability::Admin, Capability::FundManager],
        )?;
        let expiration = approval_expiration(&e)?;
        non_reentrant(&e, || {
            allowance::approve_optimized(&e, &asset, &spender, 0, expiration)
        })
    }

    /// Apply `allow_token_transfer` to each entry independently; returns one
    /// success flag per entry. Admin only.
    pub fn batch_allow_token_transfers(
        e: Env,
        caller: Address,
        assets: Vec<Address>,
        spenders: Vec<Address>,
        amounts: Vec<i128>,
    ) -> Result<Vec<bool>, Error> {
        access::require_capability(&e, &caller, Capability::Admin)?;
        let expiration = approval_expiration(&e)?;
        non_reentrant(&e, || {
            allowance::batch_approve(&e, &assets, &spenders, &amounts, expiration)
        })
    }

    /// Move `amount` from `from` to `to` with the spending rights `from`
    /// granted the treasury. Admin only.
    pub fn withdraw_from_protocol(
        e: Env,
        caller: Address,
        asset: Address,
        from: Address,
        to: Address,
        amount: i128,
        purpose: String,
    ) -> Result<(), Error> {
        access::require_capability(&e, &caller, Capability::Admin)?;
        non_reentrant(&e, || {
            require_non_zero(&e, &from)?;
            require_non_zero(&e, &to)?;
            if amount <= 0 {
                return Err(Error::InvalidAmount);
            }
            relay(&e, &asset, &from, &to, amount)?;
            e.events().publish(
                (Symbol::new(&e, "protocol_withdrawal"), asset.clone()),
                (from.clone(), to.clone(), amount, purpose.clone()),
            );
            Ok(())
        })
    }

    /// Relay `amount` along `hop1 -> hop2 -> hop3 -> to`. Each hop only needs
    /// to have granted the treasury an allowance. Admin only.
    #[allow(clippy::too_many_arguments)]
    pub fn execute_delegated_transfer(
        e: Env,
        caller: Address,
        asset: Address,
        hop1: Address,
        hop2: Address,
        hop3: Address,
        to: Address,
        amount: i128,
        purpose: String,
    ) -> Result<(), Error> {
        access::require_capability(&e, &caller, Capability::Admin)?;
        non_reentrant(&e, || {
            for account in [&hop1, &hop2, &hop3, &to] {
                require_non_zero(&e, account)?;
            }
            if amount <= 0 {
                return Err(Error::InvalidAmount);
            }
            relay(&e, &asset, &hop1, &hop2, amount)?;
            relay(&e, &asset, &hop2, &hop3, amount)?;
            relay(&e, &asset, &hop3, &to, amount)?;
            e.events().publish(
                (Symbol::new(&e, "delegated_transfer"), asset.clone()),
                (hop1.clone(), to.clone(), amount, purpose.clone()),
            );
            Ok(())
        })
    }

    /// Pay `amounts[i]` to `recipients[i]` from the ledger. The whole batch
    /// fails if it is empty, if the total exceeds the balance or if any entry
    /// is invalid. Admin only. Returns the total paid.
    pub fn distribute_rewards(
        e: Env,
        caller: Address,
        asset: Address,
        recipients: Vec<Address>,
        amounts: Vec<i128>,
    ) -> Result<i128, Error> {
        access::require_capability(&e, &caller, Capability::Admin)?;
        non_reentrant(&e, || {
            if recipients.len() != amounts.len() {
                return Err(Error::LengthMismatch);
            }
            if recipients.is_empty() {
                return Err(Error::InvalidAmount);
            }
            let mut total: i128 = 0;
            for amount in amounts.iter() {
                total = total.checked_add(amount).ok_or(Error::ArithmeticOverflow)?;
            }
            let balance = spendable(&e, &asset)?;
            if total > balance {
                log!(&e, "reward batch {} exceeds balance {}", total, balance);
                return Err(Error::InsufficientBalance);
            }
            for (recipient, amount) in recipients.iter().zip(amounts.iter()) {
                require_non_zero(&e, &recipient)?;
                if amount <= 0 {
                    return Err(Error::InvalidAmount);
                }
            }

            debit(&e, &asset, total)?;
            e.events().publish(
                (Symbol::new(&e, "rewards_distributed"), asset.clone()),
                (recipients.len(), total),
            );
            for (recipient, amount) in recipients.iter().zip(amounts.iter()) {
                allowance::transfer_out(&e, &asset, &recipient, amount)?;
            }
            Ok(total)
        })
    }

    /// Change the lifetime of allowances granted from now on. Admin only.
    pub fn update_approval_ttl(e: Env, caller: Address, ledgers: u32) -> Result<(), Error> {
        access::require_capability(&e, &caller, Capability::Admin)?;
        if ledgers == 0 {
            return Err(Error::InvalidAmount);
        }
        let old: u32 = e
            .storage()
            .instance()
            .get(&DataKey::ApprovalTtl)
            .ok_or(Error::NotInitialized)?;
        e.storage().instance().set(&DataKey::ApprovalTtl, &ledgers);
        e.events()
            .publish((Symbol::new(&e, "approval_ttl_updated"),), (old, ledgers));
        Ok(())
    }

    /// Ledger balance of `asset`.
    pub fn get_balance(e: Env, asset: Address) -> i128 {
        balance_of(&e, &asset)
    }

    /// Cumulative amount of `asset` received from `source`.
    pub fn get_received_by_source(e: Env, asset: Address, source: FundSource) -> i128 {
        e.storage()
            .instance()
            .get(&DataKey::ReceivedBySource(asset, source))
            .unwrap_or(0)
    }

    /// Live allowance the treasury has granted `spender` over `asset`.
    pub fn get_allowance(e: Env, asset: Address, spender: Address) -> Result<i128, Error> {
        live_allowance(&e, &asset, &e.current_contract_address(), &spender)
    }

    pub fn get_native_asset(e: Env) -> Result<Address, Error> {
        native_asset(&e)
    }

    pub fn get_approval_ttl(e: Env) -> Result<u32, Error> {
        e.storage()
            .instance()
            .get(&DataKey::ApprovalTtl)
            .ok_or(Error::NotInitialized)
    }

    /// True while a guarded operation is in progress.
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

fn native_asset(e: &Env) -> Result<Address, Error> {
    e.storage()
        .instance()
        .get(&DataKey::NativeAsset)
        .ok_or(Error::NotInitialized)
}

fn approval_expiration(e: &Env) -> Result<u32, Error> {
    let ttl: u32 = e
        .storage()
        .instance()
        .get(&DataKey::ApprovalTtl)
        .ok_or(Error::NotInitialized)?;
    Ok(e.ledger().sequence().saturating_add(ttl))
}

fn balance_of(e: &Env, asset: &Address) -> i128 {
    e.storage()
        .instance()
        .get(&DataKey::Balance(asset.clone()))
        .unwrap_or(0)
}

fn credit(e: &Env, asset: &Address, amount: i128) -> Result<(), Error> {
    let balance = balance_of(e, asset)
        .checked_add(amount)
        .ok_or(Error::ArithmeticOverflow)?;
    e.storage()
        .instance()
        .set(&DataKey::Balance(asset.clone()), &balance);
    Ok(())
}

/// Ledger balance capped by what the treasury actually holds. Holdings can
/// fall below the ledger when a spender draws on an allowance the treasury
/// granted.
fn spendable(e: &Env, asset: &Address) -> Result<i128, Error> {
    let held = live_balance(e, asset, &e.current_contract_address())?;
    Ok(balance_of(e, asset).min(held))
}

/// Checked before written: the ledger never goes negative and never stays
/// above holdings after a payout.
fn debit(e: &Env, asset: &Address, amount: i128) -> Result<(), Error> {
    let balance = spendable(e, asset)?;
    if balance < amount {
        log!(e, "ledger balance {} below {}", balance, amount);
        return Err(Error::InsufficientBalance);
    }
    e.storage()
        .instance()
        .set(&DataKey::Balance(asset.clone()), &(balance - amount));
    Ok(())
}

/// One relay leg: live allowance and live balance of `from`, read right
/// before the pull.
fn relay(e: &Env, asset: &Address, from: &Address, to: &Address, amount: i128) -> Result<(), Error> {
    let granted = live_allowance(e, asset, from, &e.current_contract_address())?;
    if granted < amount {
        return Err(Error::InsufficientAllowance);
    }
    if live_balance(e, asset, from)? < amount {
        return Err(Error::InsufficientBalance);
    }
    allowance::pull_from(e, asset, from, to, amount)
}

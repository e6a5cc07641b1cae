//! Allowance optimizer and token transfer primitives.
//!
//! Allowances granted by the current contract are changed with as few
//! `approve` writes as possible, while a non-zero allowance is never
//! overwritten with another non-zero value in a single write: it is reset to
//! zero first so a spender cannot redeem both the old and the new amount.
//!
//! Every token call goes through the `try_*` client so a trapped or failing
//! token surfaces as `TransferFailed` / `ApprovalFailed` instead of aborting
//! with a host error.

use soroban_sdk::{log, token, Address, Env, Symbol, Vec};

use crate::types::require_non_zero;
use crate::{ApprovalReport, Error};

/// Writes the naive strategy spends on every update (reset, then set).
pub const NAIVE_WRITES: u32 = 2;

pub fn live_balance(e: &Env, asset: &Address, account: &Address) -> Result<i128, Error> {
    match token::Client::new(e, asset).try_balance(account) {
        Ok(Ok(balance)) => Ok(balance),
        _ => Err(Error::CollaboratorFailed),
    }
}

pub fn live_allowance(
    e: &Env,
    asset: &Address,
    owner: &Address,
    spender: &Address,
) -> Result<i128, Error> {
    match token::Client::new(e, asset).try_allowance(owner, spender) {
        Ok(Ok(allowance)) => Ok(allowance),
        _ => Err(Error::CollaboratorFailed),
    }
}

fn write_allowance(
    e: &Env,
    client: &token::Client,
    spender: &Address,
    amount: i128,
    expiration_ledger: u32,
) -> Result<(), Error> {
    let owner = e.current_contract_address();
    match client.try_approve(&owner, spender, &amount, &expiration_ledger) {
        Ok(Ok(())) => Ok(()),
        _ => Err(Error::ApprovalFailed),
    }
}

/// Set the allowance of `spender` over this contract's `asset` balance to `amount`.
pub fn approve_optimized(
    e: &Env,
    asset: &Address,
    spender: &Address,
    amount: i128,
    expiration_ledger: u32,
) -> Result<ApprovalReport, Error> {
    if amount < 0 {
        return Err(Error::InvalidAmount);
    }
    let client = token::Client::new(e, asset);
    let previous = live_allowance(e, asset, &e.current_contract_address(), spender)?;

    let writes = if previous == amount {
        0
    } else if previous != 0 && amount != 0 {
        write_allowance(e, &client, spender, 0, expiration_ledger)?;
        write_allowance(e, &client, spender, amount, expiration_ledger)?;
        2
    } else {
        write_allowance(e, &client, spender, amount, expiration_ledger)?;
        1
    };

    let report = ApprovalReport {
        previous,
        current: amount,
        writes,
        writes_saved: NAIVE_WRITES - writes,
    };
    log!(
        e,
        "allowance {} -> {}: {} writes, {} saved",
        previous,
        amount,
        writes,
        report.writes_saved
    );
    e.events().publish(
        (
            Symbol::new(e, "allowance_optimized"),
            asset.clone(),
            spender.clone(),
        ),
        (previous, amount, writes, report.writes_saved),
    );
    Ok(report)
}

/// Apply `approve_optimized` to each `(asset, spender, amount)` entry
/// independently. A failing entry yields `false` and does not stop the rest.
pub fn batch_approve(
    e: &Env,
    assets: &Vec<Address>,
    spenders: &Vec<Address>,
    amounts: &Vec<i128>,
    expiration_ledger: u32,
) -> Result<Vec<bool>, Error> {
    if assets.len() != spenders.len() || assets.len() != amounts.len() {
        return Err(Error::LengthMismatch);
    }
    let mut results = Vec::new(e);
    for i in 0..assets.len() {
        let outcome = match (assets.get(i), spenders.get(i), amounts.get(i)) {
            (Some(asset), Some(spender), Some(amount)) => require_non_zero(e, &spender)
                .and_then(|_| approve_optimized(e, &asset, &spender, amount, expiration_ledger)),
            _ => Err(Error::LengthMismatch),
        };
        if let Err(err) = outcome {
            log!(e, "batch approval entry {} failed: {}", i, err as u32);
        }
        results.push_back(outcome.is_ok());
    }
    Ok(results)
}

/// Send `amount` of this contract's own `asset` balance to `to`.
pub fn transfer_out(e: &Env, asset: &Address, to: &Address, amount: i128) -> Result<(), Error> {
    let from = e.current_contract_address();
    match token::Client::new(e, asset).try_transfer(&from, to, &amount) {
        Ok(Ok(())) => Ok(()),
        _ => Err(Error::TransferFailed),
    }
}

/// Move `amount` from `from` to `to` using the allowance `from` granted this contract.
pub fn pull_from(
    e: &Env,
    asset: &Address,
    from: &Address,
    to: &Address,
    amount: i128,
) -> Result<(), Error> {
    let spender = e.current_contract_address();
    match token::Client::new(e, asset).try_transfer_from(&spender, from, to, &amount) {
        Ok(Ok(())) => Ok(()),
        _ => Err(Error::TransferFailed),
    }
}

/// Move `amount` from `from` to `to` on `from`'s own authorization, as part of
/// the current invocation (the attached-value path).
pub fn push_from(
    e: &Env,
    asset: &Address,
    from: &Address,
    to: &Address,
    amount: i128,
) -> Result<(), Error> {
    match token::Client::new(e, asset).try_transfer(from, to, &amount) {
        Ok(Ok(())) => Ok(()),
        _ => Err(Error::TransferFailed),
    }
}

//! Allowances the treasury grants over its own holdings.

#![cfg(test)]

use crate::test_helpers::setup;
use crate::test_token::hostile_token::{HostileToken, HostileTokenClient, MODE_REJECT_APPROVE};
use custody_shared::{zero_address, ApprovalReport, Capability, Error};
use soroban_sdk::testutils::Address as _;
use soroban_sdk::{vec, Address, Env};

#[test]
fn test_allow_token_transfer_write_counts() {
    let e = Env::default();
    let s = setup(&e);
    let spender = Address::generate(&e);

    let report = s
        .client
        .allow_token_transfer(&s.admin, &s.asset, &spender, &100);
    assert_eq!(
        report,
        ApprovalReport {
            previous: 0,
            current: 100,
            writes: 1,
            writes_saved: 1
        }
    );

    let report = s
        .client
        .allow_token_transfer(&s.admin, &s.asset, &spender, &100);
    assert_eq!((report.writes, report.writes_saved), (0, 2));

    let report = s
        .client
        .allow_token_transfer(&s.admin, &s.asset, &spender, &50);
    assert_eq!((report.previous, report.writes, report.writes_saved), (100, 2, 0));
    assert_eq!(s.client.get_allowance(&s.asset, &spender), 50);

    let report = s
        .client
        .allow_token_transfer(&s.admin, &s.asset, &spender, &0);
    assert_eq!((report.writes, report.writes_saved), (1, 1));
    assert_eq!(s.client.get_allowance(&s.asset, &spender), 0);
}

#[test]
fn test_allow_token_transfer_requires_admin() {
    let e = Env::default();
    let s = setup(&e);
    let spender = Address::generate(&e);
    assert_eq!(
        s.client
            .try_allow_token_transfer(&s.controller, &s.asset, &spender, &100),
        Err(Ok(Error::Unauthorized))
    );
    assert_eq!(s.client.get_allowance(&s.asset, &spender), 0);
}

#[test]
fn test_allow_token_transfer_rejects_null_spender_and_negative() {
    let e = Env::default();
    let s = setup(&e);
    assert_eq!(
        s.client
            .try_allow_token_transfer(&s.admin, &s.asset, &zero_address(&e), &100),
        Err(Ok(Error::ZeroAddress))
    );
    let spender = Address::generate(&e);
    assert_eq!(
        s.client
            .try_allow_token_transfer(&s.admin, &s.asset, &spender, &-1),
        Err(Ok(Error::InvalidAmount))
    );
}

#[test]
fn test_increase_and_decrease_allowance() {
    let e = Env::default();
    let s = setup(&e);
    let spender = Address::generate(&e);

    s.client
        .increase_allowance(&s.admin, &s.asset, &spender, &40);
    s.client
        .increase_allowance(&s.admin, &s.asset, &spender, &60);
    assert_eq!(s.client.get_allowance(&s.asset, &spender), 100);

    let report = s
        .client
        .decrease_allowance(&s.admin, &s.asset, &spender, &30);
    assert_eq!(report.current, 70);
    assert_eq!(s.client.get_allowance(&s.asset, &spender), 70);

    assert_eq!(
        s.client
            .try_decrease_allowance(&s.admin, &s.asset, &spender, &71),
        Err(Ok(Error::InsufficientAllowance))
    );
    assert_eq!(
        s.client
            .try_increase_allowance(&s.admin, &s.asset, &spender, &0),
        Err(Ok(Error::InvalidAmount))
    );
    assert_eq!(s.client.get_allowance(&s.asset, &spender), 70);
}

#[test]
fn test_fund_manager_adjusts_allowances() {
    let e = Env::default();
    let s = setup(&e);
    let manager = Address::generate(&e);
    let spender = Address::generate(&e);
    s.client
        .grant_capability(&s.admin, &manager, &Capability::FundManager);

    s.client
        .allow_token_transfer(&s.admin, &s.asset, &spender, &500);
    s.client
        .increase_allowance(&manager, &s.asset, &spender, &100);
    s.client
        .decrease_allowance(&manager, &s.asset, &spender, &50);
    assert_eq!(s.client.get_allowance(&s.asset, &spender), 550);
    let report = s.client.clear_approval(&manager, &s.asset, &spender);
    assert_eq!((report.previous, report.current), (550, 0));
    assert_eq!(s.client.get_allowance(&s.asset, &spender), 0);

    // fund managers cannot set allowances outright
    assert_eq!(
        s.client
            .try_allow_token_transfer(&manager, &s.asset, &spender, &10),
        Err(Ok(Error::Unauthorized))
    );
}

#[test]
fn test_fund_manager_cannot_open_allowance() {
    let e = Env::default();
    let s = setup(&e);
    let manager = Address::generate(&e);
    let fresh_spender = Address::generate(&e);
    s.client
        .grant_capability(&s.admin, &manager, &Capability::FundManager);
    assert_eq!(
        s.client
            .try_increase_allowance(&manager, &s.asset, &fresh_spender, &1_000_000),
        Err(Ok(Error::Unauthorized))
    );
    assert_eq!(s.client.get_allowance(&s.asset, &fresh_spender), 0);

    // once cleared, reopening is back in the admin's hands
    s.client
        .allow_token_transfer(&s.admin, &s.asset, &fresh_spender, &10);
    s.client.clear_approval(&manager, &s.asset, &fresh_spender);
    assert_eq!(
        s.client
            .try_increase_allowance(&manager, &s.asset, &fresh_spender, &10),
        Err(Ok(Error::Unauthorized))
    );

    // the admin may open one through increase_allowance
    s.client
        .increase_allowance(&s.admin, &s.asset, &fresh_spender, &25);
    assert_eq!(s.client.get_allowance(&s.asset, &fresh_spender), 25);
}

#[test]
fn test_clear_approval_without_allowance_writes_nothing() {
    let e = Env::default();
    let s = setup(&e);
    let spender = Address::generate(&e);
    let report = s.client.clear_approval(&s.admin, &s.asset, &spender);
    assert_eq!((report.writes, report.writes_saved), (0, 2));
}

#[test]
fn test_batch_allow_isolates_failures() {
    let e = Env::default();
    let s = setup(&e);
    let broken = e.register(HostileToken, ());
    HostileTokenClient::new(&e, &broken).set_mode(&MODE_REJECT_APPROVE);
    let spender_a = Address::generate(&e);
    let spender_b = Address::generate(&e);

    let results = s.client.batch_allow_token_transfers(
        &s.admin,
        &vec![&e, s.asset.clone(), broken.clone(), s.native.clone()],
        &vec![&e, spender_a.clone(), spender_a.clone(), spender_b.clone()],
        &vec![&e, 100_i128, 100_i128, 50_i128],
    );
    assert_eq!(results, vec![&e, true, false, true]);
    assert_eq!(s.client.get_allowance(&s.asset, &spender_a), 100);
    assert_eq!(s.client.get_allowance(&s.native, &spender_b), 50);
}

#[test]
fn test_batch_allow_null_spender_entry_fails_alone() {
    let e = Env::default();
    let s = setup(&e);
    let spender = Address::generate(&e);
    let results = s.client.batch_allow_token_transfers(
        &s.admin,
        &vec![&e, s.asset.clone(), s.asset.clone()],
        &vec![&e, zero_address(&e), spender.clone()],
        &vec![&e, 10_i128, 20_i128],
    );
    assert_eq!(results, vec![&e, false, true]);
    assert_eq!(s.client.get_allowance(&s.asset, &spender), 20);
}

#[test]
fn test_batch_allow_length_mismatch() {
    let e = Env::default();
    let s = setup(&e);
    let spender = Address::generate(&e);
    assert_eq!(
        s.client.try_batch_allow_token_transfers(
            &s.admin,
            &vec![&e, s.asset.clone(), s.native.clone()],
            &vec![&e, spender.clone()],
            &vec![&e, 10_i128, 20_i128],
        ),
        Err(Ok(Error::LengthMismatch))
    );
}

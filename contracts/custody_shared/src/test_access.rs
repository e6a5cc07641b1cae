//! Capability relation and reentrancy guard, exercised inside a bare contract.

#![cfg(test)]

use crate::access::{
    assign, grant_capability, has_capability, renounce_capability, require_any_capability,
    revoke_capability,
};
use crate::guard::{self, GuardState};
use crate::{Capability, Error};
use soroban_sdk::testutils::Address as _;
use soroban_sdk::{Address, Env};

mod harness {
    use soroban_sdk::{contract, contractimpl, Env};

    #[contract]
    pub struct AccessHarness;

    #[contractimpl]
    impl AccessHarness {
        pub fn version(_e: Env) -> u32 {
            1
        }
    }
}

fn setup(e: &Env) -> (Address, Address) {
    e.mock_all_auths();
    let id = e.register(harness::AccessHarness, ());
    let admin = Address::generate(e);
    e.as_contract(&id, || assign(e, &admin, Capability::Admin));
    (id, admin)
}

#[test]
fn test_admin_grants_and_revokes() {
    let e = Env::default();
    let (id, admin) = setup(&e);
    let setter = Address::generate(&e);
    e.as_contract(&id, || {
        assert!(!has_capability(&e, &setter, Capability::ParameterSetter));
        grant_capability(&e, &admin, &setter, Capability::ParameterSetter).unwrap();
    });
    e.as_contract(&id, || {
        assert!(has_capability(&e, &setter, Capability::ParameterSetter));
        assert!(!has_capability(&e, &setter, Capability::Admin));
        revoke_capability(&e, &admin, &setter, Capability::ParameterSetter).unwrap();
    });
    e.as_contract(&id, || {
        assert!(!has_capability(&e, &setter, Capability::ParameterSetter));
    });
}

#[test]
fn test_grant_requires_admin() {
    let e = Env::default();
    let (id, _admin) = setup(&e);
    let stranger = Address::generate(&e);
    e.as_contract(&id, || {
        assert_eq!(
            grant_capability(&e, &stranger, &stranger, Capability::Admin),
            Err(Error::Unauthorized)
        );
        assert!(!has_capability(&e, &stranger, Capability::Admin));
    });
}

#[test]
fn test_revoke_requires_admin() {
    let e = Env::default();
    let (id, admin) = setup(&e);
    let stranger = Address::generate(&e);
    e.as_contract(&id, || {
        assert_eq!(
            revoke_capability(&e, &stranger, &admin, Capability::Admin),
            Err(Error::Unauthorized)
        );
        assert!(has_capability(&e, &admin, Capability::Admin));
    });
}

#[test]
fn test_renounce_drops_only_own_capability() {
    let e = Env::default();
    let (id, admin) = setup(&e);
    let manager = Address::generate(&e);
    e.as_contract(&id, || {
        grant_capability(&e, &admin, &manager, Capability::FundManager).unwrap();
    });
    e.as_contract(&id, || {
        grant_capability(&e, &admin, &manager, Capability::FeeCollector).unwrap();
    });
    e.as_contract(&id, || {
        renounce_capability(&e, &manager, Capability::FundManager).unwrap();
        assert!(!has_capability(&e, &manager, Capability::FundManager));
        assert!(has_capability(&e, &manager, Capability::FeeCollector));
    });
}

#[test]
fn test_require_any_capability() {
    let e = Env::default();
    let (id, admin) = setup(&e);
    let manager = Address::generate(&e);
    let stranger = Address::generate(&e);
    let tighteners = [Capability::Admin, Capability::FundManager];
    e.as_contract(&id, || {
        grant_capability(&e, &admin, &manager, Capability::FundManager).unwrap();
    });
    e.as_contract(&id, || {
        assert_eq!(require_any_capability(&e, &admin, &tighteners), Ok(()));
    });
    e.as_contract(&id, || {
        assert_eq!(require_any_capability(&e, &manager, &tighteners), Ok(()));
    });
    e.as_contract(&id, || {
        assert_eq!(
            require_any_capability(&e, &stranger, &tighteners),
            Err(Error::Unauthorized)
        );
    });
}

#[test]
fn test_guard_rejects_nested_entry() {
    let e = Env::default();
    let (id, _admin) = setup(&e);
    e.as_contract(&id, || {
        assert_eq!(guard::state(&e), GuardState::Idle);
        guard::enter(&e).unwrap();
        assert_eq!(guard::enter(&e), Err(Error::ReentrantCall));
        guard::exit(&e);
        assert!(!guard::is_entered(&e));
    });
}

#[test]
fn test_non_reentrant_releases_on_error() {
    let e = Env::default();
    let (id, _admin) = setup(&e);
    e.as_contract(&id, || {
        let result: Result<(), Error> = guard::non_reentrant(&e, || {
            assert!(guard::is_entered(&e));
            Err(Error::InsufficientBalance)
        });
        assert_eq!(result, Err(Error::InsufficientBalance));
        assert!(!guard::is_entered(&e));
    });
}

#[test]
fn test_non_reentrant_nested_body_fails() {
    let e = Env::default();
    let (id, _admin) = setup(&e);
    e.as_contract(&id, || {
        let outer = guard::non_reentrant(&e, || guard::non_reentrant(&e, || Ok(7_u32)));
        assert_eq!(outer, Err(Error::ReentrantCall));
        assert!(!guard::is_entered(&e));
    });
}

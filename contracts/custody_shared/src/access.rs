//! Capability relation (account × capability → granted).
//!
//! Every custody contract keeps its own assignments under
//! `SharedKey::Role` in instance storage and mutates them only through
//! `grant_capability`, `revoke_capability` and `renounce_capability`.

use soroban_sdk::{contracttype, Address, Env, Symbol};

use crate::{Capability, Error};

#[contracttype]
pub enum SharedKey {
    /// (capability, account) -> true
    Role(Capability, Address),
    /// Reentrancy guard state.
    Guard,
}

pub fn has_capability(e: &Env, account: &Address, capability: Capability) -> bool {
    e.storage()
        .instance()
        .get(&SharedKey::Role(capability, account.clone()))
        .unwrap_or(false)
}

/// Bootstrap grant used by `initialize`. Emits the same record as `grant_capability`.
pub fn assign(e: &Env, account: &Address, capability: Capability) {
    e.storage()
        .instance()
        .set(&SharedKey::Role(capability, account.clone()), &true);
    e.events().publish(
        (Symbol::new(e, "capability_granted"), capability),
        account.clone(),
    );
}

/// Authenticates `account` and checks it holds `capability`.
pub fn require_capability(e: &Env, account: &Address, capability: Capability) -> Result<(), Error> {
    account.require_auth();
    if !has_capability(e, account, capability) {
        return Err(Error::Unauthorized);
    }
    Ok(())
}

/// Authenticates `account` and checks it holds at least one of `capabilities`.
pub fn require_any_capability(
    e: &Env,
    account: &Address,
    capabilities: &[Capability],
) -> Result<(), Error> {
    account.require_auth();
    if capabilities
        .iter()
        .any(|capability| has_capability(e, account, *capability))
    {
        Ok(())
    } else {
        Err(Error::Unauthorized)
    }
}

/// Grant `capability` to `account`. `granter` must hold `Admin`. Granting a
/// capability the account already holds is a no-op.
pub fn grant_capability(
    e: &Env,
    granter: &Address,
    account: &Address,
    capability: Capability,
) -> Result<(), Error> {
    require_capability(e, granter, Capability::Admin)?;
    if has_capability(e, account, capability) {
        return Ok(());
    }
    assign(e, account, capability);
    Ok(())
}

/// Revoke `capability` from `account`. `revoker` must hold `Admin`.
pub fn revoke_capability(
    e: &Env,
    revoker: &Address,
    account: &Address,
    capability: Capability,
) -> Result<(), Error> {
    require_capability(e, revoker, Capability::Admin)?;
    if !has_capability(e, account, capability) {
        return Ok(());
    }
    e.storage()
        .instance()
        .remove(&SharedKey::Role(capability, account.clone()));
    e.events().publish(
        (Symbol::new(e, "capability_revoked"), capability),
        (account.clone(), revoker.clone()),
    );
    Ok(())
}

/// Self-service drop of a capability held by `account`.
pub fn renounce_capability(e: &Env, account: &Address, capability: Capability) -> Result<(), Error> {
    account.require_auth();
    if !has_capability(e, account, capability) {
        return Ok(());
    }
    e.storage()
        .instance()
        .remove(&SharedKey::Role(capability, account.clone()));
    e.events().publish(
        (Symbol::new(e, "capability_renounced"), capability),
        account.clone(),
    );
    Ok(())
}

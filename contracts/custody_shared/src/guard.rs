//! Single-writer reentrancy lock.
//!
//! The lock lives in the calling contract's instance storage. `non_reentrant`
//! holds it across the whole checks-effects-interactions body and releases it
//! on every exit path, including errors.

use soroban_sdk::{contracttype, log, Env};

use crate::access::SharedKey;
use crate::Error;

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GuardState {
    Idle = 0,
    Entered = 1,
}

pub fn state(e: &Env) -> GuardState {
    e.storage()
        .instance()
        .get(&SharedKey::Guard)
        .unwrap_or(GuardState::Idle)
}

pub fn is_entered(e: &Env) -> bool {
    state(e) == GuardState::Entered
}

/// Acquire the lock; fails with `ReentrantCall` when it is already held.
pub fn enter(e: &Env) -> Result<(), Error> {
    if is_entered(e) {
        log!(e, "reentrant call rejected");
        return Err(Error::ReentrantCall);
    }
    e.storage()
        .instance()
        .set(&SharedKey::Guard, &GuardState::Entered);
    Ok(())
}

pub fn exit(e: &Env) {
    e.storage()
        .instance()
        .set(&SharedKey::Guard, &GuardState::Idle);
}

/// Run `body` while holding the lock.
pub fn non_reentrant<T>(e: &Env, body: impl FnOnce() -> Result<T, Error>) -> Result<T, Error> {
    enter(e)?;
    let result = body();
    exit(e);
    result
}

//! # Custody Shared
//!
//! Building blocks used by every contract of the custody engine: the error
//! taxonomy, the capability relation, the reentrancy guard, basis-point
//! arithmetic, the allowance optimizer and the cross-contract interfaces.

#![no_std]

pub mod access;
pub mod allowance;
pub mod bps;
pub mod error;
pub mod guard;
pub mod interfaces;
pub mod types;

pub use error::Error;
pub use types::{zero_address, ApprovalReport, Capability, DistributionSplit, OperationType};

#[cfg(test)]
mod test_access;

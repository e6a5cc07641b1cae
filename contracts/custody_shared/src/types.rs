use soroban_sdk::{contracttype, Address, Env, String};

use crate::Error;

/// Strkey of the all-zero ed25519 account, used as the null account.
pub const ZERO_ACCOUNT: &str = "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF";

/// Value-changing operations that carry a fee.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OperationType {
    Invest = 0,
    Divest = 1,
    /// Ragequit: leaving a position before its term.
    EmergencyExit = 2,
}

/// Named permissions an account may hold.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Capability {
    /// Grants and revokes every capability; runs admin setters.
    Admin = 0,
    /// Updates fee rates and the distribution split.
    ParameterSetter = 1,
    /// Deposits tagged as protocol fees in the treasury.
    FeeCollector = 2,
    /// Upstream business-logic contracts allowed to call `collect_fee`.
    AuthorizedCaller = 3,
    /// Protocol governance; the only capability that may withdraw from the treasury.
    Controller = 4,
    /// May increase, decrease and clear treasury allowances.
    FundManager = 5,
}

/// Treasury / reward-pool split in basis points. Always sums to 10000.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DistributionSplit {
    pub treasury_share: u32,
    pub reward_share: u32,
}

/// Outcome of one optimized allowance update.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ApprovalReport {
    /// Allowance read before the update.
    pub previous: i128,
    /// Allowance after the update.
    pub current: i128,
    /// Allowance writes actually performed (0, 1 or 2).
    pub writes: u32,
    /// Writes avoided compared to always resetting to zero first.
    pub writes_saved: u32,
}

/// The null account.
pub fn zero_address(e: &Env) -> Address {
    Address::from_string(&String::from_str(e, ZERO_ACCOUNT))
}

/// Rejects the null account with `ZeroAddress`.
pub fn require_non_zero(e: &Env, account: &Address) -> Result<(), Error> {
    if *account == zero_address(e) {
        return Err(Error::ZeroAddress);
    }
    Ok(())
}

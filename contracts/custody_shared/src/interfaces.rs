//! Cross-contract interfaces. Each contract implementing one of these exposes
//! functions with exactly these signatures.

use soroban_sdk::{contractclient, Address, Env, String};

use crate::{Error, OperationType};

/// Fee quote source consumed by the fee orchestrator.
#[contractclient(name = "FeeRateClient")]
pub trait FeeRateInterface {
    fn calculate_fee(env: Env, operation: OperationType, amount: i128) -> Result<i128, Error>;
}

/// Receipt side of the treasury, consumed by the fee orchestrator.
#[contractclient(name = "TreasuryLedgerClient")]
pub trait TreasuryLedgerInterface {
    fn deposit(
        env: Env,
        from: Address,
        asset: Address,
        amount: i128,
        memo: String,
    ) -> Result<(), Error>;

    fn get_native_asset(env: Env) -> Result<Address, Error>;

    fn get_balance(env: Env, asset: Address) -> i128;
}

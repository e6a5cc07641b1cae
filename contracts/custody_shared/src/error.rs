use soroban_sdk::contracterror;

/// Error kinds shared by every custody contract. Discriminants are part of the
/// public interface and must stay stable.
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    /// A required account parameter is the null account.
    ZeroAddress = 1,
    /// Zero or negative amount where a positive value is required.
    InvalidAmount = 2,
    /// Percentage above 10000 basis points.
    OutOfRange = 3,
    /// Treasury and reward shares do not sum to 10000.
    InvalidSplit = 4,
    InsufficientBalance = 5,
    InsufficientAllowance = 6,
    TransferFailed = 7,
    ApprovalFailed = 8,
    Unauthorized = 9,
    ReentrantCall = 10,
    LengthMismatch = 11,
    /// Received amount differs from the declared amount.
    AmountMismatch = 12,
    AlreadyInitialized = 13,
    NotInitialized = 14,
    ArithmeticOverflow = 15,
    /// A configured collaborator contract did not answer as expected.
    CollaboratorFailed = 16,
}

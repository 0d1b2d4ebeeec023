//! Error types for the lending engine
//!
//! Every fallible operation returns one of these codes so callers and
//! logs agree on what went wrong

use num_derive::FromPrimitive;
use thiserror::Error;

/// Custom error type for the lending engine
#[derive(Clone, Copy, Debug, Eq, Error, FromPrimitive, PartialEq)]
pub enum LendingError {
    // Authorization errors (1000-1099)
    #[error("Unauthorized")]
    Unauthorized = 1000,

    // Lookup errors (1100-1199)
    #[error("Collateral not found")]
    CollateralNotFound = 1100,

    #[error("Oracle not found")]
    OracleNotFound = 1101,

    #[error("Position not found")]
    PositionNotFound = 1102,

    #[error("Parameter not found")]
    ParamNotFound = 1103,

    #[error("Unknown account")]
    UnknownAccount = 1104,

    #[error("Unknown token")]
    UnknownToken = 1105,

    // Duplicate-registration errors (1200-1299)
    #[error("Collateral already registered")]
    CollateralExists = 1200,

    #[error("Oracle already registered")]
    OracleExists = 1201,

    // State errors (1300-1399)
    #[error("Collateral is active")]
    CollateralActive = 1300,

    #[error("Collateral has open positions")]
    CollateralInUse = 1301,

    #[error("Oracle limit reached")]
    OracleLimitReached = 1302,

    #[error("Accrual not due yet")]
    AccrualNotDue = 1303,

    #[error("Cannot transfer to self")]
    SelfTransfer = 1304,

    // Validation errors (1400-1499)
    #[error("Price must be positive")]
    InvalidPrice = 1400,

    #[error("Interest rate out of range")]
    InterestOutOfRange = 1401,

    #[error("Transfer below minimum")]
    BelowMinimumTransfer = 1402,

    #[error("Malformed parameter value")]
    InvalidParam = 1403,

    #[error("Collateral not accepted")]
    UnsupportedCollateral = 1404,

    #[error("Invalid symbol")]
    InvalidSymbol = 1405,

    #[error("Unrecognized instruction payload")]
    InvalidInstruction = 1406,

    // Pricing errors (1500-1599)
    #[error("No quotes for collateral")]
    NoQuotes = 1500,

    // Balance errors (1600-1699)
    #[error("Insufficient funds")]
    Underfunded = 1600,

    // Math errors (1700-1799)
    #[error("Math overflow")]
    MathOverflow = 1700,

    #[error("Division by zero")]
    DivisionByZero = 1701,
}

impl LendingError {
    /// Stable numeric code carried in logs and notifications
    pub fn code(self) -> u32 {
        self as u32
    }
}

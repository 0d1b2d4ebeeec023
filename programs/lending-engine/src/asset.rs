//! Account, symbol and asset primitives
//!
//! Token quantities are integer subunit counts paired with a symbol that
//! carries the display precision. All arithmetic is checked.

use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};

use crate::constants::{MAX_SYMBOL_CODE_LEN, MAX_SYMBOL_PRECISION};
use crate::error::LendingError;

/// Name of an account on the token ledger
#[derive(
    BorshDeserialize, BorshSerialize, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd,
)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(name: impl Into<String>) -> Self {
        AccountId(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Uppercase ticker, 1 to 7 characters
#[derive(
    BorshDeserialize, BorshSerialize, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd,
)]
pub struct SymbolCode(String);

impl SymbolCode {
    pub fn new(code: &str) -> Result<Self, LendingError> {
        if code.is_empty() || code.len() > MAX_SYMBOL_CODE_LEN {
            return Err(LendingError::InvalidSymbol);
        }
        if !code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(LendingError::InvalidSymbol);
        }
        Ok(SymbolCode(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SymbolCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ticker plus subunit precision, e.g. `4,ZIG` is 1/10000 granularity
#[derive(
    BorshDeserialize, BorshSerialize, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd,
)]
pub struct Symbol {
    pub code: SymbolCode,
    pub precision: u8,
}

impl Symbol {
    pub fn new(code: &str, precision: u8) -> Result<Self, LendingError> {
        if precision > MAX_SYMBOL_PRECISION {
            return Err(LendingError::InvalidSymbol);
        }
        Ok(Symbol {
            code: SymbolCode::new(code)?,
            precision,
        })
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision, self.code)
    }
}

/// Signed quantity of one token, counted in subunits
#[derive(
    BorshDeserialize, BorshSerialize, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd,
)]
pub struct Asset {
    /// Subunit count, may be negative in intermediate math
    pub amount: i64,
    pub symbol: Symbol,
}

impl Asset {
    pub fn new(amount: i64, symbol: Symbol) -> Self {
        Asset { amount, symbol }
    }

    pub fn checked_add(&self, amount: i64) -> Result<Asset, LendingError> {
        let amount = self
            .amount
            .checked_add(amount)
            .ok_or(LendingError::MathOverflow)?;
        Ok(Asset::new(amount, self.symbol.clone()))
    }

    pub fn checked_sub(&self, amount: i64) -> Result<Asset, LendingError> {
        let amount = self
            .amount
            .checked_sub(amount)
            .ok_or(LendingError::MathOverflow)?;
        Ok(Asset::new(amount, self.symbol.clone()))
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = self.symbol.precision as u32;
        if precision == 0 {
            return write!(f, "{} {}", self.amount, self.symbol.code);
        }
        let scale = 10i64.pow(precision);
        let sign = if self.amount < 0 { "-" } else { "" };
        let magnitude = self.amount.unsigned_abs();
        let whole = magnitude / scale as u64;
        let frac = magnitude % scale as u64;
        write!(
            f,
            "{}{}.{:0width$} {}",
            sign,
            whole,
            frac,
            self.symbol.code,
            width = precision as usize
        )
    }
}

//! Fixed-point money math
//!
//! Prices, rates and ratios are decimal fixed-point: an unsigned count of
//! 10^-18 steps held in a u128. Configured strings like "0.01" are
//! represented exactly, so products and quotients floor the way their
//! decimal notation reads. Conversions between token quantities floor
//! exactly once, at the final division, so results never credit a subunit
//! that was not fully earned.

use std::fmt;
use std::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};

use crate::error::LendingError;

/// Fractional decimal digits carried by every [`Rate`].
const DECIMALS: u32 = 18;

/// Steps per whole unit.
const SCALE: u128 = 10u128.pow(DECIMALS);

/// Unsigned decimal fixed-point number with eighteen fractional digits.
#[derive(Clone, Copy, Default, Eq, Ord, PartialEq, PartialOrd)]
pub struct Rate(u128);

impl Rate {
    pub const ZERO: Rate = Rate(0);
    pub const ONE: Rate = Rate(SCALE);

    pub fn from_int(n: u64) -> Self {
        Rate(n as u128 * SCALE)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Rate) -> Result<Rate, LendingError> {
        self.0
            .checked_add(rhs.0)
            .map(Rate)
            .ok_or(LendingError::MathOverflow)
    }

    pub fn checked_sub(self, rhs: Rate) -> Result<Rate, LendingError> {
        self.0
            .checked_sub(rhs.0)
            .map(Rate)
            .ok_or(LendingError::MathOverflow)
    }

    pub fn checked_div(self, rhs: Rate) -> Result<Rate, LendingError> {
        if rhs.is_zero() {
            return Err(LendingError::DivisionByZero);
        }
        // scale only the remainder; scaling the whole dividend would
        // overflow u128 for large price sums
        let whole = self.0 / rhs.0;
        let rem = self.0 % rhs.0;
        let frac = rem.checked_mul(SCALE).ok_or(LendingError::MathOverflow)? / rhs.0;
        whole
            .checked_mul(SCALE)
            .and_then(|scaled| scaled.checked_add(frac))
            .map(Rate)
            .ok_or(LendingError::MathOverflow)
    }
}

impl BorshSerialize for Rate {
    fn serialize<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}

impl BorshDeserialize for Rate {
    fn deserialize_reader<R: std::io::Read>(reader: &mut R) -> std::io::Result<Self> {
        Ok(Rate(u128::deserialize_reader(reader)?))
    }
}

impl FromStr for Rate {
    type Err = LendingError;

    /// Accepts `123` or `123.456` with at most eighteen fractional digits;
    /// every accepted string is held exactly.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (whole, frac) = match s.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(LendingError::InvalidParam);
        }
        if frac.len() > DECIMALS as usize {
            return Err(LendingError::InvalidParam);
        }
        let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !digits(whole) || !digits(frac) {
            return Err(LendingError::InvalidParam);
        }
        let whole_part = if whole.is_empty() {
            0
        } else {
            whole.parse::<u128>().map_err(|_| LendingError::InvalidParam)?
        };
        // frac < 10^len, so padding to eighteen digits stays below SCALE
        let frac_part = if frac.is_empty() {
            0
        } else {
            frac.parse::<u128>().map_err(|_| LendingError::InvalidParam)?
                * 10u128.pow(DECIMALS - frac.len() as u32)
        };
        whole_part
            .checked_mul(SCALE)
            .and_then(|scaled| scaled.checked_add(frac_part))
            .map(Rate)
            .ok_or(LendingError::InvalidParam)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / SCALE;
        let frac = self.0 % SCALE;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{frac:018}");
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl fmt::Debug for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

fn pow10(precision: u8) -> Result<u128, LendingError> {
    10u128
        .checked_pow(precision as u32)
        .ok_or(LendingError::MathOverflow)
}

fn to_u128(amount: i64) -> Result<u128, LendingError> {
    u128::try_from(amount).map_err(|_| LendingError::MathOverflow)
}

fn to_i64(value: u128) -> Result<i64, LendingError> {
    i64::try_from(value).map_err(|_| LendingError::MathOverflow)
}

/// floor(amount * rate)
pub fn mul_floor(amount: i64, rate: Rate) -> Result<i64, LendingError> {
    let product = to_u128(amount)?
        .checked_mul(rate.0)
        .ok_or(LendingError::MathOverflow)?;
    to_i64(product / SCALE)
}

/// True when `amount * rate` exceeds `bound`, compared exactly before
/// any flooring. A product a hair above an integer bound still counts.
pub fn mul_exceeds(amount: i64, rate: Rate, bound: i64) -> Result<bool, LendingError> {
    let product = to_u128(amount)?
        .checked_mul(rate.0)
        .ok_or(LendingError::MathOverflow)?;
    let scaled_bound = to_u128(bound)?
        .checked_mul(SCALE)
        .ok_or(LendingError::MathOverflow)?;
    Ok(product > scaled_bound)
}

/// floor(amount / rate)
pub fn div_floor(amount: i64, rate: Rate) -> Result<i64, LendingError> {
    if rate.is_zero() {
        return Err(LendingError::DivisionByZero);
    }
    let numer = to_u128(amount)?
        .checked_mul(SCALE)
        .ok_or(LendingError::MathOverflow)?;
    to_i64(numer / rate.0)
}

/// numer / denom as a fixed-point ratio, floored at the eighteenth digit
pub fn ratio(numer: i64, denom: i64) -> Result<Rate, LendingError> {
    if denom == 0 {
        return Err(LendingError::DivisionByZero);
    }
    let scaled = to_u128(numer)?
        .checked_mul(SCALE)
        .ok_or(LendingError::MathOverflow)?;
    Ok(Rate(scaled / to_u128(denom)?))
}

/// Convert a quantity between tokens at `price` units of the target token
/// per whole unit of the source token.
///
/// Computes floor(amount * price * 10^to / 10^from) with a single floor at
/// the end: numerator and denominator are assembled as exact integers, the
/// precision shift cancelled against whichever side it divides, and the
/// quotient taken once.
pub fn convert(
    amount: i64,
    price: Rate,
    from_precision: u8,
    to_precision: u8,
) -> Result<i64, LendingError> {
    let mut numer = to_u128(amount)?
        .checked_mul(price.0)
        .ok_or(LendingError::MathOverflow)?;
    let mut denom = SCALE;
    if to_precision >= from_precision {
        numer = numer
            .checked_mul(pow10(to_precision - from_precision)?)
            .ok_or(LendingError::MathOverflow)?;
    } else {
        denom = denom
            .checked_mul(pow10(from_precision - to_precision)?)
            .ok_or(LendingError::MathOverflow)?;
    }
    to_i64(numer / denom)
}

/// Convert a quantity back through `price`, dividing instead of multiplying.
///
/// Computes floor(amount * 10^to / (price * 10^from)) with a single floor.
pub fn convert_inverse(
    amount: i64,
    price: Rate,
    from_precision: u8,
    to_precision: u8,
) -> Result<i64, LendingError> {
    if price.is_zero() {
        return Err(LendingError::DivisionByZero);
    }
    let mut numer = to_u128(amount)?
        .checked_mul(SCALE)
        .ok_or(LendingError::MathOverflow)?;
    let mut denom = price.0;
    if to_precision >= from_precision {
        numer = numer
            .checked_mul(pow10(to_precision - from_precision)?)
            .ok_or(LendingError::MathOverflow)?;
    } else {
        denom = denom
            .checked_mul(pow10(from_precision - to_precision)?)
            .ok_or(LendingError::MathOverflow)?;
    }
    to_i64(numer / denom)
}

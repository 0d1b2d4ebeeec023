//! Oracle registry and rate aggregation
//!
//! Oracles are plain accounts trusted to quote prices for the collateral
//! tickers assigned to them. The reference price of a collateral is the
//! arithmetic mean of every quote on file. No weighting, no staleness
//! policy: a quote stands until its oracle re-quotes or is removed.

use tracing::{debug, info};

use crate::asset::{AccountId, SymbolCode};
use crate::constants::PARAM_MAX_ORACLES;
use crate::engine::EngineConfig;
use crate::error::LendingError;
use crate::math::Rate;
use crate::state::{Ledger, OracleEntry};
use crate::transfer::AssetTransferPort;

/// Register a new oracle for a set of collateral tickers
pub fn execute_add_oracle<P: AssetTransferPort>(
    ledger: &mut Ledger,
    port: &P,
    config: &EngineConfig,
    caller: &AccountId,
    account: &AccountId,
    symbols: Vec<SymbolCode>,
) -> Result<(), LendingError> {
    config.require_admin(caller)?;

    if !port.account_exists(account) {
        return Err(LendingError::UnknownAccount);
    }
    if ledger.oracles.contains_key(account) {
        return Err(LendingError::OracleExists);
    }
    for code in &symbols {
        if !ledger.collaterals.contains_key(code) {
            return Err(LendingError::CollateralNotFound);
        }
    }

    let max_oracles = ledger.params.get_u64(PARAM_MAX_ORACLES)?;
    if ledger.oracles.len() as u64 >= max_oracles {
        return Err(LendingError::OracleLimitReached);
    }

    ledger
        .oracles
        .insert(account.clone(), OracleEntry { symbols });
    info!("Registered oracle {}", account);
    Ok(())
}

/// Replace an oracle's ticker set, pruning quotes it may no longer serve
pub fn execute_set_oracle(
    ledger: &mut Ledger,
    config: &EngineConfig,
    caller: &AccountId,
    account: &AccountId,
    symbols: Vec<SymbolCode>,
) -> Result<(), LendingError> {
    config.require_admin(caller)?;

    if !ledger.oracles.contains_key(account) {
        return Err(LendingError::OracleNotFound);
    }
    for code in &symbols {
        if !ledger.collaterals.contains_key(code) {
            return Err(LendingError::CollateralNotFound);
        }
    }

    ledger.drop_oracle_quotes_except(account, &symbols);
    ledger
        .oracles
        .insert(account.clone(), OracleEntry { symbols });
    info!("Updated oracle {}", account);
    Ok(())
}

/// Remove an oracle together with every quote it reported
pub fn execute_remove_oracle(
    ledger: &mut Ledger,
    config: &EngineConfig,
    caller: &AccountId,
    account: &AccountId,
) -> Result<(), LendingError> {
    config.require_admin(caller)?;

    if !ledger.oracles.contains_key(account) {
        return Err(LendingError::OracleNotFound);
    }

    ledger.drop_oracle_quotes(account);
    ledger.oracles.remove(account);
    info!("Removed oracle {}", account);
    Ok(())
}

/// Upsert one oracle's price for one collateral ticker
pub fn execute_submit_rate(
    ledger: &mut Ledger,
    caller: &AccountId,
    oracle: &AccountId,
    code: &SymbolCode,
    price: Rate,
) -> Result<(), LendingError> {
    if caller != oracle {
        return Err(LendingError::Unauthorized);
    }

    let entry = ledger
        .oracles
        .get(oracle)
        .ok_or(LendingError::OracleNotFound)?;
    if !entry.supports(code) {
        return Err(LendingError::UnsupportedCollateral);
    }
    if price.is_zero() {
        return Err(LendingError::InvalidPrice);
    }

    ledger.set_quote(code, oracle, price);
    debug!("Quote {} = {} from {}", code, price, oracle);
    Ok(())
}

/// Arithmetic mean of every quote on file for a collateral ticker
pub fn current_price(ledger: &Ledger, code: &SymbolCode) -> Result<Rate, LendingError> {
    let partition = ledger.quotes.get(code).ok_or(LendingError::NoQuotes)?;
    if partition.is_empty() {
        return Err(LendingError::NoQuotes);
    }

    let mut sum = Rate::ZERO;
    for price in partition.values() {
        sum = sum.checked_add(*price)?;
    }
    sum.checked_div(Rate::from_int(partition.len() as u64))
}

//! Forced closure of undercollateralized positions
//!
//! A keeper account calls positions in once their collateral value no
//! longer clears the configured multiple of their debt. The engine keeps
//! the debt plus a penalty slice out of the collateral, sends the rest
//! back to the owner, and retires the position.

use tracing::{debug, info};

use crate::asset::{AccountId, SymbolCode};
use crate::constants::{
    PARAM_CRON_ACCOUNT, PARAM_LIQUIDATION_ACCOUNT, PARAM_LIQUIDATION_THRESHOLD, PARAM_PENALTY,
};
use crate::engine::EngineConfig;
use crate::error::LendingError;
use crate::math::{convert, convert_inverse, mul_exceeds, mul_floor, ratio, Rate};
use crate::oracle::current_price;
use crate::scheduler::{AccrualScheduler, TaskKey};
use crate::state::Ledger;
use crate::transfer::AssetTransferPort;

/// What a liquidation check did
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LiquidationOutcome {
    /// Position is healthy, or carries no debt to call in.
    NoAction,
    /// Position closed by force. `refund` went back to the owner and
    /// `seized` to the liquidation account, both in collateral subunits.
    Liquidated { refund: i64, seized: i64 },
}

/// Check one position against the collateralization threshold and close
/// it by force when it fails.
///
/// The collateral is valued at the current mean price. When value
/// divided by debt stays above the threshold nothing happens. Otherwise
/// the position is sold: the owner is refunded the value left after the
/// debt and the penalty cut, converted back to collateral, and the rest
/// of the collateral moves to the liquidation account.
pub fn execute_liquidate<P: AssetTransferPort>(
    ledger: &mut Ledger,
    scheduler: &mut AccrualScheduler,
    port: &mut P,
    config: &EngineConfig,
    caller: &AccountId,
    user: &AccountId,
    code: &SymbolCode,
) -> Result<LiquidationOutcome, LendingError> {
    let cron = ledger.params.get_account(PARAM_CRON_ACCOUNT)?;
    if caller != &cron && caller != &config.admin {
        return Err(LendingError::Unauthorized);
    }

    let collateral = ledger
        .collaterals
        .get(code)
        .ok_or(LendingError::CollateralNotFound)?
        .clone();
    let position = ledger
        .position(code, user)
        .ok_or(LendingError::PositionNotFound)?
        .clone();

    let threshold = ledger.params.get_rate(PARAM_LIQUIDATION_THRESHOLD)?;
    let penalty = ledger.params.get_rate(PARAM_PENALTY)?;
    let beneficiary = ledger.params.get_account(PARAM_LIQUIDATION_ACCOUNT)?;
    let price = current_price(ledger, code)?;

    let value = convert(
        position.collateral,
        price,
        collateral.symbol.precision,
        config.stable.precision,
    )?;
    let debt = position.debt()?;
    if debt == 0 {
        debug!("Liquidation check {}/{}: no debt", user, code);
        return Ok(LiquidationOutcome::NoAction);
    }
    if ratio(value, debt)? > threshold {
        debug!("Liquidation check {}/{}: healthy", user, code);
        return Ok(LiquidationOutcome::NoAction);
    }

    let keep = Rate::ONE
        .checked_sub(penalty)
        .map_err(|_| LendingError::InvalidParam)?;

    // the surplus test runs before flooring: a fractional surplus skips
    // the notification yet refunds nothing
    let mut refund = 0;
    if mul_exceeds(value, keep, debt)? {
        let surplus = mul_floor(value, keep)? - debt;
        refund = convert_inverse(
            surplus,
            price,
            config.stable.precision,
            collateral.symbol.precision,
        )?;
        if refund > 0 {
            port.transfer(config.collateral_transfer(
                &collateral,
                user,
                refund,
                "Position liquidated".to_string(),
            ))?;
        }
    } else {
        port.transfer(config.notification(user, "Position liquidated".to_string()))?;
    }

    let seized = position.collateral - refund;
    if seized > 0 {
        port.transfer(config.collateral_transfer(&collateral, &beneficiary, seized, String::new()))?;
    }

    ledger.remove_position(code, user);
    scheduler.cancel(&TaskKey::new(user.clone(), code.clone()));
    info!(
        "Position {}/{} liquidated, refund {}, seized {}",
        user, code, refund, seized
    );
    Ok(LiquidationOutcome::Liquidated { refund, seized })
}

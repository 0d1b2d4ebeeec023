//! Interest accrual
//!
//! Interest charges land on a fixed cadence: each accrual advances the
//! due time by the configured interval from the previous due time, not
//! from the invocation time, so late upkeep never drifts the schedule.
//! Every accrual re-arms one future task for the same position.

use tracing::{debug, info};

use crate::asset::{AccountId, Asset, SymbolCode};
use crate::constants::{INTEREST_RATE_MAX, PARAM_INTEREST_INTERVAL, PARAM_MANAGER};
use crate::engine::EngineConfig;
use crate::error::LendingError;
use crate::math::{mul_floor, Rate};
use crate::scheduler::{AccrualScheduler, TaskKey};
use crate::state::{Ledger, Position};
use crate::transfer::{loan_status_memo, AssetTransferPort};

/// One accrual cycle applied to a position value.
///
/// Charges floor(borrowed * rate), advances the due time by one interval
/// from the previous due time, and reports when the next task should be
/// armed relative to `now`. Returns (interest_added, rearm_at).
pub(crate) fn accrue_position(
    position: &mut Position,
    interval: i64,
    now: i64,
) -> Result<(i64, i64), LendingError> {
    let added = mul_floor(position.borrowed, position.rate)?;
    position.interest = position
        .interest
        .checked_add(added)
        .ok_or(LendingError::MathOverflow)?;
    position.next_accrual = position
        .next_accrual
        .checked_add(interval)
        .ok_or(LendingError::MathOverflow)?;
    let rearm_at = now.checked_add(interval).ok_or(LendingError::MathOverflow)?;
    Ok((added, rearm_at))
}

/// Charge interest on one position if its due time has passed.
///
/// Returns the interest added, zero when the position is not yet due.
/// With `notify` set, the user receives a status notification carrying
/// the updated total debt.
pub fn execute_accrue<P: AssetTransferPort>(
    ledger: &mut Ledger,
    scheduler: &mut AccrualScheduler,
    port: &mut P,
    config: &EngineConfig,
    user: &AccountId,
    code: &SymbolCode,
    now: i64,
    notify: bool,
) -> Result<i64, LendingError> {
    if !ledger.collaterals.contains_key(code) {
        return Err(LendingError::CollateralNotFound);
    }
    let mut position = ledger
        .position(code, user)
        .ok_or(LendingError::PositionNotFound)?
        .clone();

    if position.next_accrual > now {
        return Ok(0);
    }

    let interval = i64::try_from(ledger.params.get_u64(PARAM_INTEREST_INTERVAL)?)
        .map_err(|_| LendingError::InvalidParam)?;

    let (added, rearm_at) = accrue_position(&mut position, interval, now)?;

    if notify {
        let debt = Asset::new(position.debt()?, config.stable.clone());
        port.transfer(config.notification(user, loan_status_memo(&debt)))?;
    }

    // transfers done, commit
    ledger.set_position(code, user, position);
    scheduler.schedule(TaskKey::new(user.clone(), code.clone()), rearm_at);
    debug!("Accrued {} on {}/{}, next due re-armed at {}", added, user, code, rearm_at);
    Ok(added)
}

/// Override the daily interest rate of one position
pub fn execute_set_interest_rate(
    ledger: &mut Ledger,
    config: &EngineConfig,
    caller: &AccountId,
    user: &AccountId,
    code: &SymbolCode,
    rate: Rate,
) -> Result<(), LendingError> {
    let manager = ledger.params.get_account(PARAM_MANAGER)?;
    if caller != &manager && caller != &config.admin {
        return Err(LendingError::Unauthorized);
    }

    if !ledger.collaterals.contains_key(code) {
        return Err(LendingError::CollateralNotFound);
    }
    let position = ledger
        .position_mut(code, user)
        .ok_or(LendingError::PositionNotFound)?;

    if rate > Rate::from_int(INTEREST_RATE_MAX) {
        return Err(LendingError::InterestOutOfRange);
    }

    position.rate = rate;
    info!("Interest rate for {}/{} set to {}", user, code, rate);
    Ok(())
}

//! Deposit and repayment paths
//!
//! Both paths are driven by tokens that already arrived at the engine
//! account, so the failure rules differ from ordinary calls: an unknown
//! or inactive collateral on deposit degrades to a silent no-op instead
//! of an abort, because the inbound transfer cannot be handed back. All
//! other precondition failures abort with zero state mutation.

use tracing::{debug, info};

use crate::asset::{AccountId, Asset, SymbolCode};
use crate::constants::{MIN_TRANSFER_SUBUNITS, PARAM_INTEREST_DEF, PARAM_INTEREST_INTERVAL, PARAM_POSITION_DEF};
use crate::engine::EngineConfig;
use crate::error::LendingError;
use crate::interest::accrue_position;
use crate::math::{convert, div_floor};
use crate::oracle::current_price;
use crate::scheduler::{AccrualScheduler, TaskKey};
use crate::state::{Ledger, Position};
use crate::transfer::{loan_status_memo, AssetTransferPort};

/// What a deposit did
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DepositOutcome {
    /// Collateral unknown or inactive. Funds stay where they landed,
    /// nothing else changes.
    Ignored,
    /// Position topped up. `borrowed_delta` is what was newly disbursed,
    /// zero when the position was already at its ceiling.
    Accepted { borrowed_delta: i64 },
}

/// What a repayment did
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RepayOutcome {
    PartialRepay,
    Closed,
}

/// Accept a collateral deposit and top the loan up to the ceiling.
///
/// The ceiling is collateral value divided by the loan-to-value divisor;
/// whenever it exceeds current debt the difference is borrowed and
/// disbursed. Deposits never shrink existing debt. A first deposit also
/// runs one quiet accrual cycle to arm the position's schedule.
pub fn execute_deposit<P: AssetTransferPort>(
    ledger: &mut Ledger,
    scheduler: &mut AccrualScheduler,
    port: &mut P,
    config: &EngineConfig,
    user: &AccountId,
    code: &SymbolCode,
    amount: i64,
    now: i64,
) -> Result<DepositOutcome, LendingError> {
    if amount < MIN_TRANSFER_SUBUNITS {
        return Err(LendingError::BelowMinimumTransfer);
    }

    let collateral = match ledger.collaterals.get(code) {
        Some(collateral) if collateral.active => collateral.clone(),
        _ => {
            debug!("Deposit of {} {} from {} ignored, collateral not accepted", amount, code, user);
            return Ok(DepositOutcome::Ignored);
        }
    };

    let price = current_price(ledger, code)?;
    let position_def = ledger.params.get_rate(PARAM_POSITION_DEF)?;
    let interest_def = ledger.params.get_rate(PARAM_INTEREST_DEF)?;

    let existing = ledger.position(code, user).cloned();
    let is_new = existing.is_none();
    let mut position = existing.unwrap_or_else(|| Position::open(now, interest_def));

    position.collateral = position
        .collateral
        .checked_add(amount)
        .ok_or(LendingError::MathOverflow)?;

    let value = convert(
        position.collateral,
        price,
        collateral.symbol.precision,
        config.stable.precision,
    )?;
    let max_borrow = div_floor(value, position_def)?;
    let borrowed_delta = max_borrow
        .checked_sub(position.debt()?)
        .ok_or(LendingError::MathOverflow)?;

    if borrowed_delta > 0 {
        position.borrowed = position
            .borrowed
            .checked_add(borrowed_delta)
            .ok_or(LendingError::MathOverflow)?;
    }

    // a fresh position charges its first interest immediately, quietly
    let mut rearm_at = None;
    if is_new {
        let interval = i64::try_from(ledger.params.get_u64(PARAM_INTEREST_INTERVAL)?)
            .map_err(|_| LendingError::InvalidParam)?;
        let (_, at) = accrue_position(&mut position, interval, now)?;
        rearm_at = Some(at);
    }

    if borrowed_delta > 0 {
        let debt = Asset::new(position.debt()?, config.stable.clone());
        port.transfer(config.stable_transfer(user, borrowed_delta, loan_status_memo(&debt)))?;
    }

    // transfers done, commit
    ledger.set_position(code, user, position);
    if let Some(at) = rearm_at {
        scheduler.schedule(TaskKey::new(user.clone(), code.clone()), at);
    }

    info!(
        "Deposit {} {} from {}, borrowed delta {}",
        amount,
        code,
        user,
        borrowed_delta.max(0)
    );
    Ok(DepositOutcome::Accepted {
        borrowed_delta: borrowed_delta.max(0),
    })
}

/// Apply an inbound stable payment to a position.
///
/// Payments covering the whole debt close the position: change and the
/// full collateral go back to the user and the accrual task is dropped.
/// Anything less pays interest down first, then principal.
pub fn execute_repay<P: AssetTransferPort>(
    ledger: &mut Ledger,
    scheduler: &mut AccrualScheduler,
    port: &mut P,
    config: &EngineConfig,
    user: &AccountId,
    memo: &str,
    amount: i64,
) -> Result<RepayOutcome, LendingError> {
    let code = if memo.is_empty() {
        config.default_collateral.clone()
    } else {
        SymbolCode::new(memo)?
    };

    let collateral = ledger
        .collaterals
        .get(&code)
        .ok_or(LendingError::CollateralNotFound)?
        .clone();
    let mut position = ledger
        .position(&code, user)
        .ok_or(LendingError::PositionNotFound)?
        .clone();

    let debt = position.debt()?;
    if amount < debt && amount < MIN_TRANSFER_SUBUNITS {
        return Err(LendingError::BelowMinimumTransfer);
    }

    if amount >= debt {
        let change = amount - debt;
        if change > 0 {
            port.transfer(config.stable_transfer(user, change, String::new()))?;
        }
        port.transfer(config.collateral_transfer(
            &collateral,
            user,
            position.collateral,
            "Position closed".to_string(),
        ))?;

        ledger.remove_position(&code, user);
        scheduler.cancel(&TaskKey::new(user.clone(), code.clone()));
        info!("Position {}/{} closed, change {}, collateral returned {}", user, code, change, position.collateral);
        return Ok(RepayOutcome::Closed);
    }

    let previous_interest = position.interest;
    let interest_payment = position.interest.min(amount);
    position.interest -= interest_payment;
    if position.interest == 0 {
        // amount covered all interest, the rest pays principal down
        let remaining = amount - previous_interest;
        let principal_payment = position.borrowed.min(remaining);
        position.borrowed -= principal_payment;
    }

    let new_debt = Asset::new(position.debt()?, config.stable.clone());
    port.transfer(config.notification(user, loan_status_memo(&new_debt)))?;

    ledger.set_position(&code, user, position);
    info!("Partial repay {} on {}/{}, debt now {}", amount, user, code, new_debt.amount);
    Ok(RepayOutcome::PartialRepay)
}

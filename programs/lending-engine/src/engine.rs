//! Engine configuration and the operation facade
//!
//! `LendingEngine` owns the ledger, the accrual schedule, and the token
//! port, and exposes every operation the engine account serves. Registry
//! maintenance lives here; the position lifecycle is delegated to the
//! per-concern modules.

use tracing::info;

use crate::asset::{AccountId, Asset, Symbol, SymbolCode};
use crate::borrowing::{execute_deposit, execute_repay, DepositOutcome, RepayOutcome};
use crate::constants::{NOTIFICATION_SUBUNITS, PARAM_CRON_ACCOUNT};
use crate::error::LendingError;
use crate::interest::{execute_accrue, execute_set_interest_rate};
use crate::liquidation::{execute_liquidate, LiquidationOutcome};
use crate::math::Rate;
use crate::oracle::{
    current_price, execute_add_oracle, execute_remove_oracle, execute_set_oracle,
    execute_submit_rate,
};
use crate::scheduler::{AccrualScheduler, TaskKey};
use crate::state::{CollateralType, Ledger};
use crate::transfer::{AssetKind, AssetTransferPort, TransferCommand};

/// Static identity of one engine deployment.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Account allowed to run registry and parameter maintenance.
    pub admin: AccountId,
    /// Account the engine holds funds under and transfers from.
    pub engine_account: AccountId,
    /// The stable token positions borrow in.
    pub stable: Symbol,
    /// Token contract hosting the stable token.
    pub stable_contract: AccountId,
    /// Collateral assumed when a repayment memo names none.
    pub default_collateral: SymbolCode,
}

impl EngineConfig {
    pub fn require_admin(&self, caller: &AccountId) -> Result<(), LendingError> {
        if caller != &self.admin {
            return Err(LendingError::Unauthorized);
        }
        Ok(())
    }

    /// Tell a stable inflow apart from a collateral inflow.
    ///
    /// Only the exact stable symbol on the stable contract counts as
    /// stable; a same-named token on another contract is collateral.
    pub fn classify(&self, contract: &AccountId, symbol: &Symbol) -> AssetKind {
        if contract == &self.stable_contract && symbol == &self.stable {
            AssetKind::Stable
        } else {
            AssetKind::Collateral(symbol.code.clone())
        }
    }

    pub fn stable_transfer(&self, to: &AccountId, amount: i64, memo: String) -> TransferCommand {
        TransferCommand {
            contract: self.stable_contract.clone(),
            from: self.engine_account.clone(),
            to: to.clone(),
            quantity: Asset::new(amount, self.stable.clone()),
            memo,
        }
    }

    pub fn collateral_transfer(
        &self,
        collateral: &CollateralType,
        to: &AccountId,
        amount: i64,
        memo: String,
    ) -> TransferCommand {
        TransferCommand {
            contract: collateral.contract.clone(),
            from: self.engine_account.clone(),
            to: to.clone(),
            quantity: Asset::new(amount, collateral.symbol.clone()),
            memo,
        }
    }

    /// One stable subunit whose memo carries the message.
    pub fn notification(&self, to: &AccountId, memo: String) -> TransferCommand {
        self.stable_transfer(to, NOTIFICATION_SUBUNITS, memo)
    }
}

/// The whole engine behind one facade.
pub struct LendingEngine<P> {
    config: EngineConfig,
    ledger: Ledger,
    scheduler: AccrualScheduler,
    port: P,
}

impl<P: AssetTransferPort> LendingEngine<P> {
    pub fn new(config: EngineConfig, port: P) -> Self {
        LendingEngine {
            config,
            ledger: Ledger::new(),
            scheduler: AccrualScheduler::new(),
            port,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn scheduler(&self) -> &AccrualScheduler {
        &self.scheduler
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    /// Set, replace, or clear (empty value) a configuration parameter.
    pub fn set_param(
        &mut self,
        caller: &AccountId,
        key: &str,
        value: &str,
    ) -> Result<(), LendingError> {
        self.config.require_admin(caller)?;
        self.ledger.params.set(key, value);
        info!("Param {} set to {:?}", key, value);
        Ok(())
    }

    /// Register a collateral token. It starts inactive and accepts no
    /// deposits until switched on.
    pub fn add_collateral(
        &mut self,
        caller: &AccountId,
        symbol: Symbol,
        contract: AccountId,
    ) -> Result<(), LendingError> {
        self.config.require_admin(caller)?;
        if !self.port.account_exists(&contract) {
            return Err(LendingError::UnknownAccount);
        }
        if !self.port.token_exists(&contract, &symbol.code) {
            return Err(LendingError::UnknownToken);
        }
        if self.ledger.collaterals.contains_key(&symbol.code) {
            return Err(LendingError::CollateralExists);
        }

        info!("Collateral {} on {} registered", symbol, contract);
        self.ledger.collaterals.insert(
            symbol.code.clone(),
            CollateralType {
                symbol,
                contract,
                active: false,
            },
        );
        Ok(())
    }

    /// Flip a collateral's deposit switch. Setting the flag it already
    /// has is a no-op.
    pub fn set_collateral_active(
        &mut self,
        caller: &AccountId,
        code: &SymbolCode,
        active: bool,
    ) -> Result<(), LendingError> {
        self.config.require_admin(caller)?;
        let collateral = self
            .ledger
            .collaterals
            .get_mut(code)
            .ok_or(LendingError::CollateralNotFound)?;
        if collateral.active != active {
            collateral.active = active;
            info!("Collateral {} active set to {}", code, active);
        }
        Ok(())
    }

    /// Drop an inactive, unused collateral along with its quotes and
    /// its entries in oracle assignments.
    pub fn remove_collateral(
        &mut self,
        caller: &AccountId,
        code: &SymbolCode,
    ) -> Result<(), LendingError> {
        self.config.require_admin(caller)?;
        let collateral = self
            .ledger
            .collaterals
            .get(code)
            .ok_or(LendingError::CollateralNotFound)?;
        if collateral.active {
            return Err(LendingError::CollateralActive);
        }
        if self.ledger.has_positions(code) {
            return Err(LendingError::CollateralInUse);
        }

        self.ledger.drop_symbol_quotes(code);
        for entry in self.ledger.oracles.values_mut() {
            entry.symbols.retain(|s| s != code);
        }
        self.ledger.collaterals.remove(code);
        info!("Collateral {} removed", code);
        Ok(())
    }

    pub fn add_oracle(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
        symbols: Vec<SymbolCode>,
    ) -> Result<(), LendingError> {
        execute_add_oracle(&mut self.ledger, &self.port, &self.config, caller, account, symbols)
    }

    pub fn set_oracle(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
        symbols: Vec<SymbolCode>,
    ) -> Result<(), LendingError> {
        execute_set_oracle(&mut self.ledger, &self.config, caller, account, symbols)
    }

    pub fn remove_oracle(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
    ) -> Result<(), LendingError> {
        execute_remove_oracle(&mut self.ledger, &self.config, caller, account)
    }

    pub fn submit_rate(
        &mut self,
        caller: &AccountId,
        oracle: &AccountId,
        code: &SymbolCode,
        price: Rate,
    ) -> Result<(), LendingError> {
        execute_submit_rate(&mut self.ledger, caller, oracle, code, price)
    }

    /// Mean of the current oracle quotes for one collateral.
    pub fn mean_price(&self, code: &SymbolCode) -> Result<Rate, LendingError> {
        current_price(&self.ledger, code)
    }

    pub fn deposit(
        &mut self,
        user: &AccountId,
        code: &SymbolCode,
        amount: i64,
        now: i64,
    ) -> Result<DepositOutcome, LendingError> {
        execute_deposit(
            &mut self.ledger,
            &mut self.scheduler,
            &mut self.port,
            &self.config,
            user,
            code,
            amount,
            now,
        )
    }

    pub fn repay(
        &mut self,
        user: &AccountId,
        memo: &str,
        amount: i64,
    ) -> Result<RepayOutcome, LendingError> {
        execute_repay(
            &mut self.ledger,
            &mut self.scheduler,
            &mut self.port,
            &self.config,
            user,
            memo,
            amount,
        )
    }

    pub fn set_interest_rate(
        &mut self,
        caller: &AccountId,
        user: &AccountId,
        code: &SymbolCode,
        rate: Rate,
    ) -> Result<(), LendingError> {
        execute_set_interest_rate(&mut self.ledger, &self.config, caller, user, code, rate)
    }

    /// Accrue a position's interest on demand, from the upkeep account
    /// or the admin.
    ///
    /// Unlike the scheduled path, calling before the next accrual is due
    /// is reported as an error instead of silently skipped.
    pub fn accrue_interest(
        &mut self,
        caller: &AccountId,
        user: &AccountId,
        code: &SymbolCode,
        now: i64,
    ) -> Result<i64, LendingError> {
        let cron = self.ledger.params.get_account(PARAM_CRON_ACCOUNT)?;
        if caller != &cron && caller != &self.config.admin {
            return Err(LendingError::Unauthorized);
        }
        if !self.ledger.collaterals.contains_key(code) {
            return Err(LendingError::CollateralNotFound);
        }
        let position = self
            .ledger
            .position(code, user)
            .ok_or(LendingError::PositionNotFound)?;
        if position.next_accrual > now {
            return Err(LendingError::AccrualNotDue);
        }
        execute_accrue(
            &mut self.ledger,
            &mut self.scheduler,
            &mut self.port,
            &self.config,
            user,
            code,
            now,
            true,
        )
    }

    pub fn liquidate(
        &mut self,
        caller: &AccountId,
        user: &AccountId,
        code: &SymbolCode,
    ) -> Result<LiquidationOutcome, LendingError> {
        execute_liquidate(
            &mut self.ledger,
            &mut self.scheduler,
            &mut self.port,
            &self.config,
            caller,
            user,
            code,
        )
    }

    /// Fire every scheduled accrual that has come due.
    ///
    /// A task whose accrual fails, or that turns out not to be due on
    /// the position after all, is dropped from the schedule so it cannot
    /// refire. Each task's outcome is returned for the caller to log.
    pub fn run_due_accruals(&mut self, now: i64) -> Vec<(TaskKey, Result<i64, LendingError>)> {
        let due = self.scheduler.due_tasks(now);
        let mut results = Vec::with_capacity(due.len());
        for key in due {
            let result = execute_accrue(
                &mut self.ledger,
                &mut self.scheduler,
                &mut self.port,
                &self.config,
                &key.user,
                &key.collateral,
                now,
                true,
            );
            let stale = self
                .scheduler
                .pending(&key)
                .map_or(false, |due| due <= now);
            if result.is_err() || stale {
                self.scheduler.cancel(&key);
            }
            results.push((key, result));
        }
        results
    }
}

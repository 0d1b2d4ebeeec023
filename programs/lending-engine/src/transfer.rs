//! Asset transfer boundary
//!
//! The engine never moves balances itself. It consumes inbound
//! [`TransferNotice`] values describing tokens that already arrived, and
//! issues outbound [`TransferCommand`] intents through an
//! [`AssetTransferPort`]. A failed outbound transfer aborts the whole
//! enclosing action before any ledger mutation is committed.

use std::collections::{BTreeMap, BTreeSet};

use crate::asset::{AccountId, Asset, SymbolCode};
use crate::error::LendingError;

/// What kind of token an inbound transfer carried
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AssetKind {
    /// The stable unit debts are denominated in
    Stable,
    /// A collateral token, identified by ticker
    Collateral(SymbolCode),
}

/// An inbound transfer the engine was notified of, as reported by the
/// token contract that executed it
#[derive(Clone, Debug, PartialEq)]
pub struct TransferNotice {
    /// Token contract the transfer ran on
    pub contract: AccountId,
    pub from: AccountId,
    pub to: AccountId,
    pub quantity: Asset,
    pub memo: String,
}

/// An outbound transfer intent
#[derive(Clone, Debug, PartialEq)]
pub struct TransferCommand {
    /// Token ledger account that hosts the token
    pub contract: AccountId,
    pub from: AccountId,
    pub to: AccountId,
    pub quantity: Asset,
    pub memo: String,
}

/// External service that holds and moves token balances
pub trait AssetTransferPort {
    fn transfer(&mut self, command: TransferCommand) -> Result<(), LendingError>;

    /// Whether an account is known to the token ledger
    fn account_exists(&self, account: &AccountId) -> bool;

    /// Whether a token with this ticker exists under a hosting contract
    fn token_exists(&self, contract: &AccountId, code: &SymbolCode) -> bool;
}

/// Memo attached to stable disbursements and debt notifications
pub fn loan_status_memo(debt: &Asset) -> String {
    format!("Loan status: {} to return", debt)
}

/// In-memory token ledger
///
/// Backs the engine in tests and local runs. Tracks balances per
/// (contract, ticker, holder) and records every executed command.
#[derive(Debug, Default)]
pub struct MemoryTokenLedger {
    balances: BTreeMap<(AccountId, SymbolCode, AccountId), i64>,
    accounts: BTreeSet<AccountId>,
    tokens: BTreeSet<(AccountId, SymbolCode)>,
    /// Every transfer executed, in order
    pub transfers: Vec<TransferCommand>,
}

impl MemoryTokenLedger {
    pub fn new() -> Self {
        MemoryTokenLedger::default()
    }

    pub fn register_account(&mut self, account: AccountId) {
        self.accounts.insert(account);
    }

    pub fn create_token(&mut self, contract: AccountId, code: SymbolCode) {
        self.accounts.insert(contract.clone());
        self.tokens.insert((contract, code));
    }

    /// Mint straight into an account. Registers token and holder, leaves
    /// no transfer record.
    pub fn issue_to(&mut self, contract: &AccountId, holder: &AccountId, quantity: &Asset) {
        self.create_token(contract.clone(), quantity.symbol.code.clone());
        self.register_account(holder.clone());
        let key = (
            contract.clone(),
            quantity.symbol.code.clone(),
            holder.clone(),
        );
        *self.balances.entry(key).or_insert(0) += quantity.amount;
    }

    pub fn balance_of(&self, contract: &AccountId, code: &SymbolCode, holder: &AccountId) -> i64 {
        self.balances
            .get(&(contract.clone(), code.clone(), holder.clone()))
            .copied()
            .unwrap_or(0)
    }
}

impl AssetTransferPort for MemoryTokenLedger {
    fn transfer(&mut self, command: TransferCommand) -> Result<(), LendingError> {
        if command.from == command.to {
            return Err(LendingError::SelfTransfer);
        }
        let code = command.quantity.symbol.code.clone();
        let from_key = (command.contract.clone(), code.clone(), command.from.clone());
        let from_balance = self.balances.get(&from_key).copied().unwrap_or(0);
        if from_balance < command.quantity.amount {
            return Err(LendingError::Underfunded);
        }
        self.balances.insert(from_key, from_balance - command.quantity.amount);
        let to_key = (command.contract.clone(), code, command.to.clone());
        *self.balances.entry(to_key).or_insert(0) += command.quantity.amount;
        self.transfers.push(command);
        Ok(())
    }

    fn account_exists(&self, account: &AccountId) -> bool {
        self.accounts.contains(account)
    }

    fn token_exists(&self, contract: &AccountId, code: &SymbolCode) -> bool {
        self.tokens.contains(&(contract.clone(), code.clone()))
    }
}

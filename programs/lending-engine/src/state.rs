//! Engine state
//!
//! Everything the engine owns lives in one [`Ledger`] value: the parameter
//! table, collateral registry, oracle registry, price quotes and open
//! positions. No globals, no hidden tables. The whole ledger serializes
//! with borsh for persistence.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};

use crate::asset::{AccountId, Symbol, SymbolCode};
use crate::error::LendingError;
use crate::math::Rate;

/// String key/value configuration table
#[derive(BorshDeserialize, BorshSerialize, Clone, Debug, Default, PartialEq)]
pub struct ParamStore {
    entries: BTreeMap<String, String>,
}

impl ParamStore {
    /// Insert, update or delete one parameter.
    ///
    /// A new key is always inserted, even with an empty value. An empty
    /// value on an existing key deletes it.
    pub fn set(&mut self, key: &str, value: &str) {
        if self.entries.contains_key(key) {
            if value.is_empty() {
                self.entries.remove(key);
            } else {
                self.entries.insert(key.to_string(), value.to_string());
            }
        } else {
            self.entries.insert(key.to_string(), value.to_string());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn require(&self, key: &str) -> Result<&str, LendingError> {
        self.get(key).ok_or(LendingError::ParamNotFound)
    }

    pub fn get_u64(&self, key: &str) -> Result<u64, LendingError> {
        self.require(key)?
            .parse()
            .map_err(|_| LendingError::InvalidParam)
    }

    pub fn get_rate(&self, key: &str) -> Result<Rate, LendingError> {
        self.require(key)?.parse()
    }

    pub fn get_account(&self, key: &str) -> Result<AccountId, LendingError> {
        Ok(AccountId::new(self.require(key)?))
    }
}

/// One accepted collateral token
#[derive(BorshDeserialize, BorshSerialize, Clone, Debug, PartialEq)]
pub struct CollateralType {
    /// Token symbol, fixes the subunit precision for all positions
    pub symbol: Symbol,
    /// Token ledger account the token lives on
    pub contract: AccountId,
    /// Inactive collaterals reject new deposits
    pub active: bool,
}

/// One registered price oracle and the tickers it may quote
#[derive(BorshDeserialize, BorshSerialize, Clone, Debug, PartialEq)]
pub struct OracleEntry {
    pub symbols: Vec<SymbolCode>,
}

impl OracleEntry {
    pub fn supports(&self, code: &SymbolCode) -> bool {
        self.symbols.contains(code)
    }
}

/// One user's debt against one collateral
#[derive(BorshDeserialize, BorshSerialize, Clone, Debug, PartialEq)]
pub struct Position {
    /// Locked collateral, in collateral subunits
    pub collateral: i64,
    /// Outstanding principal, in stable subunits
    pub borrowed: i64,
    /// Accrued unpaid interest, in stable subunits
    pub interest: i64,
    /// Daily interest rate
    pub rate: Rate,
    /// Unix time the next accrual falls due
    pub next_accrual: i64,
}

impl Position {
    pub fn open(now: i64, rate: Rate) -> Self {
        Position {
            collateral: 0,
            borrowed: 0,
            interest: 0,
            rate,
            next_accrual: now,
        }
    }

    /// Principal plus accrued interest
    pub fn debt(&self) -> Result<i64, LendingError> {
        self.borrowed
            .checked_add(self.interest)
            .ok_or(LendingError::MathOverflow)
    }
}

/// The complete owned state of the engine
#[derive(BorshDeserialize, BorshSerialize, Clone, Debug, Default)]
pub struct Ledger {
    pub params: ParamStore,
    pub collaterals: BTreeMap<SymbolCode, CollateralType>,
    pub oracles: BTreeMap<AccountId, OracleEntry>,
    /// Latest price per collateral ticker, keyed by the quoting oracle
    pub quotes: BTreeMap<SymbolCode, BTreeMap<AccountId, Rate>>,
    /// Open positions per collateral ticker, keyed by owner
    pub positions: BTreeMap<SymbolCode, BTreeMap<AccountId, Position>>,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger::default()
    }

    pub fn position(&self, code: &SymbolCode, user: &AccountId) -> Option<&Position> {
        self.positions.get(code)?.get(user)
    }

    pub fn position_mut(&mut self, code: &SymbolCode, user: &AccountId) -> Option<&mut Position> {
        self.positions.get_mut(code)?.get_mut(user)
    }

    pub fn set_position(&mut self, code: &SymbolCode, user: &AccountId, position: Position) {
        self.positions
            .entry(code.clone())
            .or_default()
            .insert(user.clone(), position);
    }

    /// Drops the position and its partition once the partition empties
    pub fn remove_position(&mut self, code: &SymbolCode, user: &AccountId) {
        if let Some(partition) = self.positions.get_mut(code) {
            partition.remove(user);
            if partition.is_empty() {
                self.positions.remove(code);
            }
        }
    }

    pub fn has_positions(&self, code: &SymbolCode) -> bool {
        self.positions
            .get(code)
            .map(|partition| !partition.is_empty())
            .unwrap_or(false)
    }

    pub fn set_quote(&mut self, code: &SymbolCode, oracle: &AccountId, price: Rate) {
        self.quotes
            .entry(code.clone())
            .or_default()
            .insert(oracle.clone(), price);
    }

    /// Removes one oracle's quotes from every collateral partition
    pub fn drop_oracle_quotes(&mut self, oracle: &AccountId) {
        self.quotes.retain(|_, partition| {
            partition.remove(oracle);
            !partition.is_empty()
        });
    }

    /// Removes one oracle's quote for tickers it no longer serves
    pub fn drop_oracle_quotes_except(&mut self, oracle: &AccountId, keep: &[SymbolCode]) {
        self.quotes.retain(|code, partition| {
            if !keep.contains(code) {
                partition.remove(oracle);
            }
            !partition.is_empty()
        });
    }

    /// Removes every quote for one collateral ticker
    pub fn drop_symbol_quotes(&mut self, code: &SymbolCode) {
        self.quotes.remove(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acct(name: &str) -> AccountId {
        AccountId::new(name)
    }

    fn code(s: &str) -> SymbolCode {
        SymbolCode::new(s).unwrap()
    }

    #[test]
    fn params_insert_update_delete() {
        let mut params = ParamStore::default();

        // unknown key inserts, even when the value is empty
        params.set("manager", "");
        assert_eq!(params.get("manager"), Some(""));

        params.set("manager", "alice");
        assert_eq!(params.get("manager"), Some("alice"));

        // empty value on a known key deletes
        params.set("manager", "");
        assert_eq!(params.get("manager"), None);
        assert_eq!(
            params.require("manager"),
            Err(LendingError::ParamNotFound)
        );
    }

    #[test]
    fn params_parse_typed_values() {
        let mut params = ParamStore::default();
        params.set("max.oracles", "5");
        params.set("liquidate.th", "1.25");
        params.set("cron.account", "cronjob");
        params.set("junk", "not-a-number");

        assert_eq!(params.get_u64("max.oracles").unwrap(), 5);
        assert_eq!(params.get_rate("liquidate.th").unwrap(), "1.25".parse().unwrap());
        assert_eq!(params.get_account("cron.account").unwrap(), acct("cronjob"));
        assert_eq!(params.get_u64("junk"), Err(LendingError::InvalidParam));
        assert_eq!(params.get_u64("absent"), Err(LendingError::ParamNotFound));
    }

    #[test]
    fn position_debt_is_checked() {
        let mut position = Position::open(0, Rate::ZERO);
        position.borrowed = i64::MAX;
        position.interest = 1;
        assert_eq!(position.debt(), Err(LendingError::MathOverflow));
        position.interest = 0;
        assert_eq!(position.debt().unwrap(), i64::MAX);
    }

    #[test]
    fn remove_position_drops_empty_partition() {
        let mut ledger = Ledger::new();
        ledger.set_position(&code("ZIG"), &acct("alice"), Position::open(0, Rate::ZERO));
        ledger.set_position(&code("ZIG"), &acct("bob"), Position::open(0, Rate::ZERO));

        ledger.remove_position(&code("ZIG"), &acct("alice"));
        assert!(ledger.has_positions(&code("ZIG")));

        ledger.remove_position(&code("ZIG"), &acct("bob"));
        assert!(!ledger.has_positions(&code("ZIG")));
        assert!(ledger.positions.get(&code("ZIG")).is_none());
    }

    #[test]
    fn oracle_quote_pruning() {
        let mut ledger = Ledger::new();
        let one = Rate::ONE;
        ledger.set_quote(&code("ZIG"), &acct("oracle1"), one);
        ledger.set_quote(&code("ZIG"), &acct("oracle2"), one);
        ledger.set_quote(&code("BTC"), &acct("oracle1"), one);

        ledger.drop_oracle_quotes(&acct("oracle1"));
        assert_eq!(ledger.quotes.get(&code("ZIG")).unwrap().len(), 1);
        // BTC partition emptied and was dropped with it
        assert!(ledger.quotes.get(&code("BTC")).is_none());

        ledger.set_quote(&code("BTC"), &acct("oracle2"), one);
        ledger.drop_oracle_quotes_except(&acct("oracle2"), &[code("BTC")]);
        assert!(ledger.quotes.get(&code("ZIG")).is_none());
        assert!(ledger.quotes.get(&code("BTC")).is_some());
    }
}

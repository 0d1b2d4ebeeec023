//! Instruction definitions for the lending engine
//!
//! Complete enumeration of the administrative and keeper operations.
//! Deposits and repayments are not instructions: they arrive as token
//! transfer notices and are routed by the processor.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::asset::{AccountId, Symbol, SymbolCode};
use crate::math::Rate;

/// Every operation the engine account serves, minus transfer routing
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq)]
pub enum LendingInstruction {
    // === Registry Instructions ===

    /// Set, replace, or clear (empty value) a configuration parameter
    SetParam { key: String, value: String },

    /// Register a collateral token, initially inactive
    AddCollateral { symbol: Symbol, contract: AccountId },

    /// Switch deposits for a collateral on or off
    SetCollateralActive { code: SymbolCode, active: bool },

    /// Drop an inactive collateral with no open positions
    RemoveCollateral { code: SymbolCode },

    // === Oracle Instructions ===

    /// Register a price oracle for a set of collaterals
    AddOracle {
        account: AccountId,
        symbols: Vec<SymbolCode>,
    },

    /// Replace an oracle's collateral assignment
    SetOracle {
        account: AccountId,
        symbols: Vec<SymbolCode>,
    },

    /// Drop an oracle and its outstanding quotes
    RemoveOracle { account: AccountId },

    /// Publish one oracle's price for a collateral
    SubmitRate {
        oracle: AccountId,
        code: SymbolCode,
        price: Rate,
    },

    // === Position Instructions ===

    /// Override the interest rate on one position
    SetInterestRate {
        user: AccountId,
        code: SymbolCode,
        rate: Rate,
    },

    /// Accrue a position's interest ahead of its schedule
    AccrueInterest { user: AccountId, code: SymbolCode },

    /// Check a position against the collateralization threshold
    Liquidate { user: AccountId, code: SymbolCode },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_round_trip_through_borsh() {
        let original = LendingInstruction::SubmitRate {
            oracle: AccountId::new("oracle1"),
            code: SymbolCode::new("EOS").unwrap(),
            price: "3.25".parse().unwrap(),
        };
        let bytes = original.try_to_vec().unwrap();
        assert_eq!(LendingInstruction::try_from_slice(&bytes).unwrap(), original);

        let original = LendingInstruction::AddOracle {
            account: AccountId::new("oracle1"),
            symbols: vec![SymbolCode::new("EOS").unwrap(), SymbolCode::new("WAX").unwrap()],
        };
        let bytes = original.try_to_vec().unwrap();
        assert_eq!(LendingInstruction::try_from_slice(&bytes).unwrap(), original);
    }
}

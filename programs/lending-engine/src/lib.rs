//! Collateral-backed lending engine
//!
//! Users deposit a registered collateral token and receive a loan in the
//! stable token, sized by the oracle mean price and the loan-to-value
//! divisor. Interest accrues on a per-position schedule, repayments
//! arrive as stable transfers whose memo names the collateral, and a
//! keeper forces positions closed once their collateral value no longer
//! covers the configured multiple of their debt.

pub mod asset;
pub mod borrowing;
pub mod constants;
pub mod engine;
pub mod error;
pub mod instruction;
pub mod interest;
pub mod liquidation;
pub mod math;
pub mod oracle;
pub mod processor;
pub mod scheduler;
pub mod state;
pub mod transfer;

pub use engine::{EngineConfig, LendingEngine};
pub use error::LendingError;
pub use instruction::LendingInstruction;

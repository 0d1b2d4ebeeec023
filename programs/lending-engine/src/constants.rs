//! Global constants for the lending engine
//!
//! Central location for engine-wide constants and parameter keys

/// Minimum inbound transfer size in subunits of the transferred asset
pub const MIN_TRANSFER_SUBUNITS: i64 = 1000; // 0.1000 at precision 4

/// Size of a status-notification transfer in stable subunits
pub const NOTIFICATION_SUBUNITS: i64 = 1; // 0.0001 at precision 4

/// Upper bound for a per-position daily interest rate
pub const INTEREST_RATE_MAX: u64 = 100; // 100x the principal per accrual

/// Maximum decimal precision a symbol may carry
pub const MAX_SYMBOL_PRECISION: u8 = 18;

/// Maximum length of a symbol code
pub const MAX_SYMBOL_CODE_LEN: usize = 7;

/// ===== PARAMETER TABLE KEYS =====

/// Oracle registry capacity
pub const PARAM_MAX_ORACLES: &str = "max.oracles";

/// Loan-to-value divisor applied to collateral value
pub const PARAM_POSITION_DEF: &str = "position.def";

/// Default daily interest rate for new positions
pub const PARAM_INTEREST_DEF: &str = "interest.def";

/// Accrual interval in seconds
pub const PARAM_INTEREST_INTERVAL: &str = "interest.int";

/// Minimum collateral-value-to-debt ratio before forced closure
pub const PARAM_LIQUIDATION_THRESHOLD: &str = "liquidate.th";

/// Fraction of collateral value retained on liquidation
pub const PARAM_PENALTY: &str = "penalty";

/// Account allowed to override per-position interest rates
pub const PARAM_MANAGER: &str = "manager";

/// Account allowed to drive accrual and liquidation upkeep
pub const PARAM_CRON_ACCOUNT: &str = "cron.account";

/// Recipient of liquidation proceeds
pub const PARAM_LIQUIDATION_ACCOUNT: &str = "liquid.addr";

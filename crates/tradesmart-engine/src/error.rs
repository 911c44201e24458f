//! Engine error types.
//!
//! These are structured rejections, not faults: admission surfaces them
//! as rejection reasons and nothing in the engine panics on them.

use thiserror::Error;

/// Reasons a trade mutation is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TradeError {
    #[error("Invalid trade parameters: {0}")]
    InvalidTradeParams(String),

    #[error("Maximum concurrent positions reached ({0})")]
    PositionLimitReached(usize),

    #[error("Position already open for symbol {0}")]
    DuplicateSymbol(String),

    #[error("Insufficient balance to open a position")]
    InsufficientBalance,

    #[error("Position not found: {0}")]
    PositionNotFound(String),
}

/// Result type alias for engine operations.
pub type TradeResult<T> = std::result::Result<T, TradeError>;

//! Quote client error types.

use thiserror::Error;

/// Quote vendor error types.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// The vendor answered 2xx with its documented error envelope.
    #[error("Vendor error: {0}")]
    Vendor(String),

    /// HTTP failure after the retry budget was exhausted.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The vendor response body did not match the documented shape.
    #[error("Response parse error: {0}")]
    Parse(String),
}

/// Result type alias for quote operations.
pub type QuoteResult<T> = std::result::Result<T, QuoteError>;

//! Oracle error types.

use thiserror::Error;

/// Verdict oracle error types.
#[derive(Debug, Error)]
pub enum OracleError {
    /// HTTP failure talking to the LLM endpoint.
    #[error("Oracle transport error: {0}")]
    Transport(String),

    /// The reply held no verdict JSON, or it violated the schema.
    #[error("Oracle parse error: {0}")]
    Parse(String),

    /// The reply had no content at all.
    #[error("Oracle returned empty content")]
    Empty,
}

/// Result type alias for oracle operations.
pub type OracleResult<T> = std::result::Result<T, OracleError>;

//! Application and analysis error types.

use thiserror::Error;

/// Application-level startup errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type AppResult<T> = Result<T, AppError>;

/// Errors from analyzing one alert. The HTTP layer maps these onto
/// status codes at the boundary.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Caller-supplied data is malformed (HTTP 400).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Every timeframe fetch failed, so there is nothing to analyze
    /// (HTTP 500).
    #[error("No market data available for any timeframe")]
    NoMarketData,

    /// The oracle failed (HTTP 500).
    #[error(transparent)]
    Oracle(#[from] tradesmart_oracle::OracleError),
}

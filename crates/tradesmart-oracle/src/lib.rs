//! LLM verdict oracle for TradeSmart.
//!
//! Composes a prompt from an alert plus multi-timeframe OHLCV tables,
//! submits it to the LLM messages endpoint, and parses the single JSON
//! object in the reply into a [`tradesmart_core::Verdict`].

pub mod client;
pub mod error;
pub mod parse;
pub mod prompt;

pub use client::{OracleConfig, VerdictOracle};
pub use error::{OracleError, OracleResult};

//! Quote vendor client for TradeSmart.
//!
//! Fetches OHLCV time series from the vendor REST API with a bounded
//! retry budget. No caching; every call is idempotent.

pub mod client;
pub mod error;

pub use client::{QuoteClient, QuoteConfig};
pub use error::{QuoteError, QuoteResult};

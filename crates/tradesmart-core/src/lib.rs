//! Core domain types for TradeSmart.
//!
//! This crate provides the fundamental types shared across the system:
//! - `Price`: precision-safe decimal price type
//! - `OhlcvCandle`, `Timeframe`, `TimeframeData`: market data
//! - `Alert`, `Verdict`, `TradeDirection`: analysis inputs and outputs
//! - `Wallet`, `Position`, `ClosedPosition`, `EngineState`: paper trading state
//! - `normalize_symbol`: exchange-to-vendor ticker mapping

pub mod alert;
pub mod candle;
pub mod decimal;
pub mod error;
pub mod position;
pub mod state;
pub mod symbol;
pub mod verdict;
pub mod wallet;

pub use alert::Alert;
pub use candle::{OhlcvCandle, Timeframe, TimeframeData};
pub use decimal::Price;
pub use error::{CoreError, Result};
pub use position::{CloseReason, ClosedPosition, Position};
pub use state::EngineState;
pub use symbol::{base_symbol, normalize_symbol};
pub use verdict::{TradeDirection, Verdict};
pub use wallet::Wallet;

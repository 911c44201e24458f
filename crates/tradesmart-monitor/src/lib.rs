//! Open position monitor for TradeSmart.
//!
//! A long-running loop that polls the latest candle per open position
//! and closes positions whose price has crossed stop-loss or
//! take-profit. Per-position failures never stop the loop.

pub mod monitor;
pub mod source;

pub use monitor::PositionMonitor;
pub use source::CandleSource;

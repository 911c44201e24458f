//! Paper trading engine for TradeSmart.
//!
//! [`PaperEngine`] is the single owner of wallet and position state:
//! every mutation runs under one mutex, commits in memory, and persists
//! before the call returns. [`AdmissionFilter`] applies the ordered risk
//! gates that decide whether an oracle verdict becomes a paper trade.

pub mod admission;
pub mod config;
pub mod engine;
pub mod error;

pub use admission::{AdmissionFilter, ExecutionDecision};
pub use config::PaperTradingConfig;
pub use engine::{CloseResult, PaperEngine};
pub use error::{TradeError, TradeResult};

//! Paper trading configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Paper trading configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperTradingConfig {
    /// Global enable flag; when off, admission rejects everything.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Wallet balance at first boot (USD).
    #[serde(default = "default_initial_balance")]
    pub initial_balance: Decimal,
    /// Minimum oracle confidence to admit a trade.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    /// Fraction of available balance locked per position (0.0 - 1.0).
    #[serde(default = "default_max_position_size_percent")]
    pub max_position_size_percent: Decimal,
    #[serde(default = "default_max_concurrent_positions")]
    pub max_concurrent_positions: usize,
    /// Leverage multiplier applied to collateral.
    #[serde(default = "default_leverage")]
    pub leverage: Decimal,
    /// Cap on stop-loss distance from entry (0.0 - 1.0). Wider stops are
    /// pulled in to this boundary.
    #[serde(default = "default_max_stop_loss_percent")]
    pub max_stop_loss_percent: Decimal,
    #[serde(default = "default_monitor_interval_secs")]
    pub monitor_interval_secs: u64,
    #[serde(default = "default_state_file_path")]
    pub state_file_path: String,
    /// Base symbols (prefix before `/`) admission will trade.
    #[serde(default = "default_allowed_base_symbols")]
    pub allowed_base_symbols: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_initial_balance() -> Decimal {
    Decimal::from(1000)
}

fn default_confidence_threshold() -> f64 {
    80.0
}

fn default_max_position_size_percent() -> Decimal {
    Decimal::new(10, 2) // 0.10
}

fn default_max_concurrent_positions() -> usize {
    2
}

fn default_leverage() -> Decimal {
    Decimal::from(2)
}

fn default_max_stop_loss_percent() -> Decimal {
    Decimal::new(20, 2) // 0.20
}

fn default_monitor_interval_secs() -> u64 {
    60
}

fn default_state_file_path() -> String {
    "paper-trading-state.json".to_string()
}

fn default_allowed_base_symbols() -> Vec<String> {
    ["BTC", "XAU", "XAG", "XPT"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

impl Default for PaperTradingConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            initial_balance: default_initial_balance(),
            confidence_threshold: default_confidence_threshold(),
            max_position_size_percent: default_max_position_size_percent(),
            max_concurrent_positions: default_max_concurrent_positions(),
            leverage: default_leverage(),
            max_stop_loss_percent: default_max_stop_loss_percent(),
            monitor_interval_secs: default_monitor_interval_secs(),
            state_file_path: default_state_file_path(),
            allowed_base_symbols: default_allowed_base_symbols(),
        }
    }
}

impl PaperTradingConfig {
    /// Case-insensitive allow-list check on a base symbol.
    pub fn allows_base_symbol(&self, base: &str) -> bool {
        self.allowed_base_symbols
            .iter()
            .any(|s| s.eq_ignore_ascii_case(base))
    }
}

//! The single unit of persistence: wallet plus position collections.

use crate::position::{ClosedPosition, Position};
use crate::wallet::Wallet;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Full engine state: wallet, open positions, closed history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineState {
    pub wallet: Wallet,
    pub open_positions: Vec<Position>,
    pub closed_positions: Vec<ClosedPosition>,
    pub last_updated_at: DateTime<Utc>,
}

impl EngineState {
    /// Fresh state for first boot.
    pub fn new(initial_balance: Decimal) -> Self {
        Self {
            wallet: Wallet::new(initial_balance),
            open_positions: Vec::new(),
            closed_positions: Vec::new(),
            last_updated_at: Utc::now(),
        }
    }

    /// Open position for the symbol, case-insensitive.
    pub fn open_position_for(&self, symbol: &str) -> Option<&Position> {
        self.open_positions.iter().find(|p| p.is_for_symbol(symbol))
    }
}

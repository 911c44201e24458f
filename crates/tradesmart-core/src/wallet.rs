//! Paper trading wallet.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Wallet balances and running statistics.
///
/// Modeled as an immutable value: every admitted open and every close
/// replaces the wallet with a new value under the engine mutex, so state
/// snapshots never observe a half-applied mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub initial_balance: Decimal,
    pub available_balance: Decimal,
    pub total_realized_pnl: Decimal,
    pub total_trades: u64,
    pub winning_trades: u64,
    pub losing_trades: u64,
}

impl Wallet {
    pub fn new(initial_balance: Decimal) -> Self {
        Self {
            initial_balance,
            available_balance: initial_balance,
            total_realized_pnl: Decimal::ZERO,
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
        }
    }

    /// Wallet after locking collateral for a new position.
    ///
    /// The trade counter increments at open: `total_trades` counts admitted
    /// trades, not settled ones.
    #[must_use]
    pub fn with_open(&self, size_usd: Decimal) -> Self {
        Self {
            available_balance: self.available_balance - size_usd,
            total_trades: self.total_trades + 1,
            ..self.clone()
        }
    }

    /// Wallet after settling a close: collateral returned plus PnL.
    ///
    /// The available balance is clamped at zero when a leveraged loss
    /// exceeds the collateral.
    #[must_use]
    pub fn with_close(&self, size_usd: Decimal, pnl: Decimal) -> Self {
        let restored = self.available_balance + size_usd + pnl;
        let (winning, losing) = if pnl >= Decimal::ZERO {
            (self.winning_trades + 1, self.losing_trades)
        } else {
            (self.winning_trades, self.losing_trades + 1)
        };
        Self {
            available_balance: restored.max(Decimal::ZERO),
            total_realized_pnl: self.total_realized_pnl + pnl,
            winning_trades: winning,
            losing_trades: losing,
            ..self.clone()
        }
    }

    /// Win rate in percent over closed trades, if any have closed.
    pub fn win_rate_pct(&self) -> Option<Decimal> {
        let closed = self.winning_trades + self.losing_trades;
        if closed == 0 {
            return None;
        }
        Some(Decimal::from(self.winning_trades * 100) / Decimal::from(closed))
    }
}

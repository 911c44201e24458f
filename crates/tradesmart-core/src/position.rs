//! Open and closed paper positions.

use crate::decimal::Price;
use crate::verdict::TradeDirection;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    StopLoss,
    TakeProfit,
    Manual,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::StopLoss => write!(f, "StopLoss"),
            CloseReason::TakeProfit => write!(f, "TakeProfit"),
            CloseReason::Manual => write!(f, "Manual"),
        }
    }
}

/// An open simulated leveraged position. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Opaque unique id, generated at open.
    pub position_id: String,
    pub symbol: String,
    pub direction: TradeDirection,
    pub entry_price: Price,
    /// Collateral locked from the wallet (USD).
    pub position_size_usd: Decimal,
    /// Asset quantity: `size_usd * leverage / entry`.
    pub quantity: Decimal,
    pub leverage: Decimal,
    pub stop_loss: Price,
    pub take_profit: Price,
    /// Oracle confidence at open time.
    pub confidence: f64,
    pub opened_at: DateTime<Utc>,
    /// Snapshot of the oracle's reasoning at open time.
    pub reasoning: String,
}

impl Position {
    /// PnL at the given exit price.
    ///
    /// `pnl = directionSign * (exit - entry) / entry * sizeUsd * leverage`
    pub fn pnl_at(&self, exit_price: Price) -> Decimal {
        let price_change = match self.direction {
            TradeDirection::Short => self.entry_price.inner() - exit_price.inner(),
            // Long is the only other direction an open position can hold
            _ => exit_price.inner() - self.entry_price.inner(),
        };
        price_change / self.entry_price.inner() * self.position_size_usd * self.leverage
    }

    /// Exit trigger at the given price, if any.
    ///
    /// Long: price at or below SL closes at a loss, at or above TP at a
    /// profit. Short: mirrored.
    pub fn exit_trigger(&self, price: Price) -> Option<CloseReason> {
        match self.direction {
            TradeDirection::Long => {
                if price <= self.stop_loss {
                    Some(CloseReason::StopLoss)
                } else if price >= self.take_profit {
                    Some(CloseReason::TakeProfit)
                } else {
                    None
                }
            }
            TradeDirection::Short => {
                if price >= self.stop_loss {
                    Some(CloseReason::StopLoss)
                } else if price <= self.take_profit {
                    Some(CloseReason::TakeProfit)
                } else {
                    None
                }
            }
            TradeDirection::NoTrade => None,
        }
    }

    /// Case-insensitive symbol match.
    pub fn is_for_symbol(&self, symbol: &str) -> bool {
        self.symbol.eq_ignore_ascii_case(symbol)
    }

    /// Produce the closed copy of this position.
    #[must_use]
    pub fn into_closed(
        self,
        exit_price: Price,
        realized_pnl: Decimal,
        close_reason: CloseReason,
        closed_at: DateTime<Utc>,
    ) -> ClosedPosition {
        ClosedPosition {
            position_id: self.position_id,
            symbol: self.symbol,
            direction: self.direction,
            entry_price: self.entry_price,
            position_size_usd: self.position_size_usd,
            quantity: self.quantity,
            leverage: self.leverage,
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
            confidence: self.confidence,
            opened_at: self.opened_at,
            reasoning: self.reasoning,
            closed_at,
            exit_price,
            realized_pnl,
            close_reason,
        }
    }
}

/// A settled position. Never deleted, only appended to history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedPosition {
    pub position_id: String,
    pub symbol: String,
    pub direction: TradeDirection,
    pub entry_price: Price,
    pub position_size_usd: Decimal,
    pub quantity: Decimal,
    pub leverage: Decimal,
    pub stop_loss: Price,
    pub take_profit: Price,
    pub confidence: f64,
    pub opened_at: DateTime<Utc>,
    pub reasoning: String,
    pub closed_at: DateTime<Utc>,
    pub exit_price: Price,
    pub realized_pnl: Decimal,
    pub close_reason: CloseReason,
}

impl ClosedPosition {
    /// How long the position was held.
    pub fn holding_duration(&self) -> chrono::Duration {
        self.closed_at - self.opened_at
    }
}

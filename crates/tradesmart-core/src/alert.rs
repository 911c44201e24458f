//! Inbound alert from the charting platform.

use crate::decimal::Price;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A webhook alert suggesting a trading opportunity. Immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Exchange-native ticker (e.g. "BTCUSDT").
    pub symbol: String,
    #[serde(default)]
    pub exchange: String,
    /// Free-form action hint from the platform (e.g. "buy", "sell", "cross").
    #[serde(default)]
    pub action: String,
    pub price: Option<Price>,
    /// Interval hint from the chart the alert fired on.
    #[serde(default)]
    pub interval: String,
    #[serde(default)]
    pub message: String,
    /// Shared secret for ingress authentication, when configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default = "Utc::now")]
    pub received_at: DateTime<Utc>,
}

impl Alert {
    pub fn has_symbol(&self) -> bool {
        !self.symbol.trim().is_empty()
    }
}

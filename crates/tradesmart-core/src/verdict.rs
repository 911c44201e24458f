//! Structured trade verdict produced by the oracle.

use crate::decimal::Price;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Trade direction.
///
/// Deserialization is lossy on purpose: any string outside
/// `Long`/`Short` (case-insensitive) maps to `NoTrade`, so a creative
/// oracle reply is rejected by admission instead of failing the parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TradeDirection {
    Long,
    Short,
    #[default]
    NoTrade,
}

impl TradeDirection {
    /// Map a free-form direction string onto the enum.
    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" => TradeDirection::Long,
            "short" => TradeDirection::Short,
            _ => TradeDirection::NoTrade,
        }
    }

    /// Whether this direction can open a position.
    pub fn is_tradeable(&self) -> bool {
        matches!(self, TradeDirection::Long | TradeDirection::Short)
    }
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeDirection::Long => write!(f, "Long"),
            TradeDirection::Short => write!(f, "Short"),
            TradeDirection::NoTrade => write!(f, "NoTrade"),
        }
    }
}

impl<'de> Deserialize<'de> for TradeDirection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(TradeDirection::from_str_lossy(&s))
    }
}

/// Structured judgement for one alert. Immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub symbol: String,
    #[serde(default)]
    pub direction: TradeDirection,
    /// Confidence in [0, 100].
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_reward_ratio: Option<String>,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default = "Utc::now")]
    pub analyzed_at: DateTime<Utc>,
}

impl Verdict {
    /// Whether entry, stop-loss and take-profit are all present.
    pub fn has_price_levels(&self) -> bool {
        self.entry_price.is_some() && self.stop_loss.is_some() && self.take_profit.is_some()
    }
}

//! OHLCV candles and the multi-resolution timeframe ladder.

use crate::decimal::Price;
use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single OHLCV candle for a fixed time bucket. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OhlcvCandle {
    /// Open time of the bucket (UTC).
    pub open_time: DateTime<Utc>,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: u64,
}

impl OhlcvCandle {
    /// Age of this candle relative to `now`.
    pub fn age_at(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.open_time
    }
}

/// Candle resolution.
///
/// The default analysis ladder spans 1 minute to 1 day so the oracle sees
/// the same move at several scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    Min1,
    Min5,
    Min15,
    Hour1,
    Hour4,
    Day1,
}

impl Timeframe {
    /// The fixed multi-resolution ladder submitted to the oracle.
    pub const LADDER: [Timeframe; 6] = [
        Timeframe::Min1,
        Timeframe::Min5,
        Timeframe::Min15,
        Timeframe::Hour1,
        Timeframe::Hour4,
        Timeframe::Day1,
    ];

    /// Interval string in the quote vendor's format.
    pub fn vendor_interval(&self) -> &'static str {
        match self {
            Timeframe::Min1 => "1min",
            Timeframe::Min5 => "5min",
            Timeframe::Min15 => "15min",
            Timeframe::Hour1 => "1h",
            Timeframe::Hour4 => "4h",
            Timeframe::Day1 => "1day",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.vendor_interval())
    }
}

impl FromStr for Timeframe {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1min" => Ok(Timeframe::Min1),
            "5min" => Ok(Timeframe::Min5),
            "15min" => Ok(Timeframe::Min15),
            "1h" => Ok(Timeframe::Hour1),
            "4h" => Ok(Timeframe::Hour4),
            "1day" => Ok(Timeframe::Day1),
            other => Err(CoreError::InvalidTimeframe(other.to_string())),
        }
    }
}

/// Candles for one timeframe, ordered newest-first. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeframeData {
    pub timeframe: Timeframe,
    /// Newest-first candle sequence.
    pub candles: Vec<OhlcvCandle>,
}

impl TimeframeData {
    pub fn new(timeframe: Timeframe, candles: Vec<OhlcvCandle>) -> Self {
        Self { timeframe, candles }
    }

    /// The most recent candle, if any.
    pub fn latest(&self) -> Option<&OhlcvCandle> {
        self.candles.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn candle(close: rust_decimal::Decimal) -> OhlcvCandle {
        OhlcvCandle {
            open_time: Utc::now(),
            open: Price::new(close),
            high: Price::new(close),
            low: Price::new(close),
            close: Price::new(close),
            volume: 10,
        }
    }

    #[test]
    fn test_timeframe_round_trip() {
        for tf in Timeframe::LADDER {
            let parsed: Timeframe = tf.vendor_interval().parse().unwrap();
            assert_eq!(parsed, tf);
        }
    }

    #[test]
    fn test_unknown_timeframe_rejected() {
        assert!("2min".parse::<Timeframe>().is_err());
    }

    #[test]
    fn test_latest_is_first() {
        let data = TimeframeData::new(Timeframe::Min1, vec![candle(dec!(101)), candle(dec!(100))]);
        assert_eq!(data.latest().unwrap().close, Price::new(dec!(101)));
    }
}

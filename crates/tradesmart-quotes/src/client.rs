//! HTTP client for the quote vendor's time series endpoint.
//!
//! The vendor answers `GET /time_series` with either
//! `{"values": [{datetime, open, high, low, close, volume}, …]}` or, still
//! with HTTP 200, `{"status": "error", "message": …}`. Transient failures
//! (timeouts, 5xx) are retried with exponential backoff and jitter before
//! surfacing as `QuoteError::Transport`.

use crate::error::{QuoteError, QuoteResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use tradesmart_core::{OhlcvCandle, Price, Timeframe};

/// Quote vendor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries after the first attempt, transient failures only.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.twelvedata.com".to_string(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

/// Raw candle row from the vendor (all values arrive as strings).
#[derive(Debug, Deserialize)]
struct RawCandle {
    datetime: String,
    open: String,
    high: String,
    low: String,
    close: String,
    #[serde(default)]
    volume: Option<String>,
}

/// Vendor response: either a values array or an error envelope, both 2xx.
#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    values: Option<Vec<RawCandle>>,
}

/// Client for the vendor's OHLCV time series endpoint.
#[derive(Clone)]
pub struct QuoteClient {
    client: Client,
    config: QuoteConfig,
}

impl QuoteClient {
    pub fn new(config: QuoteConfig) -> QuoteResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| QuoteError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Fetch up to `count` candles for the symbol, newest-first.
    pub async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: u32,
    ) -> QuoteResult<Vec<OhlcvCandle>> {
        let url = format!("{}/time_series", self.config.base_url);
        let interval = timeframe.vendor_interval();

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_once(&url, symbol, interval, count).await {
                Ok(candles) => {
                    debug!(
                        symbol,
                        interval,
                        candles = candles.len(),
                        "Fetched time series"
                    );
                    return Ok(candles);
                }
                Err(FetchFailure::Fatal(err)) => return Err(err),
                Err(FetchFailure::Transient(reason)) => {
                    if attempt > self.config.max_retries {
                        return Err(QuoteError::Transport(format!(
                            "{reason} (after {attempt} attempts)"
                        )));
                    }
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        symbol,
                        interval,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        %reason,
                        "Transient quote vendor failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn fetch_once(
        &self,
        url: &str,
        symbol: &str,
        interval: &str,
        count: u32,
    ) -> Result<Vec<OhlcvCandle>, FetchFailure> {
        let response = self
            .client
            .get(url)
            .query(&[
                ("symbol", symbol),
                ("interval", interval),
                ("outputsize", &count.to_string()),
                ("apikey", &self.config.api_key),
            ])
            .send()
            .await
            .map_err(|e| FetchFailure::Transient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(FetchFailure::Transient(format!("HTTP {status}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchFailure::Fatal(QuoteError::Transport(format!(
                "HTTP {status}: {body}"
            ))));
        }

        let body: TimeSeriesResponse = response
            .json()
            .await
            .map_err(|e| FetchFailure::Fatal(QuoteError::Parse(format!("{e}"))))?;

        if body.status.as_deref() == Some("error") {
            let message = body.message.unwrap_or_else(|| "unspecified".to_string());
            return Err(FetchFailure::Fatal(QuoteError::Vendor(message)));
        }

        let raw = body.values.ok_or_else(|| {
            FetchFailure::Fatal(QuoteError::Parse("response has no values array".to_string()))
        })?;

        let candles = raw
            .into_iter()
            .map(parse_candle)
            .collect::<Result<Vec<_>, _>>()
            .map_err(FetchFailure::Fatal)?;

        Ok(candles)
    }

    /// Exponential backoff with jitter: `base * 2^(attempt-1)` plus 0-250ms.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(8);
        let delay = self
            .config
            .retry_base_delay_ms
            .saturating_mul(1u64 << exponent);
        Duration::from_millis(delay + rand_jitter())
    }
}

enum FetchFailure {
    /// Worth retrying: timeout, connect failure, 5xx.
    Transient(String),
    /// Not retryable: vendor envelope, bad shape, 4xx.
    Fatal(QuoteError),
}

/// Generate random jitter (0-250ms).
fn rand_jitter() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    (nanos % 250) as u64
}

fn parse_candle(raw: RawCandle) -> Result<OhlcvCandle, QuoteError> {
    let open_time = parse_vendor_datetime(&raw.datetime)
        .ok_or_else(|| QuoteError::Parse(format!("bad datetime: {}", raw.datetime)))?;

    let price = |field: &str, value: &str| -> Result<Price, QuoteError> {
        value
            .parse::<Price>()
            .map_err(|e| QuoteError::Parse(format!("bad {field} value {value:?}: {e}")))
    };

    let volume = match raw.volume.as_deref() {
        Some(v) => v
            .parse::<u64>()
            .map_err(|e| QuoteError::Parse(format!("bad volume value {v:?}: {e}")))?,
        None => 0,
    };

    Ok(OhlcvCandle {
        open_time,
        open: price("open", &raw.open)?,
        high: price("high", &raw.high)?,
        low: price("low", &raw.low)?,
        close: price("close", &raw.close)?,
        volume,
    })
}

/// Vendor timestamps come as `YYYY-MM-DD HH:MM:SS` for intraday intervals
/// and bare `YYYY-MM-DD` for daily ones. Both are UTC.
fn parse_vendor_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_hms_opt(0, 0, 0).expect("midnight is valid").and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_vendor_datetime_intraday() {
        let dt = parse_vendor_datetime("2024-03-01 14:05:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-01T14:05:00+00:00");
    }

    #[test]
    fn test_parse_vendor_datetime_daily() {
        let dt = parse_vendor_datetime("2024-03-01").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }

    #[test]
    fn test_parse_candle_row() {
        let raw = RawCandle {
            datetime: "2024-03-01 14:05:00".to_string(),
            open: "100.5".to_string(),
            high: "101".to_string(),
            low: "99.75".to_string(),
            close: "100.9".to_string(),
            volume: Some("1234".to_string()),
        };
        let candle = parse_candle(raw).unwrap();
        assert_eq!(candle.open, Price::new(dec!(100.5)));
        assert_eq!(candle.close, Price::new(dec!(100.9)));
        assert_eq!(candle.volume, 1234);
    }

    #[test]
    fn test_parse_candle_missing_volume_defaults_to_zero() {
        let raw = RawCandle {
            datetime: "2024-03-01".to_string(),
            open: "1".to_string(),
            high: "1".to_string(),
            low: "1".to_string(),
            close: "1".to_string(),
            volume: None,
        };
        assert_eq!(parse_candle(raw).unwrap().volume, 0);
    }

    #[test]
    fn test_parse_candle_bad_price_rejected() {
        let raw = RawCandle {
            datetime: "2024-03-01".to_string(),
            open: "not-a-number".to_string(),
            high: "1".to_string(),
            low: "1".to_string(),
            close: "1".to_string(),
            volume: None,
        };
        assert!(matches!(parse_candle(raw), Err(QuoteError::Parse(_))));
    }

    #[test]
    fn test_error_envelope_detection() {
        let body: TimeSeriesResponse = serde_json::from_str(
            r#"{"status":"error","message":"symbol not found","code":400}"#,
        )
        .unwrap();
        assert_eq!(body.status.as_deref(), Some("error"));
        assert!(body.values.is_none());
    }

    #[test]
    fn test_values_envelope_detection() {
        let body: TimeSeriesResponse = serde_json::from_str(
            r#"{"values":[{"datetime":"2024-03-01 14:05:00","open":"1","high":"2","low":"0.5","close":"1.5","volume":"10"}]}"#,
        )
        .unwrap();
        assert_eq!(body.values.unwrap().len(), 1);
    }

    #[test]
    fn test_backoff_grows_exponentially() {
        let client = QuoteClient::new(QuoteConfig {
            retry_base_delay_ms: 100,
            ..QuoteConfig::default()
        })
        .unwrap();
        let d1 = client.backoff_delay(1).as_millis() as u64;
        let d3 = client.backoff_delay(3).as_millis() as u64;
        assert!((100..100 + 250).contains(&d1));
        assert!((400..400 + 250).contains(&d3));
    }
}

//! Prompt composition for the verdict oracle.
//!
//! The user prompt enumerates the alert and one compact OHLCV table per
//! timeframe, capped at the most recent candles to bound prompt size.

use std::fmt::Write as _;

use tradesmart_core::{Alert, TimeframeData};

/// System prompt: fixes the analyst role and the exact reply schema.
pub const SYSTEM_PROMPT: &str = "You are a disciplined technical analyst for leveraged trading. \
Evaluate the alert against the multi-timeframe OHLCV data and decide whether a trade is justified. \
Reply with exactly one JSON object and nothing else, using this schema: \
{\"symbol\": string, \"direction\": \"Long\"|\"Short\"|\"NoTrade\", \"confidence\": number 0-100, \
\"entryPrice\": number|null, \"stopLoss\": number|null, \"takeProfit\": number|null, \
\"riskRewardRatio\": string|null, \"reasoning\": string}. \
When direction is NoTrade, leave the price levels null. \
Be conservative: prefer NoTrade unless the confluence across timeframes is strong.";

/// Render the user prompt for one alert and its collected market data.
///
/// Each timeframe table holds at most `max_candles` rows, newest-first.
pub fn user_prompt(alert: &Alert, market_data: &[TimeframeData], max_candles: usize) -> String {
    let mut out = String::new();

    writeln!(out, "Alert received:").ok();
    writeln!(out, "- symbol: {}", alert.symbol).ok();
    if !alert.exchange.is_empty() {
        writeln!(out, "- exchange: {}", alert.exchange).ok();
    }
    if !alert.action.is_empty() {
        writeln!(out, "- action hint: {}", alert.action).ok();
    }
    if let Some(price) = alert.price {
        writeln!(out, "- alert price: {price}").ok();
    }
    if !alert.interval.is_empty() {
        writeln!(out, "- chart interval: {}", alert.interval).ok();
    }
    if !alert.message.is_empty() {
        writeln!(out, "- message: {}", alert.message).ok();
    }

    for data in market_data {
        writeln!(
            out,
            "\n{} candles (newest first, datetime open high low close volume):",
            data.timeframe
        )
        .ok();
        for candle in data.candles.iter().take(max_candles) {
            writeln!(
                out,
                "{} {} {} {} {} {}",
                candle.open_time.format("%Y-%m-%d %H:%M"),
                candle.open,
                candle.high,
                candle.low,
                candle.close,
                candle.volume
            )
            .ok();
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use tradesmart_core::{OhlcvCandle, Price, Timeframe};

    fn sample_alert() -> Alert {
        Alert {
            symbol: "BTC/USD".to_string(),
            exchange: "BINANCE".to_string(),
            action: "buy".to_string(),
            price: Some(Price::new(dec!(100))),
            interval: "15".to_string(),
            message: "breakout".to_string(),
            secret: None,
            received_at: Utc::now(),
        }
    }

    fn candles(n: usize) -> Vec<OhlcvCandle> {
        (0..n)
            .map(|i| OhlcvCandle {
                open_time: Utc.with_ymd_and_hms(2024, 3, 1, 12, i as u32, 0).unwrap(),
                open: Price::new(dec!(100)),
                high: Price::new(dec!(101)),
                low: Price::new(dec!(99)),
                close: Price::new(dec!(100.5)),
                volume: 42,
            })
            .collect()
    }

    #[test]
    fn test_user_prompt_includes_alert_fields() {
        let prompt = user_prompt(&sample_alert(), &[], 30);
        assert!(prompt.contains("symbol: BTC/USD"));
        assert!(prompt.contains("action hint: buy"));
        assert!(prompt.contains("alert price: 100"));
    }

    #[test]
    fn test_table_capped_at_max_candles() {
        let data = vec![TimeframeData::new(Timeframe::Min1, candles(50))];
        let prompt = user_prompt(&sample_alert(), &data, 5);
        // Header line plus exactly 5 candle rows mention the shared volume
        assert_eq!(prompt.matches(" 42").count(), 5);
        assert!(prompt.contains("1min candles"));
    }
}

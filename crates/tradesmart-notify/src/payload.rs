//! Webhook payload shapes and card builders.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tradesmart_core::{Alert, ClosedPosition, Position, TradeDirection, Verdict, Wallet};

/// Free-text reasoning is truncated to this many characters.
const MAX_REASONING_CHARS: usize = 1000;

const COLOR_GREEN: u32 = 0x2ECC71;
const COLOR_RED: u32 = 0xE74C3C;
const COLOR_BLUE: u32 = 0x3498DB;

/// Top-level webhook body: `{username, embeds: […]}`.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    pub username: String,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    fn inline(name: &str, value: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            inline: true,
        }
    }

    fn block(name: &str, value: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            inline: false,
        }
    }
}

/// Truncate reasoning text to the card limit, appending an ellipsis.
pub fn truncate_reasoning(reasoning: &str) -> String {
    if reasoning.chars().count() <= MAX_REASONING_CHARS {
        return reasoning.to_string();
    }
    let mut out: String = reasoning.chars().take(MAX_REASONING_CHARS).collect();
    out.push('…');
    out
}

fn format_duration(duration: chrono::Duration) -> String {
    let total_secs = duration.num_seconds().max(0);
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

fn direction_color(direction: TradeDirection) -> u32 {
    match direction {
        TradeDirection::Long => COLOR_GREEN,
        TradeDirection::Short => COLOR_RED,
        TradeDirection::NoTrade => COLOR_BLUE,
    }
}

fn optional_price(value: Option<tradesmart_core::Price>) -> String {
    value.map(|p| p.to_string()).unwrap_or_else(|| "n/a".to_string())
}

fn wallet_stats_field(wallet: &Wallet) -> EmbedField {
    let win_rate = wallet
        .win_rate_pct()
        .map(|r| format!("{r:.1}%"))
        .unwrap_or_else(|| "n/a".to_string());
    EmbedField::block(
        "Stats",
        format!(
            "balance {} | trades {} | W/L {}/{} | win rate {} | realized PnL {}",
            wallet.available_balance,
            wallet.total_trades,
            wallet.winning_trades,
            wallet.losing_trades,
            win_rate,
            wallet.total_realized_pnl
        ),
    )
}

/// Card for an analyzed alert and its verdict.
pub fn alert_analyzed(username: &str, alert: &Alert, verdict: &Verdict) -> WebhookPayload {
    let embed = Embed {
        title: format!("Alert analyzed: {}", verdict.symbol),
        description: Some(truncate_reasoning(&verdict.reasoning)),
        color: direction_color(verdict.direction),
        fields: vec![
            EmbedField::inline("Direction", verdict.direction),
            EmbedField::inline("Confidence", format!("{:.0}", verdict.confidence)),
            EmbedField::inline("Entry", optional_price(verdict.entry_price)),
            EmbedField::inline("Stop-loss", optional_price(verdict.stop_loss)),
            EmbedField::inline("Take-profit", optional_price(verdict.take_profit)),
            EmbedField::inline(
                "R:R",
                verdict
                    .risk_reward_ratio
                    .clone()
                    .unwrap_or_else(|| "n/a".to_string()),
            ),
            EmbedField::inline("Exchange", &alert.exchange),
        ],
        timestamp: verdict.analyzed_at,
    };
    WebhookPayload {
        username: username.to_string(),
        embeds: vec![embed],
    }
}

/// Card for a freshly opened paper position.
pub fn position_opened(username: &str, position: &Position, wallet: &Wallet) -> WebhookPayload {
    let embed = Embed {
        title: format!(
            "Paper position opened: {} {}",
            position.direction, position.symbol
        ),
        description: Some(truncate_reasoning(&position.reasoning)),
        color: direction_color(position.direction),
        fields: vec![
            EmbedField::inline("Entry", position.entry_price),
            EmbedField::inline("Stop-loss", position.stop_loss),
            EmbedField::inline("Take-profit", position.take_profit),
            EmbedField::inline("Collateral", format!("{} USD", position.position_size_usd)),
            EmbedField::inline("Leverage", format!("{}x", position.leverage)),
            EmbedField::inline("Confidence", format!("{:.0}", position.confidence)),
            wallet_stats_field(wallet),
        ],
        timestamp: position.opened_at,
    };
    WebhookPayload {
        username: username.to_string(),
        embeds: vec![embed],
    }
}

/// Card for a settled position.
pub fn position_closed(username: &str, closed: &ClosedPosition, wallet: &Wallet) -> WebhookPayload {
    let color = if closed.realized_pnl >= rust_decimal::Decimal::ZERO {
        COLOR_GREEN
    } else {
        COLOR_RED
    };
    let embed = Embed {
        title: format!(
            "Paper position closed ({}): {} {}",
            closed.close_reason, closed.direction, closed.symbol
        ),
        description: None,
        color,
        fields: vec![
            EmbedField::inline("Entry", closed.entry_price),
            EmbedField::inline("Exit", closed.exit_price),
            EmbedField::inline("PnL", format!("{} USD", closed.realized_pnl)),
            EmbedField::inline("Held", format_duration(closed.holding_duration())),
            EmbedField::inline("Leverage", format!("{}x", closed.leverage)),
            wallet_stats_field(wallet),
        ],
        timestamp: closed.closed_at,
    };
    WebhookPayload {
        username: username.to_string(),
        embeds: vec![embed],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tradesmart_core::{CloseReason, Price};

    fn wallet() -> Wallet {
        Wallet::new(dec!(1000))
    }

    fn position() -> Position {
        Position {
            position_id: "p-1".to_string(),
            symbol: "BTC/USD".to_string(),
            direction: TradeDirection::Long,
            entry_price: Price::new(dec!(100)),
            position_size_usd: dec!(100),
            quantity: dec!(2),
            leverage: dec!(2),
            stop_loss: Price::new(dec!(95)),
            take_profit: Price::new(dec!(110)),
            confidence: 85.0,
            opened_at: Utc::now(),
            reasoning: "breakout".to_string(),
        }
    }

    #[test]
    fn test_truncate_reasoning_short_untouched() {
        assert_eq!(truncate_reasoning("fine"), "fine");
    }

    #[test]
    fn test_truncate_reasoning_long_gets_ellipsis() {
        let long = "x".repeat(1500);
        let out = truncate_reasoning(&long);
        assert_eq!(out.chars().count(), 1001);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn test_opened_card_has_levels_and_stats() {
        let payload = position_opened("TradeSmart", &position(), &wallet());
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["username"], "TradeSmart");
        let fields = json["embeds"][0]["fields"].as_array().unwrap();
        let names: Vec<_> = fields.iter().map(|f| f["name"].as_str().unwrap()).collect();
        assert!(names.contains(&"Stop-loss"));
        assert!(names.contains(&"Stats"));
    }

    #[test]
    fn test_closed_card_color_tracks_pnl_sign() {
        let closed = position().into_closed(
            Price::new(dec!(95)),
            dec!(-10),
            CloseReason::StopLoss,
            Utc::now(),
        );
        let payload = position_closed("TradeSmart", &closed, &wallet());
        assert_eq!(payload.embeds[0].color, COLOR_RED);
        assert!(payload.embeds[0].title.contains("StopLoss"));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(chrono::Duration::seconds(42)), "42s");
        assert_eq!(format_duration(chrono::Duration::seconds(125)), "2m 5s");
        assert_eq!(format_duration(chrono::Duration::seconds(7260)), "2h 1m");
    }
}

//! HTTP client for the LLM messages endpoint.

use crate::error::{OracleError, OracleResult};
use crate::parse::parse_verdict;
use crate::prompt::{user_prompt, SYSTEM_PROMPT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use tradesmart_core::{Alert, TimeframeData, Verdict};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Oracle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    pub base_url: String,
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Cap on candles rendered per timeframe table in the prompt.
    #[serde(default = "default_max_candles_per_timeframe")]
    pub max_candles_per_timeframe: usize,
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_candles_per_timeframe() -> usize {
    30
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: default_max_tokens(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
            max_candles_per_timeframe: default_max_candles_per_timeframe(),
        }
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// Client for the LLM verdict oracle.
#[derive(Clone)]
pub struct VerdictOracle {
    client: Client,
    config: OracleConfig,
}

impl VerdictOracle {
    pub fn new(config: OracleConfig) -> OracleResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OracleError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Submit the alert plus market data and parse the structured verdict.
    pub async fn analyze(
        &self,
        alert: &Alert,
        market_data: &[TimeframeData],
    ) -> OracleResult<Verdict> {
        let prompt = user_prompt(alert, market_data, self.config.max_candles_per_timeframe);
        debug!(
            symbol = %alert.symbol,
            timeframes = market_data.len(),
            prompt_chars = prompt.len(),
            "Submitting alert to oracle"
        );

        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system: SYSTEM_PROMPT,
            messages: vec![Message {
                role: "user",
                content: &prompt,
            }],
        };

        let url = format!("{}/v1/messages", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| OracleError::Transport(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Transport(format!("HTTP {status}: {body}")));
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Transport(format!("Failed to parse response: {e}")))?;

        let text = body
            .content
            .first()
            .map(|block| block.text.as_str())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(OracleError::Empty);
        }

        let verdict = parse_verdict(text)?;
        info!(
            symbol = %verdict.symbol,
            direction = %verdict.direction,
            confidence = verdict.confidence,
            "Oracle verdict parsed"
        );
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = MessagesRequest {
            model: "claude-sonnet-4-20250514",
            max_tokens: 1024,
            system: "sys",
            messages: vec![Message {
                role: "user",
                content: "hello",
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "claude-sonnet-4-20250514");
        assert_eq!(json["max_tokens"], 1024);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_response_first_block_text() {
        let body: MessagesResponse = serde_json::from_str(
            r#"{"id":"msg_1","content":[{"type":"text","text":"{}"},{"type":"text","text":"extra"}]}"#,
        )
        .unwrap();
        assert_eq!(body.content.first().unwrap().text, "{}");
    }

    #[test]
    fn test_response_without_content() {
        let body: MessagesResponse = serde_json::from_str(r#"{"id":"msg_1"}"#).unwrap();
        assert!(body.content.is_empty());
    }
}

//! Application configuration.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

use tradesmart_core::Timeframe;
use tradesmart_engine::PaperTradingConfig;
use tradesmart_notify::NotifierConfig;
use tradesmart_oracle::OracleConfig;
use tradesmart_quotes::QuoteConfig;

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// Multi-timeframe analysis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Timeframes fetched per alert, in vendor interval notation.
    #[serde(default = "default_timeframes")]
    pub timeframes: Vec<String>,
    /// Candles requested per timeframe.
    #[serde(default = "default_candles_per_timeframe")]
    pub candles_per_timeframe: u32,
}

fn default_timeframes() -> Vec<String> {
    Timeframe::LADDER
        .iter()
        .map(|tf| tf.vendor_interval().to_string())
        .collect()
}

fn default_candles_per_timeframe() -> u32 {
    50
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            timeframes: default_timeframes(),
            candles_per_timeframe: default_candles_per_timeframe(),
        }
    }
}

impl AnalysisConfig {
    /// Parse the configured interval strings; unknown intervals are a
    /// startup error.
    pub fn parsed_timeframes(&self) -> AppResult<Vec<Timeframe>> {
        self.timeframes
            .iter()
            .map(|s| {
                s.parse::<Timeframe>()
                    .map_err(|e| AppError::Config(e.to_string()))
            })
            .collect()
    }
}

/// Webhook ingress configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Shared secret. Absent or empty leaves the endpoint
    /// unauthenticated.
    #[serde(default)]
    pub secret: Option<String>,
}

impl WebhookConfig {
    pub fn effective_secret(&self) -> Option<&str> {
        self.secret.as_deref().filter(|s| !s.is_empty())
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub paper_trading: PaperTradingConfig,
    #[serde(default)]
    pub quotes: QuoteConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
}

impl AppConfig {
    /// Load configuration: explicit path > `TRADESMART_CONFIG` env var >
    /// `config/default.toml` > built-in defaults.
    pub fn load(path_override: Option<&str>) -> AppResult<Self> {
        let config_path = path_override
            .map(str::to_string)
            .or_else(|| std::env::var("TRADESMART_CONFIG").ok())
            .unwrap_or_else(|| "config/default.toml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            Self::from_file(&config_path)?
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Secrets may come from the environment instead of the file.
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("TRADESMART_QUOTE_API_KEY") {
            self.quotes.api_key = key;
        }
        if let Ok(key) = std::env::var("TRADESMART_ORACLE_API_KEY") {
            self.oracle.api_key = key;
        }
        if let Ok(secret) = std::env::var("TRADESMART_WEBHOOK_SECRET") {
            self.webhook.secret = Some(secret);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.analysis.timeframes.len(), 6);
        assert!(config.paper_trading.enabled);
        assert!(config.webhook.effective_secret().is_none());
    }

    #[test]
    fn test_parsed_timeframes_default_ladder() {
        let config = AnalysisConfig::default();
        let parsed = config.parsed_timeframes().unwrap();
        assert_eq!(parsed, Timeframe::LADDER.to_vec());
    }

    #[test]
    fn test_unknown_timeframe_is_config_error() {
        let config = AnalysisConfig {
            timeframes: vec!["1min".to_string(), "7min".to_string()],
            ..AnalysisConfig::default()
        };
        assert!(config.parsed_timeframes().is_err());
    }

    #[test]
    fn test_empty_secret_means_unauthenticated() {
        let webhook = WebhookConfig {
            secret: Some(String::new()),
        };
        assert!(webhook.effective_secret().is_none());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            bind_addr = "127.0.0.1:9000"

            [paper_trading]
            initial_balance = 5000
            max_concurrent_positions = 3

            [quotes]
            base_url = "https://vendor.example"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.paper_trading.max_concurrent_positions, 3);
        assert_eq!(config.quotes.base_url, "https://vendor.example");
        // Untouched sections keep defaults
        assert_eq!(config.analysis.candles_per_timeframe, 50);
    }
}

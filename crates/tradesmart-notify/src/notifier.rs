//! The notification sink.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use tradesmart_core::{Alert, ClosedPosition, Position, Verdict, Wallet};

use crate::payload::{self, WebhookPayload};

const POST_TIMEOUT: Duration = Duration::from_secs(10);

/// Notifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Webhook sink URL. Absent or empty disables notifications.
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "default_username")]
    pub username: String,
}

fn default_username() -> String {
    "TradeSmart".to_string()
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            username: default_username(),
        }
    }
}

/// Outcome of a notification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Sent,
    /// No sink configured, or the send failed and was swallowed.
    Skipped,
}

/// Fire-and-forget webhook notifier.
///
/// Every failure is logged at warn and swallowed: notification delivery
/// never propagates errors into analysis, trading or monitoring.
#[derive(Clone)]
pub struct Notifier {
    client: Client,
    config: NotifierConfig,
}

impl Notifier {
    pub fn new(config: NotifierConfig) -> Self {
        let client = match Client::builder().timeout(POST_TIMEOUT).build() {
            Ok(client) => client,
            Err(e) => {
                warn!(%e, "Failed to build notifier HTTP client, using default");
                Client::default()
            }
        };
        Self { client, config }
    }

    /// Notifier with no sink; every send reports `Skipped`.
    pub fn disabled() -> Self {
        Self::new(NotifierConfig::default())
    }

    pub fn on_alert_analyzed(&self, alert: &Alert, verdict: &Verdict) -> NotifySend {
        self.send(payload::alert_analyzed(&self.config.username, alert, verdict))
    }

    pub fn on_position_opened(&self, position: &Position, wallet: &Wallet) -> NotifySend {
        self.send(payload::position_opened(
            &self.config.username,
            position,
            wallet,
        ))
    }

    pub fn on_position_closed(&self, closed: &ClosedPosition, wallet: &Wallet) -> NotifySend {
        self.send(payload::position_closed(
            &self.config.username,
            closed,
            wallet,
        ))
    }

    fn send(&self, payload: WebhookPayload) -> NotifySend {
        NotifySend {
            client: self.client.clone(),
            url: self
                .config
                .webhook_url
                .clone()
                .filter(|u| !u.trim().is_empty()),
            payload,
        }
    }
}

/// A prepared send, detached from the notifier's lifetime so callers can
/// move it onto a background task.
pub struct NotifySend {
    client: Client,
    url: Option<String>,
    payload: WebhookPayload,
}

impl NotifySend {
    /// Post the payload. Never fails; the outcome says whether a send
    /// actually happened.
    pub async fn dispatch(self) -> NotifyOutcome {
        let Some(url) = self.url else {
            debug!("No notification sink configured, skipping");
            return NotifyOutcome::Skipped;
        };

        match self.client.post(&url).json(&self.payload).send().await {
            Ok(response) if response.status().is_success() => NotifyOutcome::Sent,
            Ok(response) => {
                warn!(status = %response.status(), "Notification sink rejected payload");
                NotifyOutcome::Skipped
            }
            Err(e) => {
                warn!(%e, "Notification delivery failed");
                NotifyOutcome::Skipped
            }
        }
    }
}

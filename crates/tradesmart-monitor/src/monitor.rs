//! The periodic stop-loss / take-profit monitor loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tradesmart_core::Position;
use tradesmart_engine::PaperEngine;
use tradesmart_notify::Notifier;

use crate::source::CandleSource;

/// Candles older than this many minutes get a "market likely closed"
/// warning.
const STALE_CANDLE_AGE_MINS: i64 = 5;

/// Periodic monitor over open paper positions.
///
/// Each tick snapshots the open set, pulls the latest candle per
/// position, and closes through the engine when the close price crosses
/// stop-loss or take-profit. Errors on one position are logged and do
/// not affect the others, nor subsequent ticks.
pub struct PositionMonitor<S: CandleSource> {
    engine: Arc<PaperEngine>,
    source: S,
    notifier: Arc<Notifier>,
    poll_interval: Duration,
    shutdown: CancellationToken,
}

impl<S: CandleSource> PositionMonitor<S> {
    pub fn new(
        engine: Arc<PaperEngine>,
        source: S,
        notifier: Arc<Notifier>,
        poll_interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            engine,
            source,
            notifier,
            poll_interval,
            shutdown,
        }
    }

    /// Run until the shutdown token fires. Cancellation interrupts an
    /// in-flight sleep promptly.
    pub async fn run(self) {
        info!(
            interval_secs = self.poll_interval.as_secs(),
            "Position monitor started"
        );

        let mut ticker = interval(self.poll_interval);
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Position monitor shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
            }
        }
    }

    /// One evaluation pass over the current open positions.
    pub async fn poll_once(&self) {
        let open_positions = self.engine.open_positions();
        if open_positions.is_empty() {
            debug!("No open positions to monitor");
            return;
        }

        debug!(count = open_positions.len(), "Evaluating open positions");
        for position in open_positions {
            self.evaluate_position(&position).await;
        }
    }

    async fn evaluate_position(&self, position: &Position) {
        let candle = match self.source.latest_candle(&position.symbol).await {
            Ok(Some(candle)) => candle,
            Ok(None) => {
                warn!(symbol = %position.symbol, "No candle returned, skipping this tick");
                return;
            }
            Err(e) => {
                warn!(symbol = %position.symbol, %e, "Candle fetch failed, skipping this tick");
                return;
            }
        };

        let age = candle.age_at(Utc::now());
        if age > chrono::Duration::minutes(STALE_CANDLE_AGE_MINS) {
            warn!(
                symbol = %position.symbol,
                age_mins = age.num_minutes(),
                "Latest candle is stale, market likely closed"
            );
        }

        let price = candle.close;
        let Some(reason) = position.exit_trigger(price) else {
            return;
        };

        match self.engine.close(&position.position_id, price, reason) {
            Ok(result) => {
                info!(
                    symbol = %result.closed.symbol,
                    price = %price,
                    reason = %reason,
                    pnl = %result.closed.realized_pnl,
                    "Exit triggered"
                );
                let send = self
                    .notifier
                    .on_position_closed(&result.closed, &result.wallet);
                tokio::spawn(send.dispatch());
            }
            Err(e) => {
                warn!(
                    position_id = %position.position_id,
                    %e,
                    "Close failed, will retry next tick"
                );
            }
        }
    }
}

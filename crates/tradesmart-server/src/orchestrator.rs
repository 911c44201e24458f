//! Analysis orchestration: normalize, fan out, ask the oracle, detach
//! side effects.
//!
//! The verdict is returned to the inbound caller before admission runs;
//! notification and admission are detached tasks whose failures cannot
//! touch the response.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{info, warn};

use tradesmart_core::{normalize_symbol, Alert, Timeframe, TimeframeData, Verdict};
use tradesmart_engine::AdmissionFilter;
use tradesmart_notify::Notifier;
use tradesmart_oracle::VerdictOracle;
use tradesmart_quotes::QuoteClient;

use crate::error::AnalysisError;

/// Drives one alert through normalization, market data collection, the
/// oracle, and the detached admission/notification branches.
pub struct AnalysisOrchestrator {
    quotes: QuoteClient,
    oracle: VerdictOracle,
    admission: Arc<AdmissionFilter>,
    notifier: Arc<Notifier>,
    timeframes: Vec<Timeframe>,
    candles_per_timeframe: u32,
}

impl AnalysisOrchestrator {
    pub fn new(
        quotes: QuoteClient,
        oracle: VerdictOracle,
        admission: Arc<AdmissionFilter>,
        notifier: Arc<Notifier>,
        timeframes: Vec<Timeframe>,
        candles_per_timeframe: u32,
    ) -> Self {
        Self {
            quotes,
            oracle,
            admission,
            notifier,
            timeframes,
            candles_per_timeframe,
        }
    }

    /// Analyze one alert and return its verdict.
    pub async fn analyze(&self, alert: Alert) -> Result<Verdict, AnalysisError> {
        if !alert.has_symbol() {
            return Err(AnalysisError::InvalidInput(
                "alert symbol must be non-empty".to_string(),
            ));
        }

        let canonical = normalize_symbol(&alert.symbol);
        info!(
            raw = %alert.symbol,
            symbol = %canonical,
            exchange = %alert.exchange,
            action = %alert.action,
            "Analyzing alert"
        );

        let market_data = self.collect_market_data(&canonical).await;
        if market_data.is_empty() {
            return Err(AnalysisError::NoMarketData);
        }

        let mut verdict = self.oracle.analyze(&alert, &market_data).await?;
        // The engine keys positions by the canonical vendor symbol
        verdict.symbol = canonical;

        self.detach_side_effects(&alert, &verdict);
        Ok(verdict)
    }

    /// Fetch all configured timeframes in parallel; failed timeframes
    /// are dropped with a warning.
    async fn collect_market_data(&self, symbol: &str) -> Vec<TimeframeData> {
        let mut tasks = JoinSet::new();
        for (index, timeframe) in self.timeframes.iter().copied().enumerate() {
            let quotes = self.quotes.clone();
            let symbol = symbol.to_string();
            let count = self.candles_per_timeframe;
            tasks.spawn(async move {
                let result = quotes.fetch_candles(&symbol, timeframe, count).await;
                (index, timeframe, result)
            });
        }

        let mut collected = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, timeframe, Ok(candles))) if !candles.is_empty() => {
                    collected.push((index, TimeframeData::new(timeframe, candles)));
                }
                Ok((_, timeframe, Ok(_))) => {
                    warn!(%timeframe, symbol, "Timeframe returned no candles, dropping");
                }
                Ok((_, timeframe, Err(e))) => {
                    warn!(%timeframe, symbol, %e, "Timeframe fetch failed, dropping");
                }
                Err(e) => {
                    warn!(symbol, %e, "Timeframe fetch task panicked, dropping");
                }
            }
        }

        // Ladder order for the prompt, regardless of completion order
        collected.sort_by_key(|(index, _)| *index);
        collected.into_iter().map(|(_, data)| data).collect()
    }

    /// Detach notification and admission so their outcome cannot affect
    /// the verdict already returned to the caller.
    fn detach_side_effects(&self, alert: &Alert, verdict: &Verdict) {
        let send = self.notifier.on_alert_analyzed(alert, verdict);
        tokio::spawn(send.dispatch());

        let admission = Arc::clone(&self.admission);
        let notifier = Arc::clone(&self.notifier);
        let verdict = verdict.clone();
        tokio::spawn(async move {
            let decision = admission.evaluate(verdict);
            match (&decision.position, &decision.rejection_reason) {
                (Some(position), _) => {
                    info!(
                        symbol = %position.symbol,
                        position_id = %position.position_id,
                        "Admission opened paper position"
                    );
                    // Wallet snapshot for the card reflects the open
                    let wallet = admission.engine().wallet();
                    let send = notifier.on_position_opened(position, &wallet);
                    send.dispatch().await;
                }
                (None, Some(reason)) => {
                    info!(symbol = %decision.verdict.symbol, %reason, "Admission rejected trade");
                }
                (None, None) => {}
            }
        });
    }
}

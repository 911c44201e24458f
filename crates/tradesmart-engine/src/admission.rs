//! Trade admission: the ordered risk gates between a verdict and the
//! engine.
//!
//! Gates run in a fixed order and the first failure short-circuits with
//! a rejection reason. Most candidate verdicts are expected to fail a
//! gate; opening is the exception, not the rule. The filter never
//! mutates state itself — the only mutation is the final
//! [`PaperEngine::open`] call, which revalidates under the engine mutex.

use std::sync::Arc;
use tracing::{debug, info};

use tradesmart_core::{base_symbol, Position, TradeDirection, Verdict};

use crate::engine::PaperEngine;

/// Outcome of evaluating one verdict against the admission gates.
#[derive(Debug, Clone)]
pub struct ExecutionDecision {
    pub opened: bool,
    pub position: Option<Position>,
    pub rejection_reason: Option<String>,
    pub verdict: Verdict,
}

impl ExecutionDecision {
    fn rejected(verdict: Verdict, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        debug!(symbol = %verdict.symbol, %reason, "Trade rejected");
        Self {
            opened: false,
            position: None,
            rejection_reason: Some(reason),
            verdict,
        }
    }
}

/// Applies the risk gates and hands passing verdicts to the engine.
pub struct AdmissionFilter {
    engine: Arc<PaperEngine>,
}

impl AdmissionFilter {
    pub fn new(engine: Arc<PaperEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &PaperEngine {
        &self.engine
    }

    /// Run the gates in order; open on pass.
    pub fn evaluate(&self, verdict: Verdict) -> ExecutionDecision {
        let config = self.engine.config();

        if !config.enabled {
            return ExecutionDecision::rejected(verdict, "paper trading disabled");
        }

        let base = base_symbol(&verdict.symbol).to_string();
        if !config.allows_base_symbol(&base) {
            return ExecutionDecision::rejected(
                verdict,
                format!("base symbol {base} not in allowed list"),
            );
        }

        if verdict.direction == TradeDirection::NoTrade {
            return ExecutionDecision::rejected(verdict, "oracle direction is NoTrade");
        }

        if verdict.confidence < config.confidence_threshold {
            let reason = format!(
                "confidence {} below threshold {}",
                verdict.confidence, config.confidence_threshold
            );
            return ExecutionDecision::rejected(verdict, reason);
        }

        if !verdict.has_price_levels() {
            return ExecutionDecision::rejected(
                verdict,
                "verdict is missing entry, stop-loss or take-profit",
            );
        }

        if !self.engine.can_open() {
            return ExecutionDecision::rejected(
                verdict,
                "engine at capacity or out of balance",
            );
        }

        if self.engine.has_open_for(&verdict.symbol) {
            let reason = format!("position already open for {}", verdict.symbol);
            return ExecutionDecision::rejected(verdict, reason);
        }

        match self.engine.open(&verdict) {
            Ok(position) => {
                info!(
                    symbol = %position.symbol,
                    position_id = %position.position_id,
                    confidence = verdict.confidence,
                    "Trade admitted and opened"
                );
                ExecutionDecision {
                    opened: true,
                    position: Some(position),
                    rejection_reason: None,
                    verdict,
                }
            }
            Err(e) => ExecutionDecision::rejected(verdict, e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PaperTradingConfig;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;
    use tradesmart_core::Price;
    use tradesmart_persistence::StateStore;

    fn filter_with(config: PaperTradingConfig) -> (AdmissionFilter, Arc<PaperEngine>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"), config.initial_balance);
        let engine = Arc::new(PaperEngine::new(config, store));
        (AdmissionFilter::new(engine.clone()), engine, dir)
    }

    fn filter() -> (AdmissionFilter, Arc<PaperEngine>, TempDir) {
        filter_with(PaperTradingConfig::default())
    }

    fn long_verdict() -> Verdict {
        Verdict {
            symbol: "BTC/USD".to_string(),
            direction: TradeDirection::Long,
            confidence: 85.0,
            entry_price: Some(Price::new(dec!(100))),
            stop_loss: Some(Price::new(dec!(95))),
            take_profit: Some(Price::new(dec!(110))),
            risk_reward_ratio: None,
            reasoning: "breakout".to_string(),
            analyzed_at: Utc::now(),
        }
    }

    #[test]
    fn test_admits_and_opens() {
        let (filter, engine, _dir) = filter();
        let decision = filter.evaluate(long_verdict());

        assert!(decision.opened);
        let position = decision.position.unwrap();
        assert_eq!(position.position_size_usd, dec!(100));
        assert_eq!(engine.wallet().total_trades, 1);
    }

    #[test]
    fn test_disabled_rejects_everything() {
        let (filter, engine, _dir) = filter_with(PaperTradingConfig {
            enabled: false,
            ..PaperTradingConfig::default()
        });
        let decision = filter.evaluate(long_verdict());

        assert!(!decision.opened);
        assert_eq!(
            decision.rejection_reason.as_deref(),
            Some("paper trading disabled")
        );
        assert_eq!(engine.wallet().total_trades, 0);
    }

    #[test]
    fn test_symbol_not_in_allow_list() {
        let (filter, _engine, _dir) = filter();
        let decision = filter.evaluate(Verdict {
            symbol: "DOGE/USD".to_string(),
            ..long_verdict()
        });

        assert!(!decision.opened);
        assert!(decision
            .rejection_reason
            .unwrap()
            .contains("not in allowed list"));
    }

    #[test]
    fn test_no_trade_rejected() {
        let (filter, _engine, _dir) = filter();
        let decision = filter.evaluate(Verdict {
            direction: TradeDirection::NoTrade,
            ..long_verdict()
        });

        assert!(!decision.opened);
        assert!(decision.rejection_reason.unwrap().contains("NoTrade"));
    }

    #[test]
    fn test_below_confidence_threshold() {
        let (filter, engine, _dir) = filter();
        let decision = filter.evaluate(Verdict {
            confidence: 70.0,
            ..long_verdict()
        });

        assert!(!decision.opened);
        assert!(decision
            .rejection_reason
            .unwrap()
            .contains("below threshold"));
        // No state change at all
        assert_eq!(engine.wallet().available_balance, dec!(1000));
    }

    #[test]
    fn test_missing_levels_rejected_before_engine() {
        let (filter, _engine, _dir) = filter();
        let decision = filter.evaluate(Verdict {
            stop_loss: None,
            ..long_verdict()
        });

        assert!(!decision.opened);
        assert!(decision.rejection_reason.unwrap().contains("missing"));
    }

    #[test]
    fn test_duplicate_symbol_rejected() {
        let (filter, engine, _dir) = filter();
        assert!(filter.evaluate(long_verdict()).opened);

        let decision = filter.evaluate(long_verdict());
        assert!(!decision.opened);
        assert!(decision.rejection_reason.unwrap().contains("already open"));
        assert_eq!(engine.wallet().available_balance, dec!(900));
    }

    #[test]
    fn test_capacity_gate() {
        let (filter, _engine, _dir) = filter_with(PaperTradingConfig {
            max_concurrent_positions: 1,
            ..PaperTradingConfig::default()
        });
        assert!(filter.evaluate(long_verdict()).opened);

        let decision = filter.evaluate(Verdict {
            symbol: "XAU/USD".to_string(),
            ..long_verdict()
        });
        assert!(!decision.opened);
        assert!(decision.rejection_reason.unwrap().contains("capacity"));
    }

    #[test]
    fn test_gate_order_disabled_wins_over_bad_symbol() {
        let (filter, _engine, _dir) = filter_with(PaperTradingConfig {
            enabled: false,
            ..PaperTradingConfig::default()
        });
        let decision = filter.evaluate(Verdict {
            symbol: "DOGE/USD".to_string(),
            direction: TradeDirection::NoTrade,
            ..long_verdict()
        });
        assert_eq!(
            decision.rejection_reason.as_deref(),
            Some("paper trading disabled")
        );
    }
}

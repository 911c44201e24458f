//! The paper trading engine: single owner of wallet and position state.
//!
//! Every mutation acquires the engine mutex, validates, commits the new
//! immutable values in memory, and persists the full state before
//! releasing. The persisted file is therefore always a prefix of the
//! states observers have seen. A failed save is logged and NOT rolled
//! back: the in-memory state stays canonical for the process and the
//! next successful save carries it.

use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{error, info, warn};
use uuid::Uuid;

use tradesmart_core::{
    CloseReason, ClosedPosition, EngineState, Position, Price, TradeDirection, Verdict, Wallet,
};
use tradesmart_persistence::StateStore;

use crate::config::PaperTradingConfig;
use crate::error::{TradeError, TradeResult};

/// Result of closing a position: the settled copy plus the new wallet.
#[derive(Debug, Clone, PartialEq)]
pub struct CloseResult {
    pub closed: ClosedPosition,
    pub wallet: Wallet,
}

/// Process-wide paper trading engine.
///
/// State loads lazily on the first mutation or snapshot, under the same
/// mutex as mutations, so a process that never trades never touches the
/// state file.
pub struct PaperEngine {
    config: PaperTradingConfig,
    store: StateStore,
    state: Mutex<Option<EngineState>>,
}

impl PaperEngine {
    pub fn new(config: PaperTradingConfig, store: StateStore) -> Self {
        Self {
            config,
            store,
            state: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &PaperTradingConfig {
        &self.config
    }

    /// Open a paper position for an admitted verdict.
    ///
    /// Validation order: direction, price levels, capacity, duplicate
    /// symbol, sizing. A stop-loss further from entry than the
    /// configured cap is replaced with the boundary on the correct side.
    pub fn open(&self, verdict: &Verdict) -> TradeResult<Position> {
        let mut guard = self.state.lock();
        let state = Self::loaded(&mut guard, &self.store, &self.config);

        let direction = verdict.direction;
        if !direction.is_tradeable() {
            return Err(TradeError::InvalidTradeParams(format!(
                "direction {direction} cannot open a position"
            )));
        }
        let (entry, stop_loss, take_profit) = match (
            verdict.entry_price,
            verdict.stop_loss,
            verdict.take_profit,
        ) {
            (Some(e), Some(sl), Some(tp)) => (e, sl, tp),
            _ => {
                return Err(TradeError::InvalidTradeParams(
                    "entry, stop-loss and take-profit are all required".to_string(),
                ))
            }
        };
        if !entry.is_positive() {
            return Err(TradeError::InvalidTradeParams(format!(
                "entry price {entry} must be positive"
            )));
        }

        if state.open_positions.len() >= self.config.max_concurrent_positions {
            return Err(TradeError::PositionLimitReached(
                self.config.max_concurrent_positions,
            ));
        }
        if state.open_position_for(&verdict.symbol).is_some() {
            return Err(TradeError::DuplicateSymbol(verdict.symbol.clone()));
        }

        let size_usd = state.wallet.available_balance * self.config.max_position_size_percent;
        if size_usd <= Decimal::ZERO {
            return Err(TradeError::InsufficientBalance);
        }

        let stop_loss = self.cap_stop_loss(&verdict.symbol, direction, entry, stop_loss);

        // Levels must sit on the correct side of entry once capped
        let sides_ok = match direction {
            TradeDirection::Long => stop_loss < entry && entry < take_profit,
            TradeDirection::Short => take_profit < entry && entry < stop_loss,
            TradeDirection::NoTrade => false,
        };
        if !sides_ok {
            return Err(TradeError::InvalidTradeParams(format!(
                "levels out of order for {direction}: sl={stop_loss} entry={entry} tp={take_profit}"
            )));
        }

        let quantity = size_usd * self.config.leverage / entry.inner();
        let position = Position {
            position_id: Uuid::new_v4().to_string(),
            symbol: verdict.symbol.clone(),
            direction,
            entry_price: entry,
            position_size_usd: size_usd,
            quantity,
            leverage: self.config.leverage,
            stop_loss,
            take_profit,
            confidence: verdict.confidence,
            opened_at: Utc::now(),
            reasoning: verdict.reasoning.clone(),
        };

        state.open_positions.push(position.clone());
        state.wallet = state.wallet.with_open(size_usd);
        state.last_updated_at = Utc::now();
        self.persist(state);

        info!(
            position_id = %position.position_id,
            symbol = %position.symbol,
            direction = %position.direction,
            entry = %position.entry_price,
            size_usd = %position.position_size_usd,
            leverage = %position.leverage,
            "Opened paper position"
        );
        Ok(position)
    }

    /// Close an open position at the given exit price.
    pub fn close(
        &self,
        position_id: &str,
        exit_price: Price,
        reason: CloseReason,
    ) -> TradeResult<CloseResult> {
        let mut guard = self.state.lock();
        let state = Self::loaded(&mut guard, &self.store, &self.config);

        let index = state
            .open_positions
            .iter()
            .position(|p| p.position_id.eq_ignore_ascii_case(position_id))
            .ok_or_else(|| TradeError::PositionNotFound(position_id.to_string()))?;

        let position = state.open_positions.remove(index);
        let pnl = position.pnl_at(exit_price);
        let size_usd = position.position_size_usd;
        let closed = position.into_closed(exit_price, pnl, reason, Utc::now());

        state.closed_positions.push(closed.clone());
        state.wallet = state.wallet.with_close(size_usd, pnl);
        state.last_updated_at = Utc::now();
        let wallet = state.wallet.clone();
        self.persist(state);

        info!(
            position_id = %closed.position_id,
            symbol = %closed.symbol,
            exit = %closed.exit_price,
            pnl = %closed.realized_pnl,
            reason = %closed.close_reason,
            available = %wallet.available_balance,
            "Closed paper position"
        );
        Ok(CloseResult { closed, wallet })
    }

    /// Advisory: capacity and balance allow another open.
    ///
    /// A hint only; the authoritative check reruns inside [`Self::open`].
    pub fn can_open(&self) -> bool {
        let mut guard = self.state.lock();
        let state = Self::loaded(&mut guard, &self.store, &self.config);
        state.open_positions.len() < self.config.max_concurrent_positions
            && state.wallet.available_balance > Decimal::ZERO
    }

    /// Advisory: an open position exists for the symbol (case-insensitive).
    pub fn has_open_for(&self, symbol: &str) -> bool {
        let mut guard = self.state.lock();
        let state = Self::loaded(&mut guard, &self.store, &self.config);
        state.open_position_for(symbol).is_some()
    }

    pub fn wallet(&self) -> Wallet {
        let mut guard = self.state.lock();
        Self::loaded(&mut guard, &self.store, &self.config)
            .wallet
            .clone()
    }

    pub fn open_positions(&self) -> Vec<Position> {
        let mut guard = self.state.lock();
        Self::loaded(&mut guard, &self.store, &self.config)
            .open_positions
            .clone()
    }

    pub fn closed_positions(&self) -> Vec<ClosedPosition> {
        let mut guard = self.state.lock();
        Self::loaded(&mut guard, &self.store, &self.config)
            .closed_positions
            .clone()
    }

    /// Defensive copy of the full state.
    pub fn state_snapshot(&self) -> EngineState {
        let mut guard = self.state.lock();
        Self::loaded(&mut guard, &self.store, &self.config).clone()
    }

    /// Lazy-init under the mutex: first access loads from the store.
    fn loaded<'a>(
        guard: &'a mut Option<EngineState>,
        store: &StateStore,
        config: &PaperTradingConfig,
    ) -> &'a mut EngineState {
        guard.get_or_insert_with(|| match store.load() {
            Ok(state) => state,
            Err(e) => {
                error!(%e, "Failed to load engine state, starting fresh");
                EngineState::new(config.initial_balance)
            }
        })
    }

    /// Pull a too-wide stop-loss in to the configured boundary.
    fn cap_stop_loss(
        &self,
        symbol: &str,
        direction: TradeDirection,
        entry: Price,
        stop_loss: Price,
    ) -> Price {
        let cap = self.config.max_stop_loss_percent;
        let distance = stop_loss
            .relative_distance_from(entry)
            .unwrap_or(Decimal::ZERO);
        if distance <= cap {
            return stop_loss;
        }

        let capped = match direction {
            TradeDirection::Short => entry * (Decimal::ONE + cap),
            _ => entry * (Decimal::ONE - cap),
        };
        warn!(
            symbol,
            %direction,
            requested = %stop_loss,
            capped = %capped,
            cap_pct = %cap,
            "Stop-loss wider than cap, replacing with boundary"
        );
        capped
    }

    /// Persist inside the critical section. Errors are logged, never
    /// reverted; in-memory state remains canonical for the process.
    fn persist(&self, state: &EngineState) {
        if let Err(e) = self.store.save(state) {
            error!(%e, path = %self.store.path().display(), "Failed to persist engine state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn engine_with(config: PaperTradingConfig) -> (PaperEngine, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"), config.initial_balance);
        (PaperEngine::new(config, store), dir)
    }

    fn engine() -> (PaperEngine, TempDir) {
        engine_with(PaperTradingConfig::default())
    }

    fn long_verdict() -> Verdict {
        Verdict {
            symbol: "BTC/USD".to_string(),
            direction: TradeDirection::Long,
            confidence: 85.0,
            entry_price: Some(Price::new(dec!(100))),
            stop_loss: Some(Price::new(dec!(95))),
            take_profit: Some(Price::new(dec!(110))),
            risk_reward_ratio: Some("1:2".to_string()),
            reasoning: "breakout".to_string(),
            analyzed_at: Utc::now(),
        }
    }

    #[test]
    fn test_happy_path_open() {
        let (engine, _dir) = engine();
        let position = engine.open(&long_verdict()).unwrap();

        assert_eq!(position.position_size_usd, dec!(100));
        assert_eq!(position.quantity, dec!(2));
        assert_eq!(position.stop_loss, Price::new(dec!(95)));

        let wallet = engine.wallet();
        assert_eq!(wallet.available_balance, dec!(900));
        assert_eq!(wallet.total_trades, 1);
    }

    #[test]
    fn test_open_rejects_no_trade_direction() {
        let (engine, _dir) = engine();
        let verdict = Verdict {
            direction: TradeDirection::NoTrade,
            ..long_verdict()
        };
        assert!(matches!(
            engine.open(&verdict),
            Err(TradeError::InvalidTradeParams(_))
        ));
    }

    #[test]
    fn test_open_rejects_missing_levels() {
        let (engine, _dir) = engine();
        let verdict = Verdict {
            take_profit: None,
            ..long_verdict()
        };
        assert!(matches!(
            engine.open(&verdict),
            Err(TradeError::InvalidTradeParams(_))
        ));
    }

    #[test]
    fn test_stop_loss_capped_at_boundary() {
        let (engine, _dir) = engine();
        let verdict = Verdict {
            stop_loss: Some(Price::new(dec!(50))),
            take_profit: Some(Price::new(dec!(120))),
            ..long_verdict()
        };
        let position = engine.open(&verdict).unwrap();
        // 50% distance capped to 20%: 100 * (1 - 0.20) = 80
        assert_eq!(position.stop_loss, Price::new(dec!(80.00)));
    }

    #[test]
    fn test_stop_loss_at_cap_boundary_kept() {
        let (engine, _dir) = engine();
        let verdict = Verdict {
            stop_loss: Some(Price::new(dec!(80))),
            take_profit: Some(Price::new(dec!(120))),
            ..long_verdict()
        };
        let position = engine.open(&verdict).unwrap();
        assert_eq!(position.stop_loss, Price::new(dec!(80)));
    }

    #[test]
    fn test_short_stop_loss_capped_above_entry() {
        let (engine, _dir) = engine();
        let verdict = Verdict {
            direction: TradeDirection::Short,
            stop_loss: Some(Price::new(dec!(150))),
            take_profit: Some(Price::new(dec!(90))),
            ..long_verdict()
        };
        let position = engine.open(&verdict).unwrap();
        // 100 * (1 + 0.20) = 120
        assert_eq!(position.stop_loss, Price::new(dec!(120.00)));
    }

    #[test]
    fn test_duplicate_symbol_rejected() {
        let (engine, _dir) = engine();
        engine.open(&long_verdict()).unwrap();

        let verdict = Verdict {
            symbol: "btc/usd".to_string(),
            ..long_verdict()
        };
        assert_eq!(
            engine.open(&verdict),
            Err(TradeError::DuplicateSymbol("btc/usd".to_string()))
        );
        assert_eq!(engine.wallet().available_balance, dec!(900));
    }

    #[test]
    fn test_position_limit_reached() {
        let (engine, _dir) = engine();
        engine.open(&long_verdict()).unwrap();
        engine
            .open(&Verdict {
                symbol: "XAU/USD".to_string(),
                ..long_verdict()
            })
            .unwrap();

        let third = Verdict {
            symbol: "XAG/USD".to_string(),
            ..long_verdict()
        };
        assert_eq!(engine.open(&third), Err(TradeError::PositionLimitReached(2)));
    }

    #[test]
    fn test_insufficient_balance() {
        let (engine, _dir) = engine_with(PaperTradingConfig {
            initial_balance: Decimal::ZERO,
            ..PaperTradingConfig::default()
        });
        assert_eq!(
            engine.open(&long_verdict()),
            Err(TradeError::InsufficientBalance)
        );
    }

    #[test]
    fn test_close_take_profit() {
        let (engine, _dir) = engine();
        let position = engine.open(&long_verdict()).unwrap();

        let result = engine
            .close(
                &position.position_id,
                Price::new(dec!(110)),
                CloseReason::TakeProfit,
            )
            .unwrap();

        // (110 - 100) / 100 * 100 * 2 = 20
        assert_eq!(result.closed.realized_pnl, dec!(20));
        assert_eq!(result.wallet.available_balance, dec!(1020));
        assert_eq!(result.wallet.winning_trades, 1);
        assert_eq!(result.wallet.total_realized_pnl, dec!(20));
        assert!(engine.open_positions().is_empty());
        assert_eq!(engine.closed_positions().len(), 1);
    }

    #[test]
    fn test_close_stop_loss_counts_loss() {
        let (engine, _dir) = engine();
        let position = engine.open(&long_verdict()).unwrap();

        let result = engine
            .close(
                &position.position_id,
                Price::new(dec!(95)),
                CloseReason::StopLoss,
            )
            .unwrap();

        // (95 - 100) / 100 * 100 * 2 = -10
        assert_eq!(result.closed.realized_pnl, dec!(-10));
        assert_eq!(result.wallet.available_balance, dec!(990));
        assert_eq!(result.wallet.losing_trades, 1);
    }

    #[test]
    fn test_close_unknown_position() {
        let (engine, _dir) = engine();
        assert_eq!(
            engine.close("nope", Price::new(dec!(1)), CloseReason::Manual),
            Err(TradeError::PositionNotFound("nope".to_string()))
        );
    }

    #[test]
    fn test_close_position_id_case_insensitive() {
        let (engine, _dir) = engine();
        let position = engine.open(&long_verdict()).unwrap();
        let upper = position.position_id.to_ascii_uppercase();
        assert!(engine
            .close(&upper, Price::new(dec!(101)), CloseReason::Manual)
            .is_ok());
    }

    #[test]
    fn test_advisory_reads() {
        let (engine, _dir) = engine();
        assert!(engine.can_open());
        assert!(!engine.has_open_for("BTC/USD"));

        engine.open(&long_verdict()).unwrap();
        assert!(engine.has_open_for("btc/usd"));
    }

    #[test]
    fn test_snapshot_is_defensive_copy() {
        let (engine, _dir) = engine();
        engine.open(&long_verdict()).unwrap();

        let mut snapshot = engine.state_snapshot();
        snapshot.open_positions.clear();
        assert_eq!(engine.open_positions().len(), 1);
    }

    #[test]
    fn test_read_only_snapshots_idempotent() {
        let (engine, _dir) = engine();
        engine.open(&long_verdict()).unwrap();
        assert_eq!(engine.state_snapshot(), engine.state_snapshot());
    }

    #[test]
    fn test_invariants_over_operation_sequence() {
        let (engine, _dir) = engine();
        let symbols = ["BTC/USD", "XAU/USD", "XAG/USD", "XPT/USD"];

        for (i, symbol) in symbols.iter().cycle().take(12).enumerate() {
            let verdict = Verdict {
                symbol: symbol.to_string(),
                ..long_verdict()
            };
            let opened = engine.open(&verdict);

            let state = engine.state_snapshot();
            assert!(state.wallet.available_balance >= Decimal::ZERO);
            assert!(state.open_positions.len() <= 2);

            // No duplicate open symbols
            for (a, b) in state
                .open_positions
                .iter()
                .zip(state.open_positions.iter().skip(1))
            {
                assert!(!a.is_for_symbol(&b.symbol));
            }

            // Stop distance within cap for every admitted open
            if let Ok(p) = &opened {
                let distance = p
                    .stop_loss
                    .relative_distance_from(p.entry_price)
                    .unwrap();
                assert!(distance <= dec!(0.20));
            }

            // Close every other admitted position to keep churn going
            if let Ok(p) = opened {
                if i % 2 == 0 {
                    engine
                        .close(&p.position_id, Price::new(dec!(104)), CloseReason::Manual)
                        .unwrap();
                }
            }

            let state = engine.state_snapshot();
            let closed_pnl: Decimal = state
                .closed_positions
                .iter()
                .map(|c| c.realized_pnl)
                .sum();
            assert_eq!(state.wallet.total_realized_pnl, closed_pnl);
            assert_eq!(
                state.wallet.winning_trades + state.wallet.losing_trades,
                state.closed_positions.len() as u64
            );
            assert_eq!(
                state.wallet.total_trades,
                (state.open_positions.len() + state.closed_positions.len()) as u64
            );
        }
    }
}

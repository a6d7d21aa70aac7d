//! Exit manager: per-position evaluation cycle run on every price update
//! or scheduled tick. Grounded on the source's `exit_manager.py` five-step
//! sequence — self-heal, stop-order health, trailing update, priority-
//! ordered exit evaluation, and fee-aware execution.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{error, warn};

use crate::config::core::CoreConfig;
use crate::engine::executor::{Executor, PortfolioManager, PositionPersistence, StopOrderManager};
use crate::events::MarketEventBus;
use crate::intelligence::IntelligenceLayer;
use crate::risk::DailyStopTracker;
use crate::sync::SyncStatus;
use crate::types::event::{OrderEvent, OrderEventKind};
use crate::types::{LiveIndicators, MLScore, MarketEvent, OrderRequest, Position, Side, Symbol};

/// Why a position was closed, in evaluation priority order. Earlier
/// variants always win a tie — `evaluate` returns the first that applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Stop,
    Tp1Partial,
    Tp2Full,
    ThesisInvalid,
    WeakConfidence,
    TimeStop,
    TimeStopExtended,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::Stop => "stop",
            ExitReason::Tp1Partial => "tp1",
            ExitReason::Tp2Full => "tp2",
            ExitReason::ThesisInvalid => "thesis_invalid",
            ExitReason::WeakConfidence => "weak_confidence",
            ExitReason::TimeStop => "time_stop",
            ExitReason::TimeStopExtended => "time_stop_extended",
        }
    }

    fn is_partial(&self) -> bool {
        matches!(self, ExitReason::Tp1Partial)
    }
}

pub struct ExitManager {
    portfolio: Arc<dyn PortfolioManager>,
    executor: Arc<dyn Executor>,
    stop_mgr: Arc<dyn StopOrderManager>,
    persistence: Arc<dyn PositionPersistence>,
    intelligence: Arc<tokio::sync::Mutex<IntelligenceLayer>>,
    sync_status: SyncStatus,
    config: Arc<CoreConfig>,
    event_bus: Arc<MarketEventBus>,
    daily_stop: Arc<DailyStopTracker>,
    trading_mode_live: bool,
}

const BREAKEVEN_EPSILON_PCT: Decimal = dec!(0.001);

impl ExitManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        portfolio: Arc<dyn PortfolioManager>,
        executor: Arc<dyn Executor>,
        stop_mgr: Arc<dyn StopOrderManager>,
        persistence: Arc<dyn PositionPersistence>,
        intelligence: Arc<tokio::sync::Mutex<IntelligenceLayer>>,
        sync_status: SyncStatus,
        config: Arc<CoreConfig>,
        event_bus: Arc<MarketEventBus>,
        daily_stop: Arc<DailyStopTracker>,
        trading_mode_live: bool,
    ) -> Self {
        Self {
            portfolio,
            executor,
            stop_mgr,
            persistence,
            intelligence,
            sync_status,
            config,
            event_bus,
            daily_stop,
            trading_mode_live,
        }
    }

    /// Runs the full per-position cycle for every currently-open position
    /// whose symbol has a known mark price. Positions with no current
    /// price are skipped this cycle rather than evaluated against stale
    /// data.
    pub async fn run_cycle(&self, prices: &std::collections::HashMap<Symbol, Decimal>) {
        for position in self.portfolio.positions_snapshot().await {
            if !position.is_open() {
                continue;
            }
            let Some(&price) = prices.get(&position.symbol) else { continue };
            if let Err(e) = self.evaluate_one(position, price).await {
                error!(error = %e, "exit cycle failed for a position");
            }
        }
    }

    async fn evaluate_one(&self, mut position: Position, price: Decimal) -> anyhow::Result<()> {
        self.self_heal(&mut position, price);

        if self.trading_mode_live {
            self.check_stop_health(&mut position).await;
        }

        self.update_trailing(&mut position, price).await;
        self.update_confidence(&mut position).await;

        let (indicators, ml) = {
            let intel = self.intelligence.lock().await;
            (intel.live_indicators(&position.symbol), intel.live_ml(&position.symbol).cloned())
        };

        if let Some(reason) = self.evaluate_exit(&position, price, indicators.as_ref(), ml.as_ref()) {
            self.execute_exit(position, price, reason).await?;
        } else {
            self.portfolio.upsert_position(position).await;
        }

        Ok(())
    }

    /// Step 1: repairs obviously-corrupt state using the current price
    /// and the configured fixed geometry rather than refusing to manage
    /// the position at all.
    fn self_heal(&self, position: &mut Position, price: Decimal) {
        if position.entry_price <= Decimal::ZERO {
            warn!(symbol = %position.symbol, "self-healing corrupt entry price");
            position.entry_price = price;
            position.peak_price = price;
        }
        if position.stop_price <= Decimal::ZERO || position.stop_price >= position.entry_price {
            position.stop_price = position.entry_price * (Decimal::ONE - self.config.fixed_stop_pct / Decimal::from(100));
        }
        if position.tp1_price <= position.entry_price {
            position.tp1_price = position.entry_price * (Decimal::ONE + self.config.tp1_pct / Decimal::from(100));
        }
        if position.tp2_price <= position.tp1_price {
            position.tp2_price = position.entry_price * (Decimal::ONE + self.config.tp2_pct / Decimal::from(100));
        }
    }

    /// Step 2 (live only): re-arms the protective stop if it has gone
    /// unchecked longer than the configured interval and no active stop
    /// order exists on the exchange for this symbol.
    async fn check_stop_health(&self, position: &mut Position) {
        let Some(order_id) = position.stop_order_id.clone() else {
            warn!(symbol = %position.symbol, "no stop order on record, re-arming");
            self.rearm_stop(position).await;
            return;
        };

        match self.stop_mgr.stop_status(&position.symbol, &order_id).await {
            Ok(order) if !order.status.is_active() => {
                warn!(symbol = %position.symbol, "protective stop no longer active, re-arming");
                self.rearm_stop(position).await;
            }
            Ok(_) => {}
            Err(e) => {
                error!(symbol = %position.symbol, error = %e, "stop-order health check failed");
            }
        }
    }

    async fn rearm_stop(&self, position: &mut Position) {
        match self.stop_mgr.place_stop(&position.symbol, Side::Sell, position.size_qty, position.effective_stop()).await {
            Ok(order) => position.stop_order_id = Some(order.client_id),
            Err(e) => error!(symbol = %position.symbol, error = %e, "critical: failed to re-arm protective stop"),
        }
    }

    /// Step 3: ratchets the trailing stop and flips to breakeven-plus-
    /// epsilon once the position has moved far enough into profit.
    /// risk_off tightens both triggers per the regime-aware sizing note.
    async fn update_trailing(&self, position: &mut Position, price: Decimal) {
        position.update_peak(price);
        let pnl_pct = position.unrealized_pnl_pct(price) / Decimal::from(100);

        let risk_off = {
            let intel = self.intelligence.lock().await;
            matches!(intel.regime_snapshot().regime, crate::types::Regime::RiskOff)
        };

        let trail_start = self.config.trail_start_pct_for_regime(risk_off) / Decimal::from(100);
        let trail_lock = self.config.trail_lock_pct_for_regime(risk_off);
        let be_trigger = if risk_off { Decimal::ZERO } else { self.config.trail_be_trigger_pct / Decimal::from(100) };

        if pnl_pct >= trail_start {
            let candidate = position.entry_price * (Decimal::ONE + pnl_pct * trail_lock);
            let current = position.trailing_stop.unwrap_or(position.stop_price);
            if candidate > current {
                position.trailing_stop = Some(candidate);
            }
        }

        if pnl_pct >= be_trigger {
            let breakeven = position.entry_price * (Decimal::ONE + BREAKEVEN_EPSILON_PCT);
            let current = position.trailing_stop.unwrap_or(position.stop_price);
            if breakeven > current {
                position.trailing_stop = Some(breakeven);
            }
        }
    }

    /// Re-scores the position from the latest ML signal and PnL drift so
    /// `confidence_trend` reflects current market state, not just entry.
    async fn update_confidence(&self, position: &mut Position) {
        let intel = self.intelligence.lock().await;
        let ml = intel.live_ml(&position.symbol);
        let pnl_pct = position.unrealized_pnl_pct(position.peak_price);
        let mut score = position.last_confidence;
        if let Some(ml) = ml {
            score += ml.raw_score * Decimal::from(10);
        }
        score += (pnl_pct / Decimal::from(4)).clamp(dec!(-10), dec!(10));
        drop(intel);
        position.record_confidence(score.clamp(Decimal::ZERO, Decimal::from(100)));
    }

    /// Step 4: evaluates exit conditions in fixed priority order and
    /// returns the first that applies, or `None` to keep holding.
    fn evaluate_exit(
        &self,
        position: &Position,
        price: Decimal,
        indicators: Option<&LiveIndicators>,
        ml: Option<&MLScore>,
    ) -> Option<ExitReason> {
        if price <= position.effective_stop() {
            return Some(ExitReason::Stop);
        }

        if !position.partial_closed && price >= position.tp1_price {
            return Some(ExitReason::Tp1Partial);
        }

        if price >= position.tp2_price {
            return Some(ExitReason::Tp2Full);
        }

        let pnl_pct = position.unrealized_pnl_pct(price);
        if pnl_pct < Decimal::ZERO {
            let tolerance_mult = if position.unverified { dec!(2) } else { Decimal::ONE };
            let below_recovered_floor = !position.unverified || pnl_pct <= dec!(-2);
            if below_recovered_floor && self.thesis_invalid(position, pnl_pct, tolerance_mult, indicators, ml) {
                return Some(ExitReason::ThesisInvalid);
            }
        }

        if position.last_confidence < self.config.weak_confidence_threshold && pnl_pct < self.config.weak_confidence_pnl_pct {
            return Some(ExitReason::WeakConfidence);
        }

        let held_min = position.holding_minutes();
        if held_min >= self.config.time_stop_extended_min as i64 {
            return Some(ExitReason::TimeStopExtended);
        }
        if held_min >= self.config.time_stop_min as i64 && pnl_pct > dec!(-0.5) {
            return Some(ExitReason::TimeStop);
        }

        None
    }

    /// thesis_invalid fires only while losing, on any of: a 5m trend flip,
    /// choppy-and-losing beyond tolerance (suppressed near daily/weekly
    /// support), a high-confidence bearish ML read, or price stretched
    /// below VWAP. Recovered/unverified positions get `tolerance_mult`
    /// slack (and never trigger below their floor, enforced by the caller).
    fn thesis_invalid(
        &self,
        position: &Position,
        pnl_pct: Decimal,
        tolerance_mult: Decimal,
        indicators: Option<&LiveIndicators>,
        ml: Option<&MLScore>,
    ) -> bool {
        if let Some(trend_5m) = indicators.and_then(|i| i.trend_5m) {
            if trend_5m <= self.config.thesis_trend_5m_flip_pct * tolerance_mult {
                return true;
            }
        }

        let choppy_losing_threshold = self.config.thesis_choppy_loss_pct * tolerance_mult;
        if pnl_pct <= choppy_losing_threshold && position.confidence_trend() == crate::types::ConfidenceTrend::Fading {
            let near_support = indicators.is_some_and(|i| {
                i.daily_range_position.is_some_and(|p| p < self.config.thesis_near_daily_support)
                    || i.weekly_range_position.is_some_and(|p| p < self.config.thesis_near_weekly_support)
            });
            if !near_support {
                return true;
            }
        }

        if let Some(ml) = ml {
            if ml.raw_score < Decimal::ZERO
                && ml.confidence > self.config.thesis_ml_bearish_confidence
                && pnl_pct < self.config.thesis_ml_bearish_pnl_pct
            {
                return true;
            }
        }

        if let Some(vwap_distance) = indicators.and_then(|i| i.vwap_distance_pct) {
            if vwap_distance <= self.config.thesis_vwap_below_pct * tolerance_mult {
                return true;
            }
        }

        false
    }

    /// Step 5: executes the exit determined above. Partial closes are
    /// tp1 only; everything else closes the full remaining quantity.
    async fn execute_exit(&self, mut position: Position, price: Decimal, reason: ExitReason) -> anyhow::Result<()> {
        let close_qty = if reason.is_partial() { position.size_qty * self.config.tp1_partial_pct } else { position.size_qty };

        let request = OrderRequest::market(position.symbol.clone(), Side::Sell, close_qty);
        let order = self.executor.place_order(request).await?;
        let exit_fill_price = order.average_fill_price().unwrap_or(price);
        // Exits always close at market (taker); entries may be limit (maker)
        // in a future revision, so the two fee legs are kept distinct.
        let entry_fee = position.entry_cost_usd * dec!(0.001);
        let exit_fee = order.filled_value * dec!(0.001);
        let gross = (exit_fill_price - position.entry_price) * close_qty;
        let net_pnl = gross - entry_fee * (close_qty / position.size_qty) - exit_fee;

        if reason.is_partial() {
            if let Some(order_id) = position.stop_order_id.take() {
                let _ = self.stop_mgr.cancel_stop(&position.symbol, &order_id).await;
            }
            let remaining_qty = position.size_qty - close_qty;
            let breakeven = position.entry_price * (Decimal::ONE + BREAKEVEN_EPSILON_PCT);
            position.trailing_stop = Some(position.trailing_stop.unwrap_or(position.stop_price).max(breakeven));
            match self.stop_mgr.place_stop(&position.symbol, Side::Sell, remaining_qty, position.effective_stop()).await {
                Ok(new_stop) => position.stop_order_id = Some(new_stop.client_id),
                Err(e) => error!(symbol = %position.symbol, error = %e, "failed to re-place stop after partial close"),
            }
            position.size_qty = remaining_qty;
            position.size_usd = remaining_qty * position.entry_price;
            position.realized_pnl += net_pnl;
            position.partial_closed = true;
            self.portfolio.upsert_position(position.clone()).await;

            self.event_bus.emit(MarketEvent::Order(OrderEvent {
                kind: OrderEventKind::PartialClose,
                symbol: position.symbol.clone(),
                strategy_id: position.strategy_id.clone(),
                price: exit_fill_price,
                size_qty: close_qty,
                realized_pnl: Some(net_pnl),
                reason: Some(reason.as_str().to_string()),
                timestamp: Utc::now(),
            }));
        } else {
            if let Some(order_id) = position.stop_order_id.take() {
                let _ = self.stop_mgr.cancel_stop(&position.symbol, &order_id).await;
            }
            position.realized_pnl += net_pnl;
            self.portfolio.remove_position(&position.symbol).await;
            self.daily_stop.record_realized_pnl(position.realized_pnl).await;

            {
                let mut intel = self.intelligence.lock().await;
                intel.record_trade_result(&position.strategy_id, position.realized_pnl);
                intel.log_trade_exit(&position.symbol, &position.strategy_id, position.realized_pnl);
            }

            self.event_bus.emit(MarketEvent::Order(OrderEvent {
                kind: OrderEventKind::Close,
                symbol: position.symbol.clone(),
                strategy_id: position.strategy_id.clone(),
                price: exit_fill_price,
                size_qty: close_qty,
                realized_pnl: Some(position.realized_pnl),
                reason: Some(reason.as_str().to_string()),
                timestamp: Utc::now(),
            }));
        }

        if let Err(e) = self.persistence.save(&self.portfolio.positions_snapshot().await, false).await {
            warn!(error = %e, "failed to persist position registry after exit");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::paper::PaperExecutor;
    use crate::engine::portfolio::InMemoryPortfolio;
    use crate::events::MarketEventBus;
    use crate::persistence::AtomicJsonStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::{Mutex, RwLock};

    struct JsonPersistence(AtomicJsonStore<Vec<Position>>);

    #[async_trait]
    impl PositionPersistence for JsonPersistence {
        async fn save(&self, positions: &[Position], force: bool) -> anyhow::Result<()> {
            self.0.save(&positions.to_vec(), force).map(|_| ())
        }
        async fn load(&self) -> anyhow::Result<Vec<Position>> {
            Ok(self.0.load()?.unwrap_or_default())
        }
    }

    async fn build_manager(symbol: &Symbol, price: Decimal) -> (ExitManager, Arc<PaperExecutor>) {
        let prices = Arc::new(RwLock::new(HashMap::new()));
        let executor = PaperExecutor::shared(prices.clone());
        executor.update_price(symbol, price).await;
        let portfolio = InMemoryPortfolio::shared(dec!(10000));
        let dir = tempfile::tempdir().unwrap();
        let persistence = Arc::new(JsonPersistence(AtomicJsonStore::new(dir.path().join("p.json"), 0)));
        let intelligence = Arc::new(Mutex::new(IntelligenceLayer::new(dec!(100))));
        let config = Arc::new(CoreConfig::default());
        let manager = ExitManager::new(
            portfolio.clone(),
            executor.clone(),
            executor.clone(),
            persistence,
            intelligence,
            SyncStatus::default(),
            config,
            Arc::new(MarketEventBus::new()),
            Arc::new(crate::risk::DailyStopTracker::new()),
            false,
        );
        (manager, executor)
    }

    fn open_position(symbol: &Symbol, entry: Decimal) -> Position {
        let mut p = Position::new(symbol.clone(), entry, dec!(2), entry * dec!(0.98), entry * dec!(1.03), entry * dec!(1.06), 240, "momentum".to_string(), dec!(70));
        p.state = crate::types::PositionState::Open;
        p
    }

    #[tokio::test]
    async fn stop_breach_closes_the_full_position() {
        let symbol = Symbol::new("SOL-USD");
        let (manager, executor) = build_manager(&symbol, dec!(100)).await;
        let position = open_position(&symbol, dec!(100));
        manager.portfolio.upsert_position(position).await;
        executor.update_price(&symbol, dec!(97)).await;

        let mut prices = HashMap::new();
        prices.insert(symbol.clone(), dec!(97));
        manager.run_cycle(&prices).await;

        assert!(manager.portfolio.position(&symbol).await.is_none());
    }

    #[tokio::test]
    async fn tp1_triggers_a_partial_close() {
        let symbol = Symbol::new("SOL-USD");
        let (manager, executor) = build_manager(&symbol, dec!(100)).await;
        let position = open_position(&symbol, dec!(100));
        manager.portfolio.upsert_position(position).await;
        executor.update_price(&symbol, dec!(104)).await;

        let mut prices = HashMap::new();
        prices.insert(symbol.clone(), dec!(104));
        manager.run_cycle(&prices).await;

        let remaining = manager.portfolio.position(&symbol).await.expect("position should remain open after partial close");
        assert!(remaining.partial_closed);
        assert!(remaining.size_qty < dec!(2));
    }

    #[tokio::test]
    async fn risk_off_regime_tightens_trailing_and_stays_monotonic() {
        let symbol = Symbol::new("SOL-USD");
        let (manager, executor) = build_manager(&symbol, dec!(100)).await;
        let mut position = open_position(&symbol, dec!(100));
        position.stop_price = dec!(98);
        manager.portfolio.upsert_position(position).await;

        executor.update_price(&symbol, dec!(101)).await;
        let mut prices = HashMap::new();
        prices.insert(symbol.clone(), dec!(101));
        manager.run_cycle(&prices).await;
        let after_normal = manager.portfolio.position(&symbol).await.unwrap();
        assert_eq!(after_normal.effective_stop(), dec!(98), "1% gain in normal regime is below trail_start, stop unchanged");

        manager.intelligence.lock().await.regime_detector.update_btc_trend(dec!(-4), dec!(-4));
        manager.run_cycle(&prices).await;
        let after_risk_off = manager.portfolio.position(&symbol).await.unwrap();
        assert_eq!(after_risk_off.effective_stop(), dec!(100.1), "risk_off moves to BE+eps on any positive pnl");

        manager.intelligence.lock().await.regime_detector.update_btc_trend(dec!(1), dec!(1));
        executor.update_price(&symbol, dec!(102)).await;
        prices.insert(symbol.clone(), dec!(102));
        manager.run_cycle(&prices).await;
        let after_back_to_normal = manager.portfolio.position(&symbol).await.unwrap();
        assert_eq!(after_back_to_normal.effective_stop(), dec!(101), "normal regime locks 50% of a 2% gain from entry 100");
        assert!(after_back_to_normal.effective_stop() >= after_risk_off.effective_stop(), "stop must never move down");
    }

    #[tokio::test]
    async fn time_stop_closes_a_stale_losing_position() {
        let symbol = Symbol::new("SOL-USD");
        let (manager, executor) = build_manager(&symbol, dec!(100)).await;
        let mut position = open_position(&symbol, dec!(100));
        position.entry_time = Utc::now() - chrono::Duration::minutes(300);
        manager.portfolio.upsert_position(position).await;
        executor.update_price(&symbol, dec!(100)).await;

        let mut prices = HashMap::new();
        prices.insert(symbol.clone(), dec!(100));
        manager.run_cycle(&prices).await;

        assert!(manager.portfolio.position(&symbol).await.is_none());
    }

    #[tokio::test]
    async fn choppy_losing_suppressed_near_daily_support() {
        let symbol = Symbol::new("SOL-USD");
        let (manager, _executor) = build_manager(&symbol, dec!(100)).await;
        let mut position = open_position(&symbol, dec!(100));
        position.record_confidence(dec!(60));
        position.record_confidence(dec!(50));
        assert_eq!(position.confidence_trend(), crate::types::ConfidenceTrend::Fading);

        let mut indicators = LiveIndicators::default();
        indicators.daily_range_position = Some(dec!(0.10));
        assert!(
            !manager.thesis_invalid(&position, dec!(-1.5), Decimal::ONE, Some(&indicators), None),
            "near daily support should suppress the choppy-losing thesis-invalidation"
        );

        indicators.daily_range_position = Some(dec!(0.5));
        assert!(manager.thesis_invalid(&position, dec!(-1.5), Decimal::ONE, Some(&indicators), None));
    }

    #[tokio::test]
    async fn ml_bearish_invalidates_thesis_even_without_chop() {
        let symbol = Symbol::new("SOL-USD");
        let (manager, _executor) = build_manager(&symbol, dec!(100)).await;
        let position = open_position(&symbol, dec!(100));

        let ml = MLScore { raw_score: dec!(-0.4), confidence: dec!(0.8), computed_at: Utc::now() };
        assert!(manager.thesis_invalid(&position, dec!(-0.6), Decimal::ONE, None, Some(&ml)));
    }

    #[tokio::test]
    async fn vwap_stretch_invalidates_thesis() {
        let symbol = Symbol::new("SOL-USD");
        let (manager, _executor) = build_manager(&symbol, dec!(100)).await;
        let position = open_position(&symbol, dec!(100));

        let mut indicators = LiveIndicators::default();
        indicators.vwap_distance_pct = Some(dec!(-1.5));
        assert!(manager.thesis_invalid(&position, dec!(-0.2), Decimal::ONE, Some(&indicators), None));
    }

    #[tokio::test]
    async fn trend_5m_flip_invalidates_thesis() {
        let symbol = Symbol::new("SOL-USD");
        let (manager, _executor) = build_manager(&symbol, dec!(100)).await;
        let position = open_position(&symbol, dec!(100));

        let mut indicators = LiveIndicators::default();
        indicators.trend_5m = Some(dec!(-0.8));
        assert!(manager.thesis_invalid(&position, dec!(-0.2), Decimal::ONE, Some(&indicators), None));
    }
}

//! Order router: the single entry point between signal generation and
//! execution. Grounded on the source's `order_router.py` gate chain —
//! every submission runs the same fixed sequence of checks regardless of
//! trading mode, short-circuiting with a tagged rejection on first failure
//! and a per-category counter bump so operators can see which gate is
//! actually turning away flow.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::core::CoreConfig;
use crate::engine::executor::{Executor, PortfolioManager, PositionPersistence, StopOrderManager};
use crate::events::MarketEventBus;
use crate::intelligence::{limits, IntelligenceLayer};
use crate::risk::{CircuitBreaker, DailyStopTracker};
use crate::sync::SyncStatus;
use crate::types::event::{OrderEvent, OrderEventKind};
use crate::types::{MarketEvent, Order, OrderRequest, Position, Side, Symbol, TradeSignal};

use crate::universe::TierScheduler;

/// Returns the current mark price for a symbol, or `None` if none is
/// known yet. Shared between the router's truth-validation gate and the
/// sizing gate rather than reaching into the exchange synchronizer
/// directly, per the cyclic-reference design note.
pub type PriceGetter = Arc<dyn Fn(&Symbol) -> Option<Decimal> + Send + Sync>;

#[derive(Debug, Clone)]
pub enum RouterRejection {
    InFlight,
    DailyStop,
    CircuitBreaker,
    Duplicate,
    Cooldown(String),
    NotWarm,
    Stablecoin,
    IntelligenceLimits(String),
    SpreadTooWide,
    NotWhitelisted,
    Score { score: Decimal, required: Decimal },
    Regime { score: Decimal, required: Decimal },
    DailyHalt(String),
    RegistryRace,
    Budget,
    NoPrice,
    Degraded,
    RrTooLow(Decimal),
    ExecFailed(String),
    NoFill,
}

impl RouterRejection {
    pub fn category(&self) -> &'static str {
        match self {
            RouterRejection::InFlight => "in_flight",
            RouterRejection::DailyStop => "daily_stop",
            RouterRejection::CircuitBreaker => "circuit_breaker",
            RouterRejection::Duplicate => "duplicate",
            RouterRejection::Cooldown(_) => "cooldown",
            RouterRejection::NotWarm => "warmth",
            RouterRejection::Stablecoin => "stablecoin",
            RouterRejection::IntelligenceLimits(_) => "intelligence_limits",
            RouterRejection::SpreadTooWide => "spread",
            RouterRejection::NotWhitelisted => "whitelist",
            RouterRejection::Score { .. } => "score",
            RouterRejection::Regime { .. } => "regime",
            RouterRejection::DailyHalt(_) => "daily_halt",
            RouterRejection::RegistryRace => "registry_race",
            RouterRejection::Budget => "budget",
            RouterRejection::NoPrice => "no_price",
            RouterRejection::Degraded => "degraded",
            RouterRejection::RrTooLow(_) => "rr",
            RouterRejection::ExecFailed(_) => "exec_failed",
            RouterRejection::NoFill => "no_fill",
        }
    }
}

pub type RouterOutcome = Result<Position, RouterRejection>;

struct InFlightGuard<'a> {
    set: &'a std::sync::Mutex<HashSet<Symbol>>,
    symbol: Symbol,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.lock().unwrap().remove(&self.symbol);
    }
}

/// Mode-agnostic order router. One instance serves both paper and live
/// trading — only the `Executor`/`StopOrderManager` implementations behind
/// the trait objects differ.
pub struct OrderRouter {
    portfolio: Arc<dyn PortfolioManager>,
    executor: Arc<dyn Executor>,
    stop_mgr: Arc<dyn StopOrderManager>,
    persistence: Arc<dyn PositionPersistence>,
    intelligence: Arc<Mutex<IntelligenceLayer>>,
    tiers: Arc<Mutex<TierScheduler>>,
    sync_status: SyncStatus,
    price_getter: PriceGetter,
    config: Arc<CoreConfig>,
    circuit_breaker: Arc<CircuitBreaker>,
    daily_stop: Arc<DailyStopTracker>,
    event_bus: Arc<MarketEventBus>,
    in_flight: std::sync::Mutex<HashSet<Symbol>>,
    rejections: std::sync::Mutex<HashMap<&'static str, u64>>,
    whitelist: Option<HashSet<Symbol>>,
}

impl OrderRouter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        portfolio: Arc<dyn PortfolioManager>,
        executor: Arc<dyn Executor>,
        stop_mgr: Arc<dyn StopOrderManager>,
        persistence: Arc<dyn PositionPersistence>,
        intelligence: Arc<Mutex<IntelligenceLayer>>,
        tiers: Arc<Mutex<TierScheduler>>,
        sync_status: SyncStatus,
        price_getter: PriceGetter,
        config: Arc<CoreConfig>,
        circuit_breaker: Arc<CircuitBreaker>,
        daily_stop: Arc<DailyStopTracker>,
        event_bus: Arc<MarketEventBus>,
    ) -> Self {
        Self {
            portfolio,
            executor,
            stop_mgr,
            persistence,
            intelligence,
            tiers,
            sync_status,
            price_getter,
            config,
            circuit_breaker,
            daily_stop,
            event_bus,
            in_flight: std::sync::Mutex::new(HashSet::new()),
            rejections: std::sync::Mutex::new(HashMap::new()),
            whitelist: None,
        }
    }

    pub fn with_whitelist(mut self, whitelist: HashSet<Symbol>) -> Self {
        self.whitelist = Some(whitelist);
        self
    }

    pub fn rejection_counts(&self) -> HashMap<&'static str, u64> {
        self.rejections.lock().unwrap().clone()
    }

    fn reject(&self, rejection: RouterRejection) -> RouterOutcome {
        *self.rejections.lock().unwrap().entry(rejection.category()).or_insert(0) += 1;
        Err(rejection)
    }

    fn acquire_in_flight(&self, symbol: &Symbol) -> Option<InFlightGuard<'_>> {
        let mut set = self.in_flight.lock().unwrap();
        if !set.insert(symbol.clone()) {
            return None;
        }
        Some(InFlightGuard { set: &self.in_flight, symbol: symbol.clone() })
    }

    async fn positions_by_symbol(&self) -> HashMap<Symbol, Position> {
        self.portfolio.positions_snapshot().await.into_iter().map(|p| (p.symbol.clone(), p)).collect()
    }

    /// Sector/correlation/global "weak position" caps. Exposure and
    /// cooldowns are handled by `LimitChecker::check` at gate 5 — this
    /// covers the diversification and low-confidence-stacking caps that
    /// sit logically one layer up, closer to the score itself.
    fn check_diversification(&self, symbol: &Symbol, positions: &HashMap<Symbol, Position>) -> Result<(), String> {
        let sector = limits::sector_for(symbol);
        let same_sector = positions.keys().filter(|s| limits::sector_for(s) == sector).count();
        if same_sector >= 3 {
            return Err(format!("sector {sector} already has {same_sector} open positions"));
        }

        for (group, members) in limits::correlation_groups() {
            if !members.contains(&symbol.base()) {
                continue;
            }
            let same_group = positions.keys().filter(|s| members.contains(&s.base())).count();
            if same_group >= 2 {
                return Err(format!("correlation group {group} already has {same_group} open positions"));
            }
        }

        let weak = positions.values().filter(|p| p.entry_confidence < self.config.weak_confidence_threshold).count();
        if weak >= 2 {
            return Err(format!("{weak} low-confidence positions already open"));
        }

        Ok(())
    }

    /// Runs the full 19-gate pipeline in canonical order. Returns the
    /// opened position on success; every rejection path is side-effect
    /// free except for bumping its category's counter.
    pub async fn submit(&self, signal: TradeSignal) -> RouterOutcome {
        // 1. in-flight guard
        let _guard = match self.acquire_in_flight(&signal.symbol) {
            Some(g) => g,
            None => return self.reject(RouterRejection::InFlight),
        };

        // 2. daily stop
        if self.daily_stop.is_tripped(self.config.daily_max_loss_usd).await {
            return self.reject(RouterRejection::DailyStop);
        }

        // 3. circuit breaker
        if self.circuit_breaker.is_tripped() {
            return self.reject(RouterRejection::CircuitBreaker);
        }

        // 4. duplicate/holding
        if self.portfolio.position(&signal.symbol).await.is_some() {
            return self.reject(RouterRejection::Duplicate);
        }

        // 5. cooldown (+ per-symbol exposure cap)
        let positions = self.positions_by_symbol().await;
        {
            let intel = self.intelligence.lock().await;
            if let Err(reason) = intel.limit_checker.check(&signal.symbol, &positions) {
                return self.reject(RouterRejection::Cooldown(reason));
            }
        }

        // 6. warmth
        if !self.tiers.lock().await.is_warm(&signal.symbol) {
            return self.reject(RouterRejection::NotWarm);
        }

        // 7. stablecoin filter
        if signal.symbol.is_stablecoin_base() {
            return self.reject(RouterRejection::Stablecoin);
        }

        // 8. intelligence limits: sector/correlation/weak caps
        if let Err(reason) = self.check_diversification(&signal.symbol, &positions) {
            return self.reject(RouterRejection::IntelligenceLimits(reason));
        }

        // 9. spread gate
        if signal.spread_bps > self.config.spread_max_bps {
            return self.reject(RouterRejection::SpreadTooWide);
        }
        let spread_penalty = signal.spread_bps > self.config.spread_max_bps * dec!(0.7);

        // 10. whitelist (optional)
        if let Some(whitelist) = &self.whitelist {
            if !whitelist.contains(&signal.symbol) {
                return self.reject(RouterRejection::NotWhitelisted);
            }
        }

        // 11. scoring
        let (score, regime) = {
            let intel = self.intelligence.lock().await;
            let regime = intel.regime_snapshot().regime;
            let ml = intel.live_ml(&signal.symbol).cloned();
            let score = match signal.confidence {
                Some(confidence) => intel.scorer.score_strategy_signal(&signal.strategy_id, confidence, regime, ml.as_ref()),
                None => {
                    let indicators = intel.live_indicators(&signal.symbol);
                    intel.scorer.score(&signal.burst, indicators.as_ref(), regime, ml.as_ref())
                }
            };
            (score, regime)
        };
        let base_min = self.config.entry_score_min + if spread_penalty { dec!(10) } else { Decimal::ZERO };
        let required = match regime {
            crate::types::Regime::Normal => base_min,
            crate::types::Regime::Caution => base_min + dec!(5),
            crate::types::Regime::RiskOff => base_min + dec!(10),
        };
        if score.total_score < required {
            if score.total_score >= base_min {
                return self.reject(RouterRejection::Regime { score: score.total_score, required });
            }
            return self.reject(RouterRejection::Score { score: score.total_score, required });
        }

        // 12. daily-halt re-check
        {
            let intel = self.intelligence.lock().await;
            let (halted, reason) = intel.is_trading_halted();
            if halted {
                return self.reject(RouterRejection::DailyHalt(reason.unwrap_or_default()));
            }
        }

        // 13. registry pre-check (guards against a race since gate 4)
        if self.portfolio.position(&signal.symbol).await.is_some() {
            return self.reject(RouterRejection::RegistryRace);
        }

        // 14. budget
        let total_equity = self.portfolio.total_equity().await;
        let current_exposure: Decimal = positions.values().map(|p| p.size_usd).sum();
        let exposure_cap = total_equity * self.config.portfolio_max_exposure_pct / Decimal::from(100);
        let headroom = exposure_cap - current_exposure;
        if headroom <= Decimal::ZERO {
            return self.reject(RouterRejection::Budget);
        }

        // 15. sizing
        let tiers = &self.config.tiers;
        let confluence = score.reasons.len() as u32;
        let whale_count = positions.values().filter(|p| p.size_usd >= tiers.whale_trade_usd * dec!(0.8)).count();
        let strong_count = positions.values().filter(|p| p.size_usd >= tiers.strong_trade_usd * dec!(0.8)).count();
        let mut size_usd = if score.total_score >= tiers.whale_score_min && confluence >= tiers.whale_confluence_min && whale_count < tiers.whale_max_count {
            tiers.whale_trade_usd
        } else if score.total_score >= tiers.strong_score_min && strong_count < tiers.strong_max_count {
            tiers.strong_trade_usd
        } else {
            tiers.normal_trade_usd
        };

        let intel_size_mult = {
            let intel = self.intelligence.lock().await;
            intel.size_multiplier() * intel.scorer.position_size_multiplier(&score, regime)
        };
        size_usd *= intel_size_mult;

        let min_size = total_equity * tiers.min_trade_pct / Decimal::from(100);
        let max_size = total_equity * tiers.max_trade_pct / Decimal::from(100);
        size_usd = size_usd.clamp(min_size, max_size).min(self.config.max_trade_usd).min(headroom);
        if size_usd <= Decimal::ZERO || size_usd < self.config.position_min_usd {
            return self.reject(RouterRejection::Budget);
        }

        // 16. stop/target geometry — always overrides signal-supplied levels
        let entry_price = signal.price;
        let stop_price = entry_price * (Decimal::ONE - self.config.fixed_stop_pct / Decimal::from(100));
        let tp1_price = entry_price * (Decimal::ONE + self.config.tp1_pct / Decimal::from(100));
        let tp2_price = entry_price * (Decimal::ONE + self.config.tp2_pct / Decimal::from(100));

        // 17. R:R enforcement
        let risk = entry_price - stop_price;
        let reward = tp1_price - entry_price;
        if risk <= Decimal::ZERO || reward / risk < self.config.min_rr_ratio {
            let rr = if risk > Decimal::ZERO { reward / risk } else { Decimal::ZERO };
            return self.reject(RouterRejection::RrTooLow(rr));
        }

        // 18. truth validation
        if self.sync_status.is_degraded() {
            return self.reject(RouterRejection::Degraded);
        }
        if (self.price_getter)(&signal.symbol).is_none() {
            return self.reject(RouterRejection::NoPrice);
        }

        // 19. dispatch
        let qty = size_usd / entry_price;
        let request = OrderRequest::market(signal.symbol.clone(), Side::Buy, qty);
        let order = match self.executor.place_order(request).await {
            Ok(order) => {
                self.circuit_breaker.record_success();
                order
            }
            Err(e) => {
                if !e.is_transient() {
                    self.circuit_breaker.record_failure();
                }
                return self.reject(RouterRejection::ExecFailed(e.to_string()));
            }
        };

        if order.filled_qty.is_zero() {
            // cancel_skip policy: a zero-fill confirmation means the exchange
            // never actually bought anything for us. Cancel and walk away
            // rather than opening a position against an order that isn't there.
            if let Err(e) = self.executor.cancel_order(&signal.symbol, &order.id).await {
                warn!(symbol = %signal.symbol, error = %e, "cancel of unfilled entry order failed");
            }
            return self.reject(RouterRejection::NoFill);
        }

        let fill_price = order.average_fill_price().unwrap_or(entry_price);
        let fill_qty = order.filled_qty;
        let mut position = Position::new(
            signal.symbol.clone(),
            fill_price,
            fill_qty,
            stop_price,
            tp1_price,
            tp2_price,
            self.config.time_stop_min,
            signal.strategy_id.clone(),
            score.total_score,
        );
        position.state = crate::types::PositionState::Open;

        match self.stop_mgr.place_stop(&signal.symbol, Side::Sell, fill_qty, stop_price).await {
            Ok(stop_order) => position.stop_order_id = Some(stop_order.client_id),
            Err(e) => warn!(symbol = %signal.symbol, error = %e, "initial protective stop failed to place"),
        }

        self.portfolio.upsert_position(position.clone()).await;
        if let Err(e) = self.persistence.save(&self.portfolio.positions_snapshot().await, false).await {
            warn!(error = %e, "failed to persist position registry after open");
        }

        {
            let mut intel = self.intelligence.lock().await;
            intel.record_trade_opened(&signal.symbol);
            intel.log_trade_entry(&signal.symbol, &signal.strategy_id, &score);
        }

        self.event_bus.emit(MarketEvent::Order(OrderEvent {
            kind: OrderEventKind::Open,
            symbol: signal.symbol.clone(),
            strategy_id: signal.strategy_id.clone(),
            price: fill_price,
            size_qty: fill_qty,
            realized_pnl: None,
            reason: Some(signal.reason.clone()),
            timestamp: Utc::now(),
        }));

        info!(symbol = %signal.symbol, size_usd = %size_usd, score = %score.total_score, "position opened");
        Ok(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::paper::PaperExecutor;
    use crate::engine::portfolio::InMemoryPortfolio;
    use crate::persistence::AtomicJsonStore;
    use async_trait::async_trait;
    use tokio::sync::RwLock as TokioRwLock;

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

    async fn build_router(symbol: &Symbol, price: Decimal) -> (OrderRouter, Arc<PaperExecutor>) {
        let prices = Arc::new(TokioRwLock::new(HashMap::new()));
        let executor = PaperExecutor::shared(prices.clone());
        executor.update_price(symbol, price).await;
        let portfolio = InMemoryPortfolio::shared(dec!(10000));
        let dir = tempfile::tempdir().unwrap();
        let persistence = Arc::new(JsonPersistence(AtomicJsonStore::new(dir.path().join("p.json"), 0)));
        let intelligence = Arc::new(Mutex::new(IntelligenceLayer::new(dec!(100))));
        let (tiers, _rx) = TierScheduler::new(150);
        let tiers = Arc::new(Mutex::new(tiers));
        tiers.lock().await.set_tier(symbol, crate::types::Tier::T1Ws);
        let config = Arc::new(CoreConfig::default());
        let circuit_breaker = Arc::new(CircuitBreaker::new(config.circuit_breaker_failure_threshold));
        let daily_stop = Arc::new(DailyStopTracker::new());
        let event_bus = Arc::new(MarketEventBus::new());
        let price_for_getter = prices.clone();
        let price_getter: PriceGetter = Arc::new(move |s: &Symbol| price_for_getter.try_read().ok().and_then(|p| p.get(s).copied()));

        let router = OrderRouter::new(
            portfolio,
            executor.clone(),
            executor.clone(),
            persistence,
            intelligence,
            tiers,
            SyncStatus::default(),
            price_getter,
            config,
            circuit_breaker,
            daily_stop,
            event_bus,
        );
        (router, executor)
    }

    fn warmth_signal(symbol: &Symbol, price: Decimal) -> TradeSignal {
        TradeSignal::new(symbol.clone(), "momentum", price, dec!(3), "test entry").with_confidence(dec!(0.9))
    }

    #[tokio::test]
    async fn warmth_gate_blocks_cold_symbols() {
        let symbol = Symbol::new("SOL-USD");
        let prices = Arc::new(TokioRwLock::new(HashMap::new()));
        let executor = PaperExecutor::shared(prices.clone());
        executor.update_price(&symbol, dec!(100)).await;
        let portfolio = InMemoryPortfolio::shared(dec!(10000));
        let dir = tempfile::tempdir().unwrap();
        let persistence = Arc::new(JsonPersistence(AtomicJsonStore::new(dir.path().join("p.json"), 0)));
        let intelligence = Arc::new(Mutex::new(IntelligenceLayer::new(dec!(100))));
        let (tiers, _rx) = TierScheduler::new(150);
        let config = Arc::new(CoreConfig::default());
        let price_getter: PriceGetter = Arc::new(move |_: &Symbol| Some(dec!(100)));
        let router = OrderRouter::new(
            portfolio,
            executor.clone(),
            executor.clone(),
            persistence,
            intelligence,
            Arc::new(Mutex::new(tiers)),
            SyncStatus::default(),
            price_getter,
            config,
            Arc::new(CircuitBreaker::new(5)),
            Arc::new(DailyStopTracker::new()),
            Arc::new(MarketEventBus::new()),
        );

        let outcome = router.submit(warmth_signal(&symbol, dec!(100))).await;
        assert!(matches!(outcome, Err(RouterRejection::NotWarm)));
    }

    #[tokio::test]
    async fn high_confidence_signal_opens_a_position() {
        let symbol = Symbol::new("SOL-USD");
        let (router, _executor) = build_router(&symbol, dec!(100)).await;
        let outcome = router.submit(warmth_signal(&symbol, dec!(100))).await;
        assert!(outcome.is_ok(), "{:?}", outcome.err());
        let position = outcome.unwrap();
        assert_eq!(position.symbol, symbol);
        assert!(position.stop_price < position.entry_price);
        assert!(position.tp1_price > position.entry_price);
    }

    #[tokio::test]
    async fn duplicate_position_is_rejected() {
        let symbol = Symbol::new("SOL-USD");
        let (router, _executor) = build_router(&symbol, dec!(100)).await;
        router.submit(warmth_signal(&symbol, dec!(100))).await.unwrap();
        let outcome = router.submit(warmth_signal(&symbol, dec!(100))).await;
        assert!(matches!(outcome, Err(RouterRejection::Duplicate)));
    }

    #[tokio::test]
    async fn stablecoin_symbols_are_rejected() {
        let symbol = Symbol::new("USDC-USD");
        let (router, _executor) = build_router(&symbol, dec!(1)).await;
        let outcome = router.submit(warmth_signal(&symbol, dec!(1))).await;
        assert!(matches!(outcome, Err(RouterRejection::Stablecoin)));
    }

    #[tokio::test]
    async fn spread_wider_than_max_is_rejected_before_scoring() {
        let symbol = Symbol::new("SOL-USD");
        let (mut router, _executor) = build_router(&symbol, dec!(100)).await;
        Arc::get_mut(&mut router.config).unwrap().spread_max_bps = dec!(20);
        let signal = TradeSignal::new(symbol.clone(), "momentum", dec!(100), dec!(50), "test entry").with_confidence(dec!(0.9));

        let outcome = router.submit(signal).await;
        assert!(matches!(outcome, Err(RouterRejection::SpreadTooWide)));
    }

    #[tokio::test]
    async fn rr_below_minimum_is_rejected() {
        let symbol = Symbol::new("SOL-USD");
        let (mut router, _executor) = build_router(&symbol, dec!(100)).await;
        {
            let cfg = Arc::get_mut(&mut router.config).unwrap();
            cfg.min_rr_ratio = dec!(5.0);
            cfg.fixed_stop_pct = dec!(0.4);
            cfg.tp1_pct = dec!(0.3);
        }
        let outcome = router.submit(warmth_signal(&symbol, dec!(100))).await;
        assert!(matches!(outcome, Err(RouterRejection::RrTooLow(_))));
    }

    struct ZeroFillExecutor;

    #[async_trait]
    impl Executor for ZeroFillExecutor {
        async fn place_order(&self, request: OrderRequest) -> crate::engine::executor::ExecResult<Order> {
            let mut order = Order::from_request(&request);
            order.status = crate::types::OrderStatus::Cancelled;
            Ok(order)
        }
        async fn cancel_order(&self, _symbol: &Symbol, _order_id: &str) -> crate::engine::executor::ExecResult<()> {
            Ok(())
        }
        async fn get_order(&self, _symbol: &Symbol, _order_id: &str) -> crate::engine::executor::ExecResult<Order> {
            Err(crate::engine::executor::ExecError::fatal("not found"))
        }
        async fn get_balance(&self, _asset: &str) -> crate::engine::executor::ExecResult<Decimal> {
            Ok(dec!(10000))
        }
    }

    #[tokio::test]
    async fn zero_fill_limit_order_opens_no_position() {
        let symbol = Symbol::new("SOL-USD");
        let prices = Arc::new(TokioRwLock::new(HashMap::new()));
        let executor = PaperExecutor::shared(prices.clone());
        executor.update_price(&symbol, dec!(100)).await;
        let portfolio = InMemoryPortfolio::shared(dec!(10000));
        let dir = tempfile::tempdir().unwrap();
        let persistence = Arc::new(JsonPersistence(AtomicJsonStore::new(dir.path().join("p.json"), 0)));
        let intelligence = Arc::new(Mutex::new(IntelligenceLayer::new(dec!(100))));
        let (tiers, _rx) = TierScheduler::new(150);
        let tiers = Arc::new(Mutex::new(tiers));
        tiers.lock().await.set_tier(&symbol, crate::types::Tier::T1Ws);
        let config = Arc::new(CoreConfig::default());
        let price_getter: PriceGetter = Arc::new(move |_: &Symbol| Some(dec!(100)));

        let router = OrderRouter::new(
            portfolio.clone(),
            Arc::new(ZeroFillExecutor),
            executor.clone(),
            persistence,
            intelligence,
            tiers,
            SyncStatus::default(),
            price_getter,
            config,
            Arc::new(CircuitBreaker::new(5)),
            Arc::new(DailyStopTracker::new()),
            Arc::new(MarketEventBus::new()),
        );

        let outcome = router.submit(warmth_signal(&symbol, dec!(100))).await;
        assert!(matches!(outcome, Err(RouterRejection::NoFill)));
        assert!(portfolio.position(&symbol).await.is_none());
    }
}

//! Exchange synchronizer and position registry. Grounded on the source's
//! `exchange_sync.py` + `base_persistence.py::sync_with_exchange`: the
//! exchange is truth, local state is reconciled against it, and recovery
//! from a stale/corrupt local store never panics the loop.
//!
//! Per the cyclic-reference design note, the router and exit manager never
//! hold a full `ExchangeSynchronizer` — they hold a cheap `SyncStatus`
//! handle instead, so none of the three trading-core components reaches
//! upward into either of the others.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

use crate::engine::executor::{ExecResult, PortfolioManager, PositionPersistence, StopOrderManager};
use crate::types::{Position, PositionState, Side, Symbol};

/// Static-ish per-product trading constraints, cached from the exchange's
/// product metadata endpoint.
#[derive(Debug, Clone, Copy)]
pub struct ProductMetadata {
    pub price_increment: Decimal,
    pub base_increment: Decimal,
    pub quote_min: Decimal,
    pub base_min: Decimal,
}

impl Default for ProductMetadata {
    fn default() -> Self {
        Self {
            price_increment: dec!(0.01),
            base_increment: dec!(0.00000001),
            quote_min: dec!(1),
            base_min: dec!(0),
        }
    }
}

/// What the exchange reports about held assets on a portfolio refresh.
#[derive(Debug, Clone, Default)]
pub struct PortfolioSnapshot {
    pub cash_balance: Decimal,
    pub holdings_qty: HashMap<Symbol, Decimal>,
    pub cost_basis: HashMap<Symbol, Decimal>,
    pub available_to_trade: HashMap<Symbol, Decimal>,
    pub unrealized_pnl: HashMap<Symbol, Decimal>,
    pub delisted: Vec<Symbol>,
    pub staked: Vec<Symbol>,
}

impl PortfolioSnapshot {
    pub fn tradeable_symbols(&self) -> Vec<Symbol> {
        self.holdings_qty
            .keys()
            .filter(|s| !self.delisted.contains(s) && !self.staked.contains(s) && !s.is_stablecoin_base())
            .cloned()
            .collect()
    }
}

/// Fetches account truth from wherever the trading mode's executor gets it.
/// Live mode hits the exchange's accounts/portfolios REST surface; paper
/// mode mirrors the in-memory `PortfolioManager` back as if it were truth.
#[async_trait]
pub trait PortfolioSource: Send + Sync {
    async fn fetch(&self) -> ExecResult<PortfolioSnapshot>;
}

/// Cheap, cloneable handle onto the synchronizer's health flags. This is
/// what the router's truth-validation gate and the exit manager's
/// synced/recovered tolerance check actually hold — never the full
/// `ExchangeSynchronizer`.
#[derive(Clone)]
pub struct SyncStatus(Arc<SyncStatusInner>);

struct SyncStatusInner {
    degraded: AtomicBool,
    last_verified_at: RwLock<Option<DateTime<Utc>>>,
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self(Arc::new(SyncStatusInner {
            degraded: AtomicBool::new(false),
            last_verified_at: RwLock::new(None),
        }))
    }
}

impl SyncStatus {
    pub fn is_degraded(&self) -> bool {
        self.0.degraded.load(Ordering::Acquire)
    }

    fn set_degraded(&self, value: bool) {
        self.0.degraded.store(value, Ordering::Release);
    }

    async fn mark_verified(&self) {
        *self.0.last_verified_at.write().await = Some(Utc::now());
    }

    /// §7 "stale data": truth is stale once it has gone longer than
    /// `max_age_secs` without a successful verify pass.
    pub async fn is_stale(&self, max_age_secs: i64) -> bool {
        match *self.0.last_verified_at.read().await {
            Some(t) => (Utc::now() - t).num_seconds() > max_age_secs,
            None => true,
        }
    }
}

/// Outcome of one `verify_truth` pass, surfaced for logging/dashboards.
#[derive(Debug, Default)]
pub struct TruthDiff {
    pub recovered: Vec<Symbol>,
    pub removed: Vec<Symbol>,
    pub drifted: Vec<(Symbol, Decimal, Decimal)>,
}

/// View over the shared position map split into active (counts toward
/// limits) and dust (tracked, excluded from counts) per §3.
pub struct PositionRegistry {
    portfolio: Arc<dyn PortfolioManager>,
    dust_threshold: Decimal,
}

impl PositionRegistry {
    pub fn new(portfolio: Arc<dyn PortfolioManager>, dust_threshold: Decimal) -> Self {
        Self { portfolio, dust_threshold }
    }

    pub async fn active_positions(&self) -> Vec<Position> {
        self.portfolio
            .positions_snapshot()
            .await
            .into_iter()
            .filter(|p| p.size_usd >= self.dust_threshold)
            .collect()
    }

    pub async fn dust_positions(&self) -> Vec<Position> {
        self.portfolio
            .positions_snapshot()
            .await
            .into_iter()
            .filter(|p| p.size_usd < self.dust_threshold)
            .collect()
    }

    pub async fn active_count(&self) -> usize {
        self.active_positions().await.len()
    }

    pub async fn total_active_exposure(&self) -> Decimal {
        self.active_positions().await.iter().map(|p| p.size_usd).sum()
    }

    pub async fn has_open(&self, symbol: &Symbol) -> bool {
        self.portfolio.position(symbol).await.is_some()
    }
}

/// Reconciles local position state against exchange truth, persists it
/// atomically, and manages stop-order health. One instance per trading
/// session, owned by the main loop.
pub struct ExchangeSynchronizer {
    portfolio: Arc<dyn PortfolioManager>,
    persistence: Arc<dyn PositionPersistence>,
    source: Arc<dyn PortfolioSource>,
    status: SyncStatus,
    dust_threshold: Decimal,
    degraded_balance_floor: Decimal,
    recently_closed: Mutex<HashMap<Symbol, DateTime<Utc>>>,
    product_metadata: RwLock<HashMap<Symbol, ProductMetadata>>,
    fixed_stop_pct: Decimal,
    tp1_pct: Decimal,
    tp2_pct: Decimal,
    time_stop_min: u32,
}

const RECENTLY_CLOSED_GRACE_SECS: i64 = 300;

impl ExchangeSynchronizer {
    pub fn new(
        portfolio: Arc<dyn PortfolioManager>,
        persistence: Arc<dyn PositionPersistence>,
        source: Arc<dyn PortfolioSource>,
        dust_threshold: Decimal,
        fixed_stop_pct: Decimal,
        tp1_pct: Decimal,
        tp2_pct: Decimal,
        time_stop_min: u32,
    ) -> Self {
        Self {
            portfolio,
            persistence,
            source,
            status: SyncStatus::default(),
            dust_threshold,
            degraded_balance_floor: dec!(50),
            recently_closed: Mutex::new(HashMap::new()),
            product_metadata: RwLock::new(HashMap::new()),
            fixed_stop_pct,
            tp1_pct,
            tp2_pct,
            time_stop_min,
        }
    }

    pub fn status(&self) -> SyncStatus {
        self.status.clone()
    }

    pub fn registry(&self) -> PositionRegistry {
        PositionRegistry::new(self.portfolio.clone(), self.dust_threshold)
    }

    /// §4.7.1/.3: fetches the snapshot, flips `sync_degraded` on repeated
    /// failure or an implausibly low cash balance, clears it otherwise.
    pub async fn refresh_portfolio(&self) -> ExecResult<PortfolioSnapshot> {
        match self.source.fetch().await {
            Ok(snapshot) => {
                if snapshot.cash_balance < self.degraded_balance_floor {
                    warn!(balance = %snapshot.cash_balance, "portfolio balance implausibly low, entering degraded mode");
                    self.status.set_degraded(true);
                } else {
                    self.status.set_degraded(false);
                }
                self.portfolio.set_available_balance(snapshot.cash_balance).await;
                Ok(snapshot)
            }
            Err(e) => {
                error!(error = %e, "portfolio refresh failed, entering degraded mode");
                self.status.set_degraded(true);
                Err(e)
            }
        }
    }

    /// §4.7.2: diffs local positions against exchange truth. Missing
    /// locally -> adopted with `strategy_id = "recovered"` and default
    /// geometry derived from the configured fixed percentages. Extra
    /// locally (and not within the just-closed grace window) -> removed.
    /// Quantity drift beyond 1% is logged, never auto-corrected — the
    /// exchange is truth on quantity, but mark-to-market happens elsewhere.
    pub async fn verify_truth(&self, snapshot: &PortfolioSnapshot) -> TruthDiff {
        let mut diff = TruthDiff::default();
        let local_positions = self.portfolio.positions_snapshot().await;
        let local_symbols: Vec<Symbol> = local_positions.iter().map(|p| p.symbol.clone()).collect();
        let exchange_symbols = snapshot.tradeable_symbols();

        for symbol in &exchange_symbols {
            if local_symbols.contains(symbol) {
                continue;
            }
            let qty = snapshot.holdings_qty.get(symbol).copied().unwrap_or(Decimal::ZERO);
            if qty <= Decimal::ZERO {
                continue;
            }
            let cost_basis = snapshot.cost_basis.get(symbol).copied().unwrap_or(Decimal::ZERO);
            let entry_price = if qty.is_zero() { Decimal::ZERO } else { cost_basis / qty };
            if entry_price <= Decimal::ZERO {
                continue;
            }
            let stop = entry_price * (Decimal::ONE - self.fixed_stop_pct / Decimal::from(100));
            let tp1 = entry_price * (Decimal::ONE + self.tp1_pct / Decimal::from(100));
            let tp2 = entry_price * (Decimal::ONE + self.tp2_pct / Decimal::from(100));
            let mut recovered = Position::new(symbol.clone(), entry_price, qty, stop, tp1, tp2, self.time_stop_min, "recovered".to_string(), dec!(50));
            recovered.state = PositionState::Open;
            recovered.unverified = true;
            self.portfolio.upsert_position(recovered).await;
            info!(symbol = %symbol, entry = %entry_price, "recovered untracked exchange position");
            diff.recovered.push(symbol.clone());
        }

        for position in &local_positions {
            if exchange_symbols.contains(&position.symbol) {
                if let Some(exch_qty) = snapshot.holdings_qty.get(&position.symbol) {
                    let drift = (*exch_qty - position.size_qty).abs();
                    let tolerance = position.size_qty * dec!(0.01);
                    if drift > tolerance.max(Decimal::new(1, 8)) {
                        warn!(symbol = %position.symbol, local = %position.size_qty, exchange = %exch_qty, "quantity drift beyond tolerance");
                        diff.drifted.push((position.symbol.clone(), position.size_qty, *exch_qty));
                    }
                }
                continue;
            }
            if self.is_recently_closed(&position.symbol).await {
                continue;
            }
            self.portfolio.remove_position(&position.symbol).await;
            warn!(symbol = %position.symbol, "local position absent from exchange, removed");
            diff.removed.push(position.symbol.clone());
        }

        self.status.mark_verified().await;
        diff
    }

    pub async fn record_recently_closed(&self, symbol: &Symbol) {
        self.recently_closed.lock().await.insert(symbol.clone(), Utc::now());
    }

    async fn is_recently_closed(&self, symbol: &Symbol) -> bool {
        self.recently_closed
            .lock()
            .await
            .get(symbol)
            .map(|t| (Utc::now() - *t).num_seconds() < RECENTLY_CLOSED_GRACE_SECS)
            .unwrap_or(false)
    }

    pub async fn cache_product_metadata(&self, symbol: Symbol, metadata: ProductMetadata) {
        self.product_metadata.write().await.insert(symbol, metadata);
    }

    pub async fn product_metadata(&self, symbol: &Symbol) -> ProductMetadata {
        self.product_metadata.read().await.get(symbol).copied().unwrap_or_default()
    }

    /// Atomic persistence of every active + dust position, per §4.7.5.
    /// `force` bypasses the hash + min-interval write-amplification guard
    /// inside `AtomicJsonStore` (used on shutdown).
    pub async fn save_positions(&self, force: bool) -> anyhow::Result<()> {
        let positions = self.portfolio.positions_snapshot().await;
        self.persistence.save(&positions, force).await
    }

    pub async fn load_positions(&self) -> anyhow::Result<()> {
        match self.persistence.load().await {
            Ok(positions) => {
                for position in positions {
                    self.portfolio.upsert_position(position).await;
                }
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "position store unreadable, starting with an empty registry");
                Ok(())
            }
        }
    }

    /// §4.7.6: cancel-then-place is the only way a stop is ever replaced.
    /// A request for a stop within one price increment of the position's
    /// current stop order is treated as a no-op to avoid churn (tested by
    /// `stop_update_is_noop_within_one_increment`).
    pub async fn ensure_stop(
        &self,
        stop_mgr: &dyn StopOrderManager,
        symbol: &Symbol,
        current_stop_order_price: Option<Decimal>,
        desired_stop: Decimal,
        qty: Decimal,
        current_order_id: Option<&str>,
    ) -> ExecResult<Option<crate::types::Order>> {
        let metadata = self.product_metadata(symbol).await;
        if let Some(current) = current_stop_order_price {
            if (current - desired_stop).abs() <= metadata.price_increment {
                return Ok(None);
            }
        }
        if let Some(order_id) = current_order_id {
            let _ = stop_mgr.cancel_stop(symbol, order_id).await;
        }
        let placed = stop_mgr.place_stop(symbol, Side::Sell, qty, desired_stop).await?;
        Ok(Some(placed))
    }

    /// Links an exchange-reported order to its symbol via the
    /// `stop_<symbol>_<unix>` client-id convention described in §6.
    pub fn symbol_from_stop_client_id(client_id: &str) -> Option<Symbol> {
        let rest = client_id.strip_prefix("stop_")?;
        let (symbol_part, _ts) = rest.rsplit_once('_')?;
        Some(Symbol::new(symbol_part.to_uppercase()))
    }
}

/// Shared REST token bucket, acquired by every poller and by stop-order
/// placement. ~8 req/s per §5's shared-resource policy.
pub struct RestRateLimiter {
    limiter: governor::DefaultDirectRateLimiter,
    consecutive_429s: std::sync::atomic::AtomicU32,
}

impl RestRateLimiter {
    pub fn new(per_second: u32) -> Self {
        let quota = governor::Quota::per_second(std::num::NonZeroU32::new(per_second.max(1)).unwrap());
        Self {
            limiter: governor::RateLimiter::direct(quota),
            consecutive_429s: std::sync::atomic::AtomicU32::new(0),
        }
    }

    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    pub fn record_429(&self) -> u32 {
        self.consecutive_429s.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn record_success(&self) {
        self.consecutive_429s.store(0, Ordering::SeqCst);
    }

    /// §5's rate-limit degradation: true once two or more consecutive 429s
    /// have been observed; cleared by the next successful response.
    pub fn is_degraded(&self) -> bool {
        self.consecutive_429s.load(Ordering::SeqCst) >= 2
    }

    pub fn backoff_secs(&self) -> u64 {
        let n = self.consecutive_429s.load(Ordering::SeqCst);
        60u64.min(1u64 << n.min(6))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::portfolio::InMemoryPortfolio;
    use crate::persistence::AtomicJsonStore;
    use async_trait::async_trait as att;

    struct JsonPersistence(AtomicJsonStore<Vec<Position>>);

    #[att]
    impl PositionPersistence for JsonPersistence {
        async fn save(&self, positions: &[Position], force: bool) -> anyhow::Result<()> {
            self.0.save(&positions.to_vec(), force).map(|_| ())
        }
        async fn load(&self) -> anyhow::Result<Vec<Position>> {
            Ok(self.0.load()?.unwrap_or_default())
        }
    }

    struct FakeSource(PortfolioSnapshot);

    #[att]
    impl PortfolioSource for FakeSource {
        async fn fetch(&self) -> ExecResult<PortfolioSnapshot> {
            Ok(self.0.clone())
        }
    }

    fn sample_position(symbol: &str) -> Position {
        Position::new(Symbol::new(symbol), dec!(100), dec!(2), dec!(95), dec!(105), dec!(112), 240, "momentum".to_string(), dec!(70))
    }

    #[tokio::test]
    async fn drift_recovery_adds_and_removes() {
        let portfolio = InMemoryPortfolio::shared(dec!(1000));
        let mut aaa = sample_position("AAA-USD");
        aaa.state = PositionState::Open;
        portfolio.upsert_position(aaa).await;
        let mut bbb = sample_position("BBB-USD");
        bbb.state = PositionState::Open;
        portfolio.upsert_position(bbb).await;

        let dir = tempfile::tempdir().unwrap();
        let persistence = Arc::new(JsonPersistence(AtomicJsonStore::new(dir.path().join("positions.json"), 0)));

        let mut snapshot = PortfolioSnapshot { cash_balance: dec!(500), ..Default::default() };
        snapshot.holdings_qty.insert(Symbol::new("BBB-USD"), dec!(2));
        snapshot.cost_basis.insert(Symbol::new("BBB-USD"), dec!(200));
        snapshot.holdings_qty.insert(Symbol::new("CCC-USD"), dec!(3));
        snapshot.cost_basis.insert(Symbol::new("CCC-USD"), dec!(300));
        let source = Arc::new(FakeSource(snapshot.clone()));

        let sync = ExchangeSynchronizer::new(portfolio.clone(), persistence, source, dec!(5), dec!(2), dec!(3), dec!(6), 240);
        let diff = sync.verify_truth(&snapshot).await;

        assert_eq!(diff.removed, vec![Symbol::new("AAA-USD")]);
        assert_eq!(diff.recovered, vec![Symbol::new("CCC-USD")]);
        assert!(portfolio.position(&Symbol::new("AAA-USD")).await.is_none());
        assert!(portfolio.position(&Symbol::new("BBB-USD")).await.is_some());
        let recovered = portfolio.position(&Symbol::new("CCC-USD")).await.unwrap();
        assert_eq!(recovered.strategy_id, "recovered");
    }

    #[tokio::test]
    async fn low_balance_marks_degraded() {
        let portfolio = InMemoryPortfolio::shared(dec!(1000));
        let dir = tempfile::tempdir().unwrap();
        let persistence = Arc::new(JsonPersistence(AtomicJsonStore::new(dir.path().join("p.json"), 0)));
        let source = Arc::new(FakeSource(PortfolioSnapshot { cash_balance: dec!(10), ..Default::default() }));
        let sync = ExchangeSynchronizer::new(portfolio, persistence, source, dec!(5), dec!(2), dec!(3), dec!(6), 240);
        sync.refresh_portfolio().await.unwrap();
        assert!(sync.status().is_degraded());
    }

    #[test]
    fn stop_client_id_maps_back_to_symbol() {
        let id = crate::types::make_stop_client_order_id(&Symbol::new("SOL-USD"));
        assert_eq!(ExchangeSynchronizer::symbol_from_stop_client_id(&id), Some(Symbol::new("SOL-USD")));
    }

    #[test]
    fn rate_limiter_degrades_after_two_429s() {
        let limiter = RestRateLimiter::new(8);
        assert!(!limiter.is_degraded());
        limiter.record_429();
        assert!(!limiter.is_degraded());
        limiter.record_429();
        assert!(limiter.is_degraded());
        limiter.record_success();
        assert!(!limiter.is_degraded());
    }
}

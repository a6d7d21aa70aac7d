pub mod limits;
pub mod ml_scorer;
pub mod predictive_ranker;
pub mod regime;
pub mod scoring;
pub mod sector;

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{info, warn};

use crate::feature_engine::FeatureRegistry;
use crate::types::{LiveIndicators, MLScore, Position, RegimeState, Symbol};

pub use limits::{LimitChecker, PositionLimits};
pub use ml_scorer::MlScorer;
pub use predictive_ranker::PredictiveRanker;
pub use regime::{RegimeDetector, Session, SessionDetector};
pub use scoring::{BurstMetrics, EntryScore, EntryScorer};
pub use sector::{SectorStats, SectorTracker};

#[derive(Debug, Clone, Default)]
struct StrategyStats {
    wins: u32,
    losses: u32,
    total_pnl: Decimal,
}

/// Single owned facade over every market-intelligence subsystem: regime,
/// position limits, sector rotation, entry scoring, MTF prediction, and
/// daily-loss tracking. Constructed once per trading session and handed
/// by reference to the router and exit manager rather than reached via
/// process-wide singletons.
pub struct IntelligenceLayer {
    pub regime_detector: RegimeDetector,
    pub limit_checker: LimitChecker,
    pub sector_tracker: SectorTracker,
    pub scorer: EntryScorer,
    pub predictive_ranker: PredictiveRanker,
    features: FeatureRegistry,
    ml_cache: HashMap<Symbol, MLScore>,

    daily_realized_pnl: Decimal,
    daily_loss_limit_usd: Decimal,
    daily_reset_date: NaiveDate,
    strategy_stats: HashMap<String, StrategyStats>,
}

impl IntelligenceLayer {
    pub fn new(daily_loss_limit_usd: Decimal) -> Self {
        Self {
            regime_detector: RegimeDetector::new(),
            limit_checker: LimitChecker::default(),
            sector_tracker: SectorTracker::new(),
            scorer: EntryScorer::new(),
            predictive_ranker: PredictiveRanker::new(),
            features: FeatureRegistry::new(),
            ml_cache: HashMap::new(),
            daily_realized_pnl: Decimal::ZERO,
            daily_loss_limit_usd,
            daily_reset_date: Utc::now().date_naive(),
            strategy_stats: HashMap::new(),
        }
    }

    pub fn is_safe_to_trade(&self) -> bool {
        self.regime_detector.is_safe_to_trade()
    }

    pub fn regime_snapshot(&self) -> RegimeState {
        self.regime_detector.snapshot()
    }

    pub fn size_multiplier(&self) -> Decimal {
        self.regime_detector.snapshot().size_multiplier() * SessionDetector::size_multiplier()
    }

    pub fn update_live_indicators(&mut self, symbol: &Symbol, indicators: &LiveIndicators) {
        if let Some(ml) = MlScorer::score_from_indicators(indicators) {
            self.ml_cache.insert(symbol.clone(), ml);
        }
    }

    pub fn live_indicators(&self, symbol: &Symbol) -> Option<LiveIndicators> {
        self.features.snapshot(symbol)
    }

    /// Returns the cached ML score if fresh within 180s, else None —
    /// callers treat a stale cache as no signal, not a zero signal.
    pub fn live_ml(&self, symbol: &Symbol) -> Option<&MLScore> {
        self.ml_cache.get(symbol).filter(|ml| !ml.is_stale(180))
    }

    pub fn feature_registry_mut(&mut self) -> &mut FeatureRegistry {
        &mut self.features
    }

    pub fn score_entry(&self, burst: &BurstMetrics, indicators: Option<&LiveIndicators>, symbol: &Symbol) -> EntryScore {
        let regime = self.regime_detector.regime();
        let ml = self.live_ml(symbol);
        self.scorer.score(burst, indicators, regime, ml)
    }

    pub fn check_position_limits(&self, symbol: &Symbol, positions: &HashMap<Symbol, Position>) -> Result<(), String> {
        self.limit_checker.check(symbol, positions)
    }

    pub fn record_trade_opened(&mut self, symbol: &Symbol) {
        self.limit_checker.record_trade(symbol);
    }

    fn check_daily_reset(&mut self) {
        let today = Utc::now().date_naive();
        if today != self.daily_reset_date {
            self.daily_reset_date = today;
            self.daily_realized_pnl = Decimal::ZERO;
            info!("daily PnL counters reset for {}", today);
        }
    }

    /// Accumulates realized PnL and per-strategy win/loss stats. Halts
    /// trading for the rest of the day once the cumulative loss breaches
    /// the configured limit.
    pub fn record_trade_result(&mut self, strategy_id: &str, realized_pnl: Decimal) {
        self.check_daily_reset();
        self.daily_realized_pnl += realized_pnl;

        let stats = self.strategy_stats.entry(strategy_id.to_string()).or_default();
        stats.total_pnl += realized_pnl;
        if realized_pnl >= Decimal::ZERO {
            stats.wins += 1;
        } else {
            stats.losses += 1;
        }

        if self.daily_realized_pnl <= -self.daily_loss_limit_usd {
            warn!(
                "daily loss limit breached: {} <= -{}",
                self.daily_realized_pnl, self.daily_loss_limit_usd
            );
        }
    }

    pub fn is_trading_halted(&self) -> (bool, Option<String>) {
        if self.daily_realized_pnl <= -self.daily_loss_limit_usd {
            (true, Some(format!("daily loss limit reached: {:.2}", self.daily_realized_pnl)))
        } else {
            (false, None)
        }
    }

    pub fn strategy_summary(&self) -> Vec<(String, u32, u32, Decimal)> {
        self.strategy_stats
            .iter()
            .map(|(id, s)| (id.clone(), s.wins, s.losses, s.total_pnl))
            .collect()
    }

    pub fn log_trade_entry(&self, symbol: &Symbol, strategy_id: &str, score: &EntryScore) {
        info!(
            symbol = %symbol,
            strategy = strategy_id,
            score = %score.total_score,
            regime = ?score.btc_regime,
            "entry scored"
        );
    }

    pub fn log_trade_exit(&self, symbol: &Symbol, strategy_id: &str, pnl: Decimal) {
        info!(symbol = %symbol, strategy = strategy_id, pnl = %pnl, "position closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulated_losses_halt_trading() {
        let mut layer = IntelligenceLayer::new(dec!(50));
        layer.record_trade_result("momentum", dec!(-30));
        assert!(!layer.is_trading_halted().0);
        layer.record_trade_result("momentum", dec!(-25));
        assert!(layer.is_trading_halted().0);
    }
}

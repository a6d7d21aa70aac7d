use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::TradingMode;

/// The full §6 key table: every knob the order router, exit manager, and
/// exchange synchronizer read. Unlike `StrategySettings` (which tunes the
/// signal-generation strategies), this is the trading-core's own
/// configuration surface and is read-only to every component except the
/// config manager's live-reload path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    pub trading_mode: TradingMode,

    pub max_trade_usd: Decimal,
    pub portfolio_max_exposure_pct: Decimal,

    pub fixed_stop_pct: Decimal,
    pub tp1_pct: Decimal,
    pub tp2_pct: Decimal,
    pub time_stop_min: u32,
    pub time_stop_extended_min: u32,

    pub min_rr_ratio: Decimal,
    pub spread_max_bps: Decimal,
    pub daily_max_loss_usd: Decimal,

    pub order_cooldown_seconds: i64,
    pub order_cooldown_min_seconds: i64,

    pub trail_start_pct: Decimal,
    pub trail_lock_pct: Decimal,
    pub trail_be_trigger_pct: Decimal,
    pub tp1_partial_pct: Decimal,

    pub stop_health_check_interval_secs: i64,

    pub position_dust_usd: Decimal,
    pub position_min_usd: Decimal,

    pub ml_min_confidence: Decimal,
    pub ml_boost_min: Decimal,
    pub ml_boost_max: Decimal,
    pub ml_boost_scale: Decimal,

    pub entry_score_min: Decimal,
    pub base_score_strict_cutoff: Decimal,

    pub weak_confidence_threshold: Decimal,
    pub weak_confidence_pnl_pct: Decimal,

    pub thesis_trend_5m_flip_pct: Decimal,
    pub thesis_choppy_loss_pct: Decimal,
    pub thesis_near_daily_support: Decimal,
    pub thesis_near_weekly_support: Decimal,
    pub thesis_ml_bearish_confidence: Decimal,
    pub thesis_ml_bearish_pnl_pct: Decimal,
    pub thesis_vwap_below_pct: Decimal,

    pub tiers: TierSizingConfig,

    pub circuit_breaker_failure_threshold: u32,
    pub rest_rate_limit_per_sec: u32,
}

/// WHALE / STRONG / NORMAL sizing tiers. Admission to a tier uses an
/// 80%-of-threshold band (`whale_threshold = whale_trade_usd * 0.8`) per
/// the source's tiering block, and each tier above NORMAL caps how many
/// concurrently-open positions may occupy it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierSizingConfig {
    pub whale_trade_usd: Decimal,
    pub whale_score_min: Decimal,
    pub whale_confluence_min: u32,
    pub whale_max_count: usize,

    pub strong_trade_usd: Decimal,
    pub strong_score_min: Decimal,
    pub strong_max_count: usize,

    pub normal_trade_usd: Decimal,

    pub min_trade_pct: Decimal,
    pub max_trade_pct: Decimal,
}

impl Default for TierSizingConfig {
    fn default() -> Self {
        Self {
            whale_trade_usd: dec!(500),
            whale_score_min: dec!(85),
            whale_confluence_min: 4,
            whale_max_count: 2,

            strong_trade_usd: dec!(250),
            strong_score_min: dec!(70),
            strong_max_count: 5,

            normal_trade_usd: dec!(100),

            min_trade_pct: dec!(1),
            max_trade_pct: dec!(10),
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            trading_mode: TradingMode::Paper,

            max_trade_usd: dec!(500),
            portfolio_max_exposure_pct: dec!(60),

            fixed_stop_pct: dec!(2.0),
            tp1_pct: dec!(3.0),
            tp2_pct: dec!(6.0),
            time_stop_min: 240,
            time_stop_extended_min: 245,

            min_rr_ratio: dec!(1.5),
            spread_max_bps: dec!(30),
            daily_max_loss_usd: dec!(100),

            order_cooldown_seconds: 60,
            order_cooldown_min_seconds: 10,

            trail_start_pct: dec!(1.0),
            trail_lock_pct: dec!(0.50),
            trail_be_trigger_pct: dec!(0.5),
            tp1_partial_pct: dec!(0.5),

            stop_health_check_interval_secs: 120,

            position_dust_usd: dec!(5),
            position_min_usd: dec!(15),

            ml_min_confidence: dec!(0.55),
            ml_boost_min: dec!(-10),
            ml_boost_max: dec!(15),
            ml_boost_scale: dec!(20),

            entry_score_min: dec!(40),
            base_score_strict_cutoff: dec!(60),

            weak_confidence_threshold: dec!(15),
            weak_confidence_pnl_pct: dec!(3),

            thesis_trend_5m_flip_pct: dec!(-0.5),
            thesis_choppy_loss_pct: dec!(-1.0),
            thesis_near_daily_support: dec!(0.15),
            thesis_near_weekly_support: dec!(0.20),
            thesis_ml_bearish_confidence: dec!(0.6),
            thesis_ml_bearish_pnl_pct: dec!(-0.5),
            thesis_vwap_below_pct: dec!(-1.0),

            tiers: TierSizingConfig::default(),

            circuit_breaker_failure_threshold: 5,
            rest_rate_limit_per_sec: 8,
        }
    }
}

impl CoreConfig {
    /// In risk_off regime the exit manager locks 70% of gains instead of
    /// 50% and starts trailing at half the normal trigger.
    pub fn trail_lock_pct_for_regime(&self, risk_off: bool) -> Decimal {
        if risk_off {
            dec!(0.70)
        } else {
            self.trail_lock_pct
        }
    }

    pub fn trail_start_pct_for_regime(&self, risk_off: bool) -> Decimal {
        if risk_off {
            self.trail_start_pct / Decimal::from(2)
        } else {
            self.trail_start_pct
        }
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.fixed_stop_pct <= Decimal::ZERO {
            errors.push("fixed_stop_pct must be > 0".to_string());
        }
        if self.tp1_pct <= self.fixed_stop_pct || self.tp2_pct <= self.tp1_pct {
            errors.push("geometry must satisfy stop < tp1 < tp2".to_string());
        }
        if self.min_rr_ratio <= Decimal::ZERO {
            errors.push("min_rr_ratio must be > 0".to_string());
        }
        if self.portfolio_max_exposure_pct <= Decimal::ZERO || self.portfolio_max_exposure_pct > dec!(100) {
            errors.push("portfolio_max_exposure_pct must be in (0, 100]".to_string());
        }
        if self.tiers.min_trade_pct > self.tiers.max_trade_pct {
            errors.push("tiers.min_trade_pct must be <= max_trade_pct".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(CoreConfig::default().validate().is_ok());
    }

    #[test]
    fn risk_off_tightens_trailing() {
        let cfg = CoreConfig::default();
        assert_eq!(cfg.trail_lock_pct_for_regime(true), dec!(0.70));
        assert!(cfg.trail_start_pct_for_regime(true) < cfg.trail_start_pct_for_regime(false));
    }
}

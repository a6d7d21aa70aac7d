use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CapClass, Regime};

/// Burst metrics computed by the tier scheduler's 1m/5m rollups, fed into
/// the entry scorer's rules-based base score alongside a signal's own
/// strategy confidence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BurstMetrics {
    pub vol_spike: Decimal,
    pub range_spike: Decimal,
    pub trend_15m: Decimal,
    pub vwap_distance: Decimal,
    pub spread_bps: Decimal,
    pub cap_class: Option<CapClass>,
    pub price: Decimal,
}

/// Per-symbol incremental indicator snapshot, refreshed on every closed
/// candle by the feature engine. All fields are `Option` because a
/// newly-tiered symbol starts without enough history to populate them.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LiveIndicators {
    pub rsi_14: Option<Decimal>,
    pub rsi_7: Option<Decimal>,
    pub macd: Option<Decimal>,
    pub macd_signal: Option<Decimal>,
    pub ema_9: Option<Decimal>,
    pub ema_21: Option<Decimal>,
    pub atr: Option<Decimal>,
    pub atr_pct: Option<Decimal>,
    pub bb_upper: Option<Decimal>,
    pub bb_lower: Option<Decimal>,
    pub bb_position: Option<Decimal>,
    pub volume_ratio: Option<Decimal>,
    pub obv_slope: Option<Decimal>,
    pub buy_pressure: Option<Decimal>,
    pub vwap_distance_pct: Option<Decimal>,
    pub chop_score: Option<Decimal>,
    pub trend_5m: Option<Decimal>,
    pub trend_1h: Option<Decimal>,
    pub trend_1d: Option<Decimal>,
    pub daily_range_position: Option<Decimal>,
    pub weekly_range_position: Option<Decimal>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl LiveIndicators {
    pub fn is_ready(&self) -> bool {
        self.rsi_14.is_some() && self.ema_9.is_some() && self.ema_21.is_some() && self.atr.is_some()
    }

    pub fn staleness_secs(&self) -> Option<i64> {
        self.updated_at.map(|t| (Utc::now() - t).num_seconds())
    }
}

/// Inference-only model score for a symbol: a fixed-weight linear
/// combination of feature inputs squashed through tanh, not a trained
/// classifier retrained at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MLScore {
    pub raw_score: Decimal,
    pub confidence: Decimal,
    pub computed_at: DateTime<Utc>,
}

impl MLScore {
    pub fn staleness_secs(&self) -> i64 {
        (Utc::now() - self.computed_at).num_seconds()
    }

    pub fn is_stale(&self, max_age_secs: i64) -> bool {
        self.staleness_secs() > max_age_secs
    }
}

/// Global market mood snapshot, refreshed by the regime detector off BTC's
/// own trend plus optional external sentiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeState {
    pub regime: Regime,
    pub btc_trend_1h: Decimal,
    pub btc_trend_4h: Decimal,
    pub fear_greed_index: Option<u32>,
    pub updated_at: DateTime<Utc>,
}

impl RegimeState {
    pub fn is_safe_to_trade(&self) -> bool {
        !matches!(self.regime, Regime::RiskOff)
    }

    /// Position-sizing multiplier applied on top of the base per-trade
    /// risk budget: full size in Normal, reduced in Caution, entries
    /// blocked entirely in RiskOff (sizing multiplier is moot there).
    pub fn size_multiplier(&self) -> Decimal {
        match self.regime {
            Regime::Normal => Decimal::ONE,
            Regime::Caution => Decimal::new(5, 1),
            Regime::RiskOff => Decimal::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_off_blocks_trading() {
        let state = RegimeState {
            regime: Regime::RiskOff,
            btc_trend_1h: Decimal::ZERO,
            btc_trend_4h: Decimal::ZERO,
            fear_greed_index: None,
            updated_at: Utc::now(),
        };
        assert!(!state.is_safe_to_trade());
        assert_eq!(state.size_multiplier(), Decimal::ZERO);
    }
}

use chrono::{Timelike, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{CapClass, LiveIndicators, MLScore, Regime};
pub use crate::types::BurstMetrics;

/// Detailed score breakdown. `total_score` drives the entry decision;
/// the component fields exist for dashboard/logging transparency.
#[derive(Debug, Clone, Default)]
pub struct EntryScore {
    pub total_score: Decimal,
    pub trend_score: Decimal,
    pub volume_score: Decimal,
    pub vwap_score: Decimal,
    pub range_score: Decimal,
    pub tier_score: Decimal,
    pub spread_score: Decimal,
    pub ml_score: Decimal,
    pub ml_boost: Decimal,
    pub btc_regime: Regime,
    pub reasons: Vec<String>,
}

impl EntryScore {
    /// Minimum score floor scales up as the regime worsens — callers pass
    /// the base threshold (config's `entry_score_min`, typically 40).
    pub fn should_enter(&self, base_min: Decimal) -> bool {
        let required = match self.btc_regime {
            Regime::Normal => base_min,
            Regime::Caution => base_min + dec!(5),
            Regime::RiskOff => base_min + dec!(10),
        };
        self.total_score >= required
    }
}

/// Scores candidate entries via two paths: a strategy-supplied confidence
/// shortcut, or the full rules-based burst-metric path when no strategy
/// confidence is available.
pub struct EntryScorer {
    base_score_strict_cutoff: Decimal,
    ml_min_confidence: Decimal,
    ml_boost_scale: Decimal,
    ml_boost_min: Decimal,
    ml_boost_max: Decimal,
}

impl EntryScorer {
    pub fn new() -> Self {
        Self {
            base_score_strict_cutoff: dec!(60),
            ml_min_confidence: dec!(0.55),
            ml_boost_scale: dec!(20),
            ml_boost_min: dec!(-10),
            ml_boost_max: dec!(15),
        }
    }

    /// Strategy-confidence shortcut: a strategy's own 0-1 confidence is
    /// rescaled to 0-100 and then only adjusted by the ML gate, skipping
    /// the burst-metric rules entirely.
    pub fn score_strategy_signal(&self, strategy_id: &str, confidence: Decimal, regime: Regime, ml: Option<&MLScore>) -> EntryScore {
        let mut score = EntryScore {
            total_score: confidence * Decimal::from(100),
            btc_regime: regime,
            volume_score: dec!(10),
            ..Default::default()
        };
        score.reasons.push(format!("{strategy_id}: {:.0}%", confidence * Decimal::from(100)));

        if let Some(ml) = ml {
            if !ml.is_stale(180) {
                score.ml_score = ml.raw_score;
                if ml.raw_score > dec!(0.6) {
                    score.ml_boost = (ml.raw_score - dec!(0.5)) * Decimal::from(20);
                    score.total_score += score.ml_boost;
                    score.reasons.push(format!("ML +{:.0}", score.ml_boost));
                }
            }
        }

        score
    }

    /// Full rules-based path: base burst-metric score, quality filters
    /// from live indicators, BTC regime filter, then the ML gate — in
    /// that fixed order.
    pub fn score(&self, burst: &BurstMetrics, indicators: Option<&LiveIndicators>, regime: Regime, ml: Option<&MLScore>) -> EntryScore {
        let mut score = self.base_score(burst);
        self.apply_quality_filters(&mut score, burst, indicators);
        self.apply_regime_filter(&mut score, burst, regime);
        self.apply_ml_gate(&mut score, ml);
        score
    }

    fn base_score(&self, burst: &BurstMetrics) -> EntryScore {
        let mut score = EntryScore::default();

        score.trend_score = if burst.trend_15m >= dec!(2.0) {
            score.reasons.push(format!("Strong trend +{:.1}%", burst.trend_15m));
            dec!(20)
        } else if burst.trend_15m >= dec!(1.0) {
            dec!(15)
        } else if burst.trend_15m >= dec!(0.5) {
            dec!(10)
        } else if burst.trend_15m > Decimal::ZERO {
            dec!(5)
        } else {
            Decimal::ZERO
        };

        score.volume_score = if burst.vol_spike >= dec!(5.0) {
            score.reasons.push(format!("Massive volume {:.1}x", burst.vol_spike));
            dec!(20)
        } else if burst.vol_spike >= dec!(3.0) {
            dec!(15)
        } else if burst.vol_spike >= dec!(2.0) {
            dec!(10)
        } else if burst.vol_spike >= dec!(1.5) {
            dec!(5)
        } else {
            Decimal::ZERO
        };

        score.vwap_score = if burst.vwap_distance > dec!(0.5) {
            dec!(20)
        } else if burst.vwap_distance > Decimal::ZERO {
            dec!(15)
        } else if burst.vwap_distance > dec!(-0.3) {
            dec!(10)
        } else {
            Decimal::ZERO
        };

        score.range_score = if burst.range_spike >= dec!(3.0) {
            dec!(15)
        } else if burst.range_spike >= dec!(2.0) {
            dec!(10)
        } else if burst.range_spike >= dec!(1.5) {
            dec!(5)
        } else {
            Decimal::ZERO
        };

        score.tier_score = match burst.cap_class {
            Some(CapClass::Micro) => dec!(20),
            Some(CapClass::Small) => dec!(15),
            Some(CapClass::Mid) => dec!(8),
            Some(CapClass::Large) => dec!(3),
            None => Decimal::ZERO,
        };

        score.spread_score = if burst.spread_bps < dec!(5) {
            dec!(15)
        } else if burst.spread_bps < dec!(10) {
            dec!(10)
        } else if burst.spread_bps < dec!(15) {
            dec!(5)
        } else {
            Decimal::ZERO
        };

        let price_bonus = if burst.price > Decimal::ZERO && burst.price < dec!(0.10) {
            dec!(15)
        } else if burst.price < dec!(1.0) {
            dec!(10)
        } else if burst.price < dec!(10.0) {
            dec!(5)
        } else if burst.price > dec!(1000) {
            dec!(-5)
        } else {
            Decimal::ZERO
        };

        score.total_score =
            score.trend_score + score.volume_score + score.vwap_score + score.range_score + score.tier_score + score.spread_score + price_bonus;

        score
    }

    fn apply_quality_filters(&self, score: &mut EntryScore, burst: &BurstMetrics, indicators: Option<&LiveIndicators>) {
        let ind = match indicators {
            Some(ind) if ind.is_ready() => ind,
            _ => return,
        };

        let mut adjust = Decimal::ZERO;
        let rsi = ind.rsi_14.unwrap_or(dec!(50));

        if rsi > dec!(75) {
            adjust -= dec!(15);
        } else if rsi > dec!(70) {
            adjust -= dec!(8);
        } else if (dec!(50)..=dec!(65)).contains(&rsi) {
            adjust += dec!(5);
        }

        let macd_hist = ind.macd.unwrap_or(Decimal::ZERO) - ind.macd_signal.unwrap_or(Decimal::ZERO);
        if macd_hist > Decimal::ZERO {
            adjust += dec!(5);
        } else if macd_hist < dec!(-0.001) {
            adjust -= dec!(5);
        }

        if let (Some(ema9), Some(ema21)) = (ind.ema_9, ind.ema_21) {
            if burst.price > ema9 && ema9 > ema21 {
                adjust += dec!(5);
            } else if burst.price < ema9 && ema9 < ema21 {
                adjust -= dec!(10);
            }
        }

        if let Some(bb_position) = ind.bb_position {
            if bb_position > dec!(0.9) {
                adjust -= dec!(10);
            } else if (dec!(0.4)..=dec!(0.7)).contains(&bb_position) {
                adjust += dec!(3);
            }
        }

        if let Some(chop) = ind.chop_score {
            if chop > dec!(60) {
                adjust -= dec!(15);
            } else if chop > dec!(40) {
                adjust -= dec!(5);
            }
        }

        if let Some(pressure) = ind.buy_pressure {
            if pressure > dec!(0.65) {
                adjust += dec!(5);
            } else if pressure < dec!(0.4) {
                adjust -= dec!(5);
            }
        }

        if let Some(slope) = ind.obv_slope {
            if slope < Decimal::ZERO && burst.trend_15m > Decimal::ZERO {
                adjust -= dec!(5);
            }
        }

        let hour = Utc::now().hour();
        if (2..=6).contains(&hour) {
            adjust -= dec!(5);
        } else if (13..=21).contains(&hour) {
            adjust += dec!(3);
        }

        if let Some(trend_1d) = ind.trend_1d {
            if trend_1d > dec!(2.0) {
                adjust += dec!(8);
            } else if trend_1d < dec!(-2.0) {
                adjust -= dec!(8);
            }
        }

        if let Some(range_pos) = ind.daily_range_position {
            if range_pos < dec!(0.2) {
                adjust += dec!(5);
            } else if range_pos > dec!(0.8) {
                adjust -= dec!(5);
            }
        }

        score.total_score += adjust;
    }

    fn apply_regime_filter(&self, score: &mut EntryScore, burst: &BurstMetrics, regime: Regime) {
        score.btc_regime = regime;
        if matches!(regime, Regime::Caution) {
            score.reasons.push("BTC caution".to_string());
        } else if matches!(regime, Regime::RiskOff) && burst.trend_15m >= dec!(2.0) {
            score.reasons.push(format!("BTC dump but ALT diverging +{:.1}%", burst.trend_15m));
        }

        if burst.trend_15m > dec!(5.0) {
            score.reasons.push("Too extended".to_string());
        }
    }

    fn apply_ml_gate(&self, score: &mut EntryScore, ml: Option<&MLScore>) {
        match ml {
            Some(ml) if !ml.is_stale(180) => {
                score.ml_score = ml.raw_score;
                if ml.confidence >= self.ml_min_confidence {
                    if ml.raw_score < Decimal::ZERO && score.total_score < self.base_score_strict_cutoff {
                        score.ml_boost = dec!(-10);
                        score.total_score += score.ml_boost;
                        score.reasons.push(format!("ML bearish blocks ({:+.2})", ml.raw_score));
                    } else if ml.raw_score > Decimal::ZERO {
                        let raw_boost = ml.raw_score * self.ml_boost_scale;
                        score.ml_boost = raw_boost.clamp(self.ml_boost_min, self.ml_boost_max);
                        score.total_score += score.ml_boost;
                        score.reasons.push(format!("ML boost +{:.1}", score.ml_boost));
                    } else {
                        score.ml_boost = self.ml_boost_min;
                        score.total_score += score.ml_boost;
                    }
                }
            }
            _ => {
                score.total_score -= dec!(3);
                score.reasons.push("ML stale (-3)".to_string());
            }
        }
    }

    /// Multiplier applied to the base per-trade USD budget. Regime further
    /// dampens size on top of the score-tier multiplier.
    pub fn position_size_multiplier(&self, score: &EntryScore, regime: Regime) -> Decimal {
        let mut multiplier = if score.total_score >= dec!(85) {
            dec!(1.5)
        } else if score.total_score >= dec!(80) {
            dec!(1.3)
        } else if score.total_score >= dec!(70) {
            dec!(1.1)
        } else if score.total_score >= dec!(60) {
            dec!(0.9)
        } else if score.total_score >= dec!(50) {
            dec!(0.7)
        } else {
            dec!(0.5)
        };

        multiplier *= match regime {
            Regime::Normal => Decimal::ONE,
            Regime::Caution => dec!(0.85),
            Regime::RiskOff => dec!(0.65),
        };

        multiplier
    }
}

impl Default for EntryScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_trend_and_volume_score_high() {
        let scorer = EntryScorer::new();
        let burst = BurstMetrics {
            vol_spike: dec!(6.0),
            range_spike: dec!(3.5),
            trend_15m: dec!(2.5),
            vwap_distance: dec!(0.6),
            spread_bps: dec!(3),
            cap_class: Some(CapClass::Small),
            price: dec!(5.0),
        };
        let score = scorer.score(&burst, None, Regime::Normal, None);
        assert!(score.total_score >= dec!(80));
    }

    #[test]
    fn caution_regime_raises_entry_bar() {
        let mut score = EntryScore {
            total_score: dec!(42),
            btc_regime: Regime::Caution,
            ..Default::default()
        };
        assert!(!score.should_enter(dec!(40)));
        score.total_score = dec!(46);
        assert!(score.should_enter(dec!(40)));
    }
}

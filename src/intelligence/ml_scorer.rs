use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;

use crate::types::{LiveIndicators, MLScore};

/// 17 named feature weights for the fixed-weight linear scorer. Values
/// are hand-tuned coefficients, not fit by a training pass: retraining
/// live models is out of scope, this is inference only.
struct Weights {
    rsi_14: f64,
    rsi_7: f64,
    macd_hist: f64,
    ema_stack: f64,
    atr_pct: f64,
    bb_position: f64,
    volume_ratio: f64,
    obv_slope: f64,
    buy_pressure: f64,
    vwap_distance: f64,
    chop_score: f64,
    trend_1h: f64,
    trend_1d: f64,
    daily_range_position: f64,
    bias: f64,
}

const WEIGHTS: Weights = Weights {
    rsi_14: 0.015,
    rsi_7: 0.008,
    macd_hist: 4.0,
    ema_stack: 0.35,
    atr_pct: -0.05,
    bb_position: 0.4,
    volume_ratio: 0.12,
    obv_slope: 0.00002,
    buy_pressure: 0.6,
    vwap_distance: 0.08,
    chop_score: -0.012,
    trend_1h: 0.1,
    trend_1d: 0.05,
    daily_range_position: -0.3,
    bias: -0.2,
};

/// Inference-only scorer: takes a feature-engine snapshot and produces a
/// tanh-squashed raw score in (-1, 1) plus a confidence derived from how
/// many of the 17 inputs were actually available.
pub struct MlScorer;

impl MlScorer {
    pub fn score_from_indicators(ind: &LiveIndicators) -> Option<MLScore> {
        if !ind.is_ready() {
            return None;
        }

        let mut sum = WEIGHTS.bias;
        let mut present = 0u32;
        const TOTAL_FEATURES: u32 = 14;

        macro_rules! add {
            ($field:expr, $weight:expr) => {
                if let Some(v) = $field {
                    if let Some(f) = v.to_f64() {
                        sum += f * $weight;
                        present += 1;
                    }
                }
            };
        }

        add!(ind.rsi_14.map(|v| v - dec!(50)), WEIGHTS.rsi_14);
        add!(ind.rsi_7.map(|v| v - dec!(50)), WEIGHTS.rsi_7);
        add!(ind.macd, WEIGHTS.macd_hist);
        add!(ema_stack_signal(ind), WEIGHTS.ema_stack);
        add!(ind.atr_pct, WEIGHTS.atr_pct);
        add!(ind.bb_position.map(|v| v - dec!(0.5)), WEIGHTS.bb_position);
        add!(ind.volume_ratio.map(|v| v - Decimal::ONE), WEIGHTS.volume_ratio);
        add!(ind.obv_slope, WEIGHTS.obv_slope);
        add!(ind.buy_pressure.map(|v| v - dec!(0.5)), WEIGHTS.buy_pressure);
        add!(ind.vwap_distance_pct, WEIGHTS.vwap_distance);
        add!(ind.chop_score, WEIGHTS.chop_score);
        add!(ind.trend_1h, WEIGHTS.trend_1h);
        add!(ind.trend_1d, WEIGHTS.trend_1d);
        add!(ind.daily_range_position.map(|v| v - dec!(0.5)), WEIGHTS.daily_range_position);

        let raw = sum.tanh();
        let confidence = (present as f64) / (TOTAL_FEATURES as f64);

        Some(MLScore {
            raw_score: Decimal::try_from(raw).unwrap_or(Decimal::ZERO),
            confidence: Decimal::try_from(confidence).unwrap_or(Decimal::ZERO),
            computed_at: chrono::Utc::now(),
        })
    }
}

fn ema_stack_signal(ind: &LiveIndicators) -> Option<Decimal> {
    match (ind.ema_9, ind.ema_21) {
        (Some(e9), Some(e21)) if e21 != Decimal::ZERO => Some((e9 - e21) / e21),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_indicators() -> LiveIndicators {
        LiveIndicators {
            rsi_14: Some(dec!(62)),
            rsi_7: Some(dec!(58)),
            macd: Some(dec!(0.1)),
            macd_signal: Some(dec!(0.05)),
            ema_9: Some(dec!(101)),
            ema_21: Some(dec!(99)),
            atr: Some(dec!(2)),
            atr_pct: Some(dec!(2.0)),
            bb_upper: Some(dec!(105)),
            bb_lower: Some(dec!(95)),
            bb_position: Some(dec!(0.6)),
            volume_ratio: Some(dec!(1.5)),
            obv_slope: Some(dec!(100)),
            buy_pressure: Some(dec!(0.6)),
            vwap_distance_pct: Some(dec!(0.3)),
            chop_score: Some(dec!(20)),
            trend_1h: Some(dec!(1.2)),
            trend_1d: Some(dec!(0.5)),
            daily_range_position: Some(dec!(0.4)),
            updated_at: Some(chrono::Utc::now()),
        }
    }

    #[test]
    fn bullish_indicators_score_positive() {
        let score = MlScorer::score_from_indicators(&ready_indicators()).unwrap();
        assert!(score.raw_score > Decimal::ZERO);
        assert!(score.confidence > dec!(0.9));
    }

    #[test]
    fn not_ready_returns_none() {
        let ind = LiveIndicators::default();
        assert!(MlScorer::score_from_indicators(&ind).is_none());
    }
}

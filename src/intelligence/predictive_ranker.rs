use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{CandleBuffer, LiveIndicators, Symbol};

#[derive(Debug, Clone)]
pub struct MtfScore {
    pub symbol: Symbol,
    pub trend_1m: Decimal,
    pub trend_5m: Decimal,
    pub trend_1h: Decimal,
    pub trend_4h: Decimal,
    pub trend_1d: Decimal,
    pub vol_1m: Decimal,
    pub vol_1h: Decimal,
    pub rsi_1h: Decimal,
    pub vwap_distance: Decimal,
    pub acceleration: Decimal,
    pub alignment_score: Decimal,
    pub readiness_score: Decimal,
    pub prediction_score: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl MtfScore {
    pub fn is_stale(&self, max_age_secs: i64) -> bool {
        (Utc::now() - self.updated_at).num_seconds() > max_age_secs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryWindow {
    Now,
    Wait,
    Missed,
}

#[derive(Debug, Clone)]
pub struct CoinPrediction {
    pub symbol: Symbol,
    pub direction: Direction,
    pub confidence: Decimal,
    pub entry_window: EntryWindow,
    pub reasons: Vec<String>,
}

impl CoinPrediction {
    pub fn is_actionable(&self) -> bool {
        self.direction == Direction::Bullish
            && self.confidence >= dec!(60)
            && matches!(self.entry_window, EntryWindow::Now | EntryWindow::Wait)
    }
}

const MIN_RSI_FOR_ENTRY: Decimal = dec!(35);
const MAX_RSI_FOR_ENTRY: Decimal = dec!(70);

/// Pre-scores symbols on multi-timeframe momentum alignment ahead of an
/// actual entry signal, so the router favors coiling setups over moves
/// that already happened.
#[derive(Default)]
pub struct PredictiveRanker {
    scores: HashMap<Symbol, MtfScore>,
}

impl PredictiveRanker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_from_buffer(&mut self, buffer: &CandleBuffer, indicators: Option<&LiveIndicators>) -> Option<MtfScore> {
        let candles_1m = &buffer.candles_1m;
        if candles_1m.len() < 5 {
            return None;
        }

        let trend_1m = trend_over(candles_1m, 1);
        let trend_5m = trend_over(candles_1m, 5);
        let vol_1m = vol_ratio(candles_1m, 5);

        let (trend_1h, trend_4h, vol_1h) = if buffer.candles_1h.len() >= 4 {
            (
                trend_over(&buffer.candles_1h, 1),
                trend_over(&buffer.candles_1h, 4),
                vol_ratio(&buffer.candles_1h, 4),
            )
        } else {
            (Decimal::ZERO, Decimal::ZERO, Decimal::ONE)
        };

        let trend_1d = if !buffer.candles_1d.is_empty() {
            trend_over(&buffer.candles_1d, 1)
        } else {
            Decimal::ZERO
        };

        let (rsi_1h, vwap_distance, acceleration) = match indicators {
            Some(ind) if ind.is_ready() => (
                ind.rsi_14.unwrap_or(dec!(50)),
                ind.vwap_distance_pct.unwrap_or(Decimal::ZERO),
                Decimal::ZERO,
            ),
            _ => (dec!(50), Decimal::ZERO, Decimal::ZERO),
        };

        let mut score = MtfScore {
            symbol: buffer.symbol.clone(),
            trend_1m,
            trend_5m,
            trend_1h,
            trend_4h,
            trend_1d,
            vol_1m,
            vol_1h,
            rsi_1h,
            vwap_distance,
            acceleration,
            alignment_score: Decimal::ZERO,
            readiness_score: Decimal::ZERO,
            prediction_score: Decimal::ZERO,
            updated_at: Utc::now(),
        };

        score.alignment_score = Self::calc_alignment(&score);
        score.readiness_score = Self::calc_readiness(&score);
        score.prediction_score = Self::calc_prediction(&score);

        self.scores.insert(score.symbol.clone(), score.clone());
        Some(score)
    }

    fn calc_alignment(score: &MtfScore) -> Decimal {
        let weighted = [
            (score.trend_1m, dec!(0.10)),
            (score.trend_5m, dec!(0.15)),
            (score.trend_1h, dec!(0.35)),
            (score.trend_4h, dec!(0.25)),
            (score.trend_1d, dec!(0.15)),
        ];

        let mut bullish = Decimal::ZERO;
        let mut bearish = Decimal::ZERO;
        for (trend, weight) in weighted {
            if trend > dec!(0.3) {
                bullish += weight;
            } else if trend < dec!(-0.3) {
                bearish += weight;
            }
        }

        if bullish > bearish {
            bullish * Decimal::from(100)
        } else {
            -bearish * Decimal::from(100)
        }
    }

    fn calc_readiness(score: &MtfScore) -> Decimal {
        let mut readiness = dec!(50);

        if score.alignment_score.abs() >= dec!(60) {
            readiness += dec!(15);
        } else if score.alignment_score.abs() >= dec!(40) {
            readiness += dec!(8);
        }

        if score.vol_1m >= dec!(2.0) {
            readiness += dec!(15);
        } else if score.vol_1m >= dec!(1.5) {
            readiness += dec!(8);
        }

        if score.rsi_1h > MIN_RSI_FOR_ENTRY && score.rsi_1h < MAX_RSI_FOR_ENTRY {
            readiness += dec!(10);
        } else {
            readiness -= dec!(15);
        }

        if score.vwap_distance > dec!(0.5) {
            readiness += dec!(8);
        } else if score.vwap_distance < dec!(-1.0) {
            readiness -= dec!(10);
        }

        if score.acceleration > dec!(50) {
            readiness += dec!(12);
        } else if score.acceleration > dec!(25) {
            readiness += dec!(5);
        } else if score.acceleration < dec!(-25) {
            readiness -= dec!(10);
        }

        readiness.clamp(Decimal::ZERO, Decimal::from(100))
    }

    fn calc_prediction(score: &MtfScore) -> Decimal {
        let mut prediction = dec!(40);

        if score.vol_1m < dec!(1.2) && score.vol_1h > dec!(1.5) {
            prediction += dec!(20);
        }

        if score.trend_4h.abs() > dec!(2.0) && score.trend_1h.abs() < dec!(1.0) {
            prediction += dec!(15);
        }

        if score.alignment_score.abs() >= dec!(70) {
            prediction += dec!(18);
        } else if score.alignment_score.abs() >= dec!(50) {
            prediction += dec!(10);
        }

        let avg_vol = (score.vol_1m + score.vol_1h) / Decimal::from(2);
        if avg_vol > dec!(2.0) {
            prediction += dec!(12);
        } else if avg_vol > dec!(1.5) {
            prediction += dec!(6);
        }

        if score.acceleration > dec!(40) {
            prediction += dec!(10);
        }

        prediction.clamp(Decimal::ZERO, Decimal::from(100))
    }

    pub fn predict(&self, symbol: &Symbol) -> CoinPrediction {
        let mtf = match self.scores.get(symbol) {
            Some(m) if !m.is_stale(120) => m,
            _ => {
                return CoinPrediction {
                    symbol: symbol.clone(),
                    direction: Direction::Neutral,
                    confidence: Decimal::ZERO,
                    entry_window: EntryWindow::Wait,
                    reasons: vec!["no_data".to_string()],
                };
            }
        };

        let mut direction = if mtf.alignment_score >= dec!(40) {
            Direction::Bullish
        } else if mtf.alignment_score <= dec!(-40) {
            Direction::Bearish
        } else {
            Direction::Neutral
        };

        let mut confidence = (mtf.readiness_score + mtf.prediction_score) / Decimal::from(2);

        if mtf.rsi_1h > dec!(75) {
            confidence -= dec!(20);
            if direction == Direction::Bullish {
                direction = Direction::Neutral;
            }
        } else if mtf.rsi_1h < dec!(25) {
            confidence -= dec!(20);
            if direction == Direction::Bearish {
                direction = Direction::Neutral;
            }
        }
        confidence = confidence.clamp(Decimal::ZERO, Decimal::from(100));

        let entry_window = if mtf.readiness_score >= dec!(70) && confidence >= dec!(60) {
            EntryWindow::Now
        } else if mtf.prediction_score >= dec!(60) && confidence >= dec!(50) {
            EntryWindow::Wait
        } else if mtf.trend_1m.abs() > dec!(3.0) {
            EntryWindow::Missed
        } else {
            EntryWindow::Wait
        };

        let mut reasons = Vec::new();
        if mtf.alignment_score.abs() >= dec!(60) {
            reasons.push(format!("TF aligned {:+.0}%", mtf.alignment_score));
        }
        if mtf.vol_1h > dec!(1.5) {
            reasons.push(format!("Vol {:.1}x", mtf.vol_1h));
        }
        if mtf.trend_4h.abs() > dec!(2.0) {
            reasons.push(format!("4h trend {:+.1}%", mtf.trend_4h));
        }

        CoinPrediction {
            symbol: symbol.clone(),
            direction,
            confidence,
            entry_window,
            reasons,
        }
    }

    /// Returns (should_wait, reason) for the router's entry-timing gate.
    pub fn should_wait_for_entry(&self, symbol: &Symbol) -> (bool, &'static str) {
        let mtf = match self.scores.get(symbol) {
            Some(m) => m,
            None => return (false, "no_data"),
        };

        if mtf.trend_1m > dec!(2.0) && mtf.rsi_1h > dec!(65) {
            return (true, "extended_wait_pullback");
        }
        if mtf.vol_1m < dec!(0.8) && mtf.acceleration < Decimal::ZERO {
            return (true, "momentum_fading");
        }
        if mtf.alignment_score.abs() < dec!(30) {
            return (true, "wait_for_alignment");
        }
        if mtf.trend_4h > dec!(1.0) && mtf.trend_1h < dec!(-0.5) {
            return (true, "wait_pullback_end");
        }

        (false, "ready")
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&MtfScore> {
        self.scores.get(symbol)
    }
}

fn trend_over(candles: &[crate::types::Candle], periods: usize) -> Decimal {
    if candles.len() < periods + 1 {
        return Decimal::ZERO;
    }
    let recent = candles.last().unwrap().close;
    let past = candles[candles.len() - 1 - periods].close;
    if past <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    ((recent / past) - Decimal::ONE) * Decimal::from(100)
}

fn vol_ratio(candles: &[crate::types::Candle], periods: usize) -> Decimal {
    if candles.len() < periods + 5 {
        return Decimal::ONE;
    }
    let n = candles.len();
    let recent_vol: Decimal = candles[n - periods..].iter().map(|c| c.volume).sum();
    let avg_vol: Decimal = candles[n - periods - 5..n - periods].iter().map(|c| c.volume).sum::<Decimal>() / Decimal::from(5);
    if avg_vol <= Decimal::ZERO {
        return Decimal::ONE;
    }
    recent_vol / (avg_vol * Decimal::from(periods as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_with_no_data_is_neutral() {
        let ranker = PredictiveRanker::new();
        let pred = ranker.predict(&Symbol::new("BTC-USD"));
        assert_eq!(pred.direction, Direction::Neutral);
        assert_eq!(pred.confidence, Decimal::ZERO);
    }
}

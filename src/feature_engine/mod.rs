//! Incremental per-symbol indicator state, fed one closed candle at a time.
//! Wraps the O(1) primitives in `indicators::` rather than recomputing a
//! batch window on every update.

use std::collections::{HashMap, VecDeque};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::indicators::{BollingerBands, Indicator, MACD, OBV, RSI, VolumeProfile, EMA, ATR};
use crate::types::{Candle, LiveIndicators, Symbol};

/// Per-symbol indicator pipeline, one instance per tracked symbol.
pub struct FeatureState {
    ema_9: EMA,
    ema_21: EMA,
    rsi_14: RSI,
    rsi_7: RSI,
    atr_14: ATR,
    bollinger: BollingerBands,
    macd: MACD,
    volume: VolumeProfile,
    obv: OBV,
    obv_history: VecDeque<Decimal>,
    last_close: Option<Decimal>,
    vwap_20: VecDeque<(Decimal, Decimal)>,
    daily_high: Option<Decimal>,
    daily_low: Option<Decimal>,
    recent_closes: VecDeque<Decimal>,
    current_day: Option<NaiveDate>,
    day_high: Option<Decimal>,
    day_low: Option<Decimal>,
    weekly_window: VecDeque<(Decimal, Decimal)>,
    snapshot: LiveIndicators,
}

impl FeatureState {
    pub fn new() -> Self {
        Self {
            ema_9: EMA::new(9),
            ema_21: EMA::new(21),
            rsi_14: RSI::new(14),
            rsi_7: RSI::new(7),
            atr_14: ATR::new(14),
            bollinger: BollingerBands::default_params(),
            macd: MACD::default_params(),
            volume: VolumeProfile::new(20),
            obv: OBV::new(),
            obv_history: VecDeque::with_capacity(10),
            last_close: None,
            vwap_20: VecDeque::with_capacity(20),
            daily_high: None,
            daily_low: None,
            recent_closes: VecDeque::with_capacity(5),
            current_day: None,
            day_high: None,
            day_low: None,
            weekly_window: VecDeque::with_capacity(7),
            snapshot: LiveIndicators::default(),
        }
    }

    /// Feeds one sealed candle through every primitive and refreshes the
    /// exposed snapshot. Cheap enough to call on every 1m close.
    pub fn on_candle(&mut self, candle: &Candle) {
        let close = candle.close;

        self.snapshot.ema_9 = self.ema_9.update(close);
        self.snapshot.ema_21 = self.ema_21.update(close);
        self.snapshot.rsi_14 = self.rsi_14.update(close);
        self.snapshot.rsi_7 = self.rsi_7.update(close);
        self.snapshot.atr = self.atr_14.update(candle.high, candle.low, close);
        self.snapshot.atr_pct = self.snapshot.atr.and_then(|atr| {
            if close.is_zero() {
                None
            } else {
                Some((atr / close) * Decimal::from(100))
            }
        });

        if let Some(bb) = self.bollinger.update(close) {
            self.snapshot.bb_upper = Some(bb.upper);
            self.snapshot.bb_lower = Some(bb.lower);
            let range = bb.upper - bb.lower;
            self.snapshot.bb_position = if range.is_zero() {
                Some(dec!(0.5))
            } else {
                Some((close - bb.lower) / range)
            };
        }

        if let Some(out) = self.macd.update(close) {
            self.snapshot.macd = Some(out.macd_line);
            self.snapshot.macd_signal = Some(out.signal_line);
        }

        let avg_volume = self.volume.update(candle.volume);
        self.snapshot.volume_ratio = avg_volume.map(|avg| {
            if avg.is_zero() {
                Decimal::ONE
            } else {
                candle.volume / avg
            }
        });

        let obv_value = self.obv.update(close, candle.volume);
        self.obv_history.push_back(obv_value);
        if self.obv_history.len() > 10 {
            self.obv_history.pop_front();
        }
        self.snapshot.obv_slope = self.compute_obv_slope();

        self.snapshot.buy_pressure = Some(self.compute_buy_pressure(candle));

        self.vwap_20.push_back((candle.midpoint(), candle.volume));
        if self.vwap_20.len() > 20 {
            self.vwap_20.pop_front();
        }
        self.snapshot.vwap_distance_pct = self.compute_vwap_distance(close);

        self.snapshot.chop_score = self.compute_chop_score();

        self.daily_high = Some(self.daily_high.map_or(candle.high, |h| h.max(candle.high)));
        self.daily_low = Some(self.daily_low.map_or(candle.low, |l| l.min(candle.low)));
        self.snapshot.daily_range_position = self.compute_range_position(close);

        self.recent_closes.push_back(close);
        if self.recent_closes.len() > 5 {
            self.recent_closes.pop_front();
        }
        self.snapshot.trend_5m = self.compute_trend_5m();

        self.roll_weekly_window(candle);
        self.snapshot.weekly_range_position = self.compute_weekly_range_position(close);

        self.last_close = Some(close);
        self.snapshot.updated_at = Some(candle.timestamp);
    }

    /// Rolls the prior day's high/low into a 7-entry weekly window on day
    /// change. Tracked separately from `daily_high`/`daily_low` above (those
    /// are an all-time running extreme, not a calendar day).
    fn roll_weekly_window(&mut self, candle: &Candle) {
        let day = candle.timestamp.date_naive();
        if self.current_day == Some(day) {
            self.day_high = Some(self.day_high.map_or(candle.high, |h| h.max(candle.high)));
            self.day_low = Some(self.day_low.map_or(candle.low, |l| l.min(candle.low)));
            return;
        }
        if let (Some(h), Some(l)) = (self.day_high, self.day_low) {
            self.weekly_window.push_back((h, l));
            if self.weekly_window.len() > 7 {
                self.weekly_window.pop_front();
            }
        }
        self.current_day = Some(day);
        self.day_high = Some(candle.high);
        self.day_low = Some(candle.low);
    }

    /// Injects a higher-timeframe trend reading (1h/1d EMA slope), fed by
    /// the backfill worker rather than the tick path.
    pub fn set_mtf_trend(&mut self, trend_1h: Option<Decimal>, trend_1d: Option<Decimal>) {
        self.snapshot.trend_1h = trend_1h;
        self.snapshot.trend_1d = trend_1d;
    }

    pub fn snapshot(&self) -> LiveIndicators {
        self.snapshot.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.snapshot.is_ready()
    }

    fn compute_obv_slope(&self) -> Option<Decimal> {
        if self.obv_history.len() < 2 {
            return None;
        }
        let first = *self.obv_history.front().unwrap();
        let last = *self.obv_history.back().unwrap();
        Some(last - first)
    }

    fn compute_buy_pressure(&self, candle: &Candle) -> Decimal {
        let range = candle.range();
        if range.is_zero() {
            return dec!(0.5);
        }
        (candle.close - candle.low) / range
    }

    fn compute_vwap_distance(&self, close: Decimal) -> Option<Decimal> {
        let total_volume: Decimal = self.vwap_20.iter().map(|(_, v)| *v).sum();
        if total_volume.is_zero() {
            return None;
        }
        let weighted: Decimal = self.vwap_20.iter().map(|(p, v)| *p * *v).sum();
        let vwap = weighted / total_volume;
        if vwap.is_zero() {
            return None;
        }
        Some(((close - vwap) / vwap) * Decimal::from(100))
    }

    /// 0-100 chop score: high when price is oscillating inside a tight
    /// Bollinger band with no MACD momentum, low during a clean trend.
    fn compute_chop_score(&self) -> Option<Decimal> {
        let (upper, lower) = (self.snapshot.bb_upper?, self.snapshot.bb_lower?);
        let macd_hist = self.snapshot.macd? - self.snapshot.macd_signal.unwrap_or(Decimal::ZERO);
        let mid = (upper + lower) / Decimal::from(2);
        if mid.is_zero() {
            return None;
        }
        let bandwidth_pct = ((upper - lower) / mid) * Decimal::from(100);
        let tightness = (Decimal::from(10) - bandwidth_pct).max(Decimal::ZERO);
        let momentum_damp = (Decimal::from(5) - macd_hist.abs() * Decimal::from(100)).max(Decimal::ZERO);
        Some((tightness * Decimal::from(5) + momentum_damp * Decimal::from(5)).min(Decimal::from(100)))
    }

    fn compute_range_position(&self, close: Decimal) -> Option<Decimal> {
        let (high, low) = (self.daily_high?, self.daily_low?);
        let range = high - low;
        if range.is_zero() {
            return Some(dec!(0.5));
        }
        Some((close - low) / range)
    }

    /// Percent change over the last 5 closed 1m candles, used by the exit
    /// manager's 5m-trend-flip thesis-invalidation check.
    fn compute_trend_5m(&self) -> Option<Decimal> {
        if self.recent_closes.len() < 5 {
            return None;
        }
        let first = *self.recent_closes.front()?;
        let last = *self.recent_closes.back()?;
        if first.is_zero() {
            return None;
        }
        Some(((last - first) / first) * Decimal::from(100))
    }

    fn compute_weekly_range_position(&self, close: Decimal) -> Option<Decimal> {
        let mut entries: Vec<(Decimal, Decimal)> = self.weekly_window.iter().copied().collect();
        if let (Some(h), Some(l)) = (self.day_high, self.day_low) {
            entries.push((h, l));
        }
        let mut iter = entries.into_iter();
        let (mut high, mut low) = iter.next()?;
        for (h, l) in iter {
            high = high.max(h);
            low = low.min(l);
        }
        let range = high - low;
        if range.is_zero() {
            return Some(dec!(0.5));
        }
        Some((close - low) / range)
    }
}

impl Default for FeatureState {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry of `FeatureState` keyed by symbol, owned by the universe
/// scheduler and handed to the intelligence layer for scoring reads.
#[derive(Default)]
pub struct FeatureRegistry {
    states: HashMap<Symbol, FeatureState>,
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_candle(&mut self, candle: &Candle) {
        self.states
            .entry(candle.symbol.clone())
            .or_insert_with(FeatureState::new)
            .on_candle(candle);
    }

    pub fn snapshot(&self, symbol: &Symbol) -> Option<LiveIndicators> {
        self.states.get(symbol).map(|s| s.snapshot())
    }

    pub fn is_ready(&self, symbol: &Symbol) -> bool {
        self.states.get(symbol).map(|s| s.is_ready()).unwrap_or(false)
    }

    pub fn get_mut(&mut self, symbol: &Symbol) -> &mut FeatureState {
        self.states.entry(symbol.clone()).or_insert_with(FeatureState::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn candle(close: Decimal, high: Decimal, low: Decimal, volume: Decimal) -> Candle {
        Candle {
            symbol: Symbol::new("BTC-USD"),
            timeframe: crate::types::TimeFrame::M1,
            timestamp: Utc::now(),
            open: close,
            high,
            low,
            close,
            volume,
            is_closed: true,
        }
    }

    #[test]
    fn becomes_ready_after_enough_candles() {
        let mut state = FeatureState::new();
        for i in 0..25 {
            let price = dec!(100) + Decimal::from(i);
            state.on_candle(&candle(price, price + dec!(1), price - dec!(1), dec!(10)));
        }
        assert!(state.is_ready());
    }

    #[test]
    fn buy_pressure_is_one_at_the_high() {
        let mut state = FeatureState::new();
        state.on_candle(&candle(dec!(110), dec!(110), dec!(100), dec!(5)));
        assert_eq!(state.snapshot().buy_pressure, Some(Decimal::ONE));
    }

    fn candle_at(ts: chrono::DateTime<Utc>, close: Decimal, high: Decimal, low: Decimal) -> Candle {
        Candle {
            symbol: Symbol::new("BTC-USD"),
            timeframe: crate::types::TimeFrame::M1,
            timestamp: ts,
            open: close,
            high,
            low,
            close,
            volume: dec!(10),
            is_closed: true,
        }
    }

    #[test]
    fn trend_5m_needs_five_closes() {
        let mut state = FeatureState::new();
        let base = Utc::now();
        for i in 0..4 {
            state.on_candle(&candle_at(base + chrono::Duration::minutes(i), dec!(100), dec!(101), dec!(99)));
        }
        assert!(state.snapshot().trend_5m.is_none());
        state.on_candle(&candle_at(base + chrono::Duration::minutes(4), dec!(102), dec!(103), dec!(101)));
        assert!(state.snapshot().trend_5m.unwrap() > Decimal::ZERO);
    }

    #[test]
    fn weekly_range_position_rolls_across_day_boundaries() {
        let mut state = FeatureState::new();
        let day1 = Utc::now() - chrono::Duration::days(1);
        state.on_candle(&candle_at(day1, dec!(100), dec!(110), dec!(90)));
        let day2 = day1 + chrono::Duration::days(1);
        state.on_candle(&candle_at(day2, dec!(100), dec!(105), dec!(95)));
        let pos = state.snapshot().weekly_range_position.unwrap();
        // week-wide range is [90, 110]; today's close sits exactly mid-range.
        assert!(pos > dec!(0.45) && pos < dec!(0.55));
    }
}

use chrono::{DateTime, Timelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Symbol, TimeFrame};

/// Immutable OHLCV tuple keyed by (symbol, timeframe, timestamp).
///
/// Invariant: `low <= min(open, close) <= max(open, close) <= high`,
/// `volume >= 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: Symbol,
    pub timeframe: TimeFrame,
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub is_closed: bool,
}

impl Candle {
    pub fn new(symbol: Symbol, timeframe: TimeFrame, timestamp: DateTime<Utc>, price: Decimal) -> Self {
        Self {
            symbol,
            timeframe,
            timestamp,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: Decimal::ZERO,
            is_closed: false,
        }
    }

    pub fn update_tick(&mut self, price: Decimal) {
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.close = price;
    }

    pub fn update_trade(&mut self, price: Decimal, size: Decimal) {
        self.update_tick(price);
        self.volume += size;
    }

    /// True if OHLC and volume satisfy the candle invariant.
    pub fn is_valid(&self) -> bool {
        self.low <= self.open.min(self.close)
            && self.open.max(self.close) <= self.high
            && self.volume >= Decimal::ZERO
    }

    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    pub fn body(&self) -> Decimal {
        (self.close - self.open).abs()
    }

    pub fn is_green(&self) -> bool {
        self.close >= self.open
    }

    pub fn midpoint(&self) -> Decimal {
        (self.high + self.low) / Decimal::from(2)
    }

    pub fn upper_wick(&self) -> Decimal {
        self.high - self.close.max(self.open)
    }

    pub fn lower_wick(&self) -> Decimal {
        self.close.min(self.open) - self.low
    }

    pub fn change_pct(&self) -> Decimal {
        if self.open.is_zero() {
            return Decimal::ZERO;
        }
        ((self.close - self.open) / self.open) * Decimal::from(100)
    }

    /// Builds the sealed 5m candle from 5 consecutive sealed 1m candles.
    pub fn aggregate(symbol: &Symbol, candles: &[Candle]) -> Candle {
        let first = &candles[0];
        let last = candles.last().unwrap();
        let high = candles.iter().map(|c| c.high).fold(first.high, Decimal::max);
        let low = candles.iter().map(|c| c.low).fold(first.low, Decimal::min);
        let volume: Decimal = candles.iter().map(|c| c.volume).sum();
        Candle {
            symbol: symbol.clone(),
            timeframe: TimeFrame::M5,
            timestamp: first.timestamp,
            open: first.open,
            high,
            low,
            close: last.close,
            volume,
            is_closed: true,
        }
    }
}

/// Bounded per-symbol candle history across timeframes. Invariant:
/// strictly increasing timestamps within a timeframe; duplicates rejected.
#[derive(Debug, Clone)]
pub struct CandleBuffer {
    pub symbol: Symbol,
    pub candles_1m: Vec<Candle>,
    pub candles_5m: Vec<Candle>,
    pub candles_1h: Vec<Candle>,
    pub candles_1d: Vec<Candle>,
    max_1m: usize,
    max_5m: usize,
    max_1h: usize,
    max_1d: usize,
}

impl CandleBuffer {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            candles_1m: Vec::new(),
            candles_5m: Vec::new(),
            candles_1h: Vec::new(),
            candles_1d: Vec::new(),
            max_1m: 120,
            max_5m: 48,
            max_1h: 48,
            max_1d: 30,
        }
    }

    /// Appends a sealed 1m candle. Handles out-of-order backfill inserts
    /// (checked against the most recent few for an exact duplicate) and
    /// triggers 5m aggregation at the minute%5==4 boundary.
    pub fn add_1m(&mut self, candle: Candle) {
        debug_assert!(candle.is_valid());

        let recent_window = self.candles_1m.len().saturating_sub(5);
        let is_dup = self.candles_1m[recent_window..]
            .iter()
            .any(|c| c.timestamp == candle.timestamp);
        if is_dup {
            return;
        }

        if let Some(last) = self.candles_1m.last() {
            if candle.timestamp < last.timestamp {
                let pos = self.candles_1m.partition_point(|c| c.timestamp < candle.timestamp);
                self.candles_1m.insert(pos, candle);
            } else {
                self.candles_1m.push(candle);
            }
        } else {
            self.candles_1m.push(candle);
        }

        if self.candles_1m.len() > self.max_1m {
            let excess = self.candles_1m.len() - self.max_1m;
            self.candles_1m.drain(0..excess);
        }

        self.maybe_aggregate_5m();
    }

    fn maybe_aggregate_5m(&mut self) {
        let n = self.candles_1m.len();
        if n < 5 {
            return;
        }
        let last = &self.candles_1m[n - 1];
        if last.timestamp.minute() % 5 != 4 {
            return;
        }
        let window = self.candles_1m[n - 5..].to_vec();
        let candle = Candle::aggregate(&self.symbol, &window);
        self.add_5m(candle);
    }

    pub fn add_5m(&mut self, candle: Candle) {
        if self.candles_5m.iter().any(|c| c.timestamp == candle.timestamp) {
            return;
        }
        self.candles_5m.push(candle);
        if self.candles_5m.len() > self.max_5m {
            let excess = self.candles_5m.len() - self.max_5m;
            self.candles_5m.drain(0..excess);
        }
    }

    pub fn add_1h(&mut self, candle: Candle) {
        if self.candles_1h.iter().any(|c| c.timestamp == candle.timestamp) {
            return;
        }
        self.candles_1h.push(candle);
        if self.candles_1h.len() > self.max_1h {
            let excess = self.candles_1h.len() - self.max_1h;
            self.candles_1h.drain(0..excess);
        }
    }

    pub fn add_1d(&mut self, candle: Candle) {
        if self.candles_1d.iter().any(|c| c.timestamp == candle.timestamp) {
            return;
        }
        self.candles_1d.push(candle);
        if self.candles_1d.len() > self.max_1d {
            let excess = self.candles_1d.len() - self.max_1d;
            self.candles_1d.drain(0..excess);
        }
    }

    fn series(&self, timeframe: TimeFrame) -> &[Candle] {
        match timeframe {
            TimeFrame::M1 => &self.candles_1m,
            TimeFrame::M5 => &self.candles_5m,
            TimeFrame::H1 => &self.candles_1h,
            TimeFrame::D1 => &self.candles_1d,
            _ => &self.candles_5m,
        }
    }

    pub fn closes(&self, timeframe: TimeFrame) -> Vec<Decimal> {
        self.series(timeframe).iter().map(|c| c.close).collect()
    }

    pub fn volumes(&self, timeframe: TimeFrame) -> Vec<Decimal> {
        self.series(timeframe).iter().map(|c| c.volume).collect()
    }

    pub fn ranges(&self, timeframe: TimeFrame) -> Vec<Decimal> {
        self.series(timeframe).iter().map(|c| c.range()).collect()
    }

    pub fn last_price(&self) -> Option<Decimal> {
        self.candles_1m.last().map(|c| c.close)
    }

    pub fn warmth(&self) -> (usize, usize) {
        (self.candles_1m.len(), self.candles_5m.len())
    }

    /// Volume-weighted average midpoint over the last `periods` 1m candles.
    /// Falls back to the last close when data or volume is insufficient.
    pub fn vwap(&self, periods: usize) -> Decimal {
        let n = self.candles_1m.len();
        if n == 0 {
            return Decimal::ZERO;
        }
        let start = n.saturating_sub(periods);
        let window = &self.candles_1m[start..];

        let total_volume: Decimal = window.iter().map(|c| c.volume).sum();
        if total_volume.is_zero() || window.len() < periods.min(n) {
            return self.last_price().unwrap_or(Decimal::ZERO);
        }

        let weighted: Decimal = window.iter().map(|c| c.midpoint() * c.volume).sum();
        weighted / total_volume
    }

    /// Classic EMA over the closes of the given timeframe, starting the
    /// recurrence from the first close in the window.
    pub fn ema(&self, period: usize, timeframe: TimeFrame) -> Option<Decimal> {
        let closes = self.closes(timeframe);
        if closes.is_empty() {
            return None;
        }
        let multiplier = Decimal::from(2) / Decimal::from(period as u32 + 1);
        let mut value = closes[0];
        for close in &closes[1..] {
            value = (*close - value) * multiplier + value;
        }
        Some(value)
    }

    /// Average true range over the last `period` candles of `timeframe`.
    pub fn atr(&self, period: usize, timeframe: TimeFrame) -> Option<Decimal> {
        let series = self.series(timeframe);
        if series.len() < 2 {
            return None;
        }
        let mut true_ranges = Vec::with_capacity(series.len());
        for w in series.windows(2) {
            let (prev, cur) = (&w[0], &w[1]);
            let tr = (cur.high - cur.low)
                .max((cur.high - prev.close).abs())
                .max((cur.low - prev.close).abs());
            true_ranges.push(tr);
        }
        let take = period.min(true_ranges.len());
        if take == 0 {
            return None;
        }
        let sum: Decimal = true_ranges[true_ranges.len() - take..].iter().sum();
        Some(sum / Decimal::from(take as u32))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: Symbol,
    pub price: Decimal,
    pub bid: Option<Decimal>,
    pub ask: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
}

impl Ticker {
    /// Spread in basis points, if both sides of the book are known.
    pub fn spread_bps(&self) -> Option<Decimal> {
        match (self.bid, self.ask) {
            (Some(bid), Some(ask)) if bid > Decimal::ZERO => {
                let mid = (bid + ask) / Decimal::from(2);
                if mid.is_zero() {
                    None
                } else {
                    Some(((ask - bid) / mid) * Decimal::from(10_000))
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, min, 0).unwrap()
    }

    fn candle(min: u32, close: i64) -> Candle {
        Candle {
            symbol: Symbol::new("BTC-USD"),
            timeframe: TimeFrame::M1,
            timestamp: ts(min),
            open: Decimal::from(close),
            high: Decimal::from(close),
            low: Decimal::from(close),
            close: Decimal::from(close),
            volume: Decimal::ONE,
            is_closed: true,
        }
    }

    #[test]
    fn aggregates_5m_at_minute_boundary() {
        let mut buf = CandleBuffer::new(Symbol::new("BTC-USD"));
        for m in 0..5 {
            buf.add_1m(candle(m, 100 + m as i64));
        }
        assert_eq!(buf.candles_5m.len(), 1);
        assert_eq!(buf.candles_5m[0].close, Decimal::from(104));
    }

    #[test]
    fn rejects_duplicate_timestamp() {
        let mut buf = CandleBuffer::new(Symbol::new("BTC-USD"));
        buf.add_1m(candle(0, 100));
        buf.add_1m(candle(0, 105));
        assert_eq!(buf.candles_1m.len(), 1);
        assert_eq!(buf.candles_1m[0].close, Decimal::from(100));
    }

    #[test]
    fn bounded_by_cap() {
        let mut buf = CandleBuffer::new(Symbol::new("BTC-USD"));
        for m in 0..200 {
            buf.add_1m(candle(m, 100));
        }
        assert_eq!(buf.candles_1m.len(), 120);
    }
}

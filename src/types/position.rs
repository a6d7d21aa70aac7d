use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Symbol;

/// Position lifecycle. `Pending` covers the window between order dispatch
/// and exchange fill confirmation; `Closing` covers a partial exit still
/// awaiting the remainder's fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionState {
    Pending,
    Open,
    Closing,
    Closed,
}

/// Rolling confidence-trend classification used by the entry scorer's
/// confidence-decay exit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceTrend {
    Rising,
    Stable,
    Fading,
}

/// A single held long position. Only long exposure is modeled; spec scope
/// excludes shorting.
///
/// Invariants: `entry_price > 0`, `stop_price < entry_price < tp1_price <
/// tp2_price`, `size_qty > 0`. `entry_cost_usd` is immutable once opened —
/// it is the basis for fee-aware realized PnL on close, never recomputed
/// from a later price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: Symbol,
    pub entry_price: Decimal,
    pub entry_time: DateTime<Utc>,
    pub entry_cost_usd: Decimal,
    pub size_qty: Decimal,
    pub size_usd: Decimal,
    pub stop_price: Decimal,
    pub tp1_price: Decimal,
    pub tp2_price: Decimal,
    pub time_stop_min: u32,
    pub state: PositionState,
    pub realized_pnl: Decimal,
    pub partial_closed: bool,
    pub strategy_id: String,

    /// Highest price observed since entry; drives trailing stop updates.
    pub peak_price: Decimal,
    /// Current trailing stop, if tighter than `stop_price`.
    pub trailing_stop: Option<Decimal>,

    /// Entry-time confidence score (0-100) from the entry scorer.
    pub entry_confidence: Decimal,
    /// Most recent confidence re-score from the exit manager.
    pub last_confidence: Decimal,
    /// Confidence samples since entry, newest last. Bounded at 5.
    #[serde(default)]
    pub confidence_history: Vec<Decimal>,

    pub stop_order_id: Option<String>,
    #[serde(default)]
    pub unverified: bool,
}

impl Position {
    pub fn new(
        symbol: Symbol,
        entry_price: Decimal,
        size_qty: Decimal,
        stop_price: Decimal,
        tp1_price: Decimal,
        tp2_price: Decimal,
        time_stop_min: u32,
        strategy_id: String,
        confidence: Decimal,
    ) -> Self {
        let size_usd = entry_price * size_qty;
        Self {
            symbol,
            entry_price,
            entry_time: Utc::now(),
            entry_cost_usd: size_usd,
            size_qty,
            size_usd,
            stop_price,
            tp1_price,
            tp2_price,
            time_stop_min,
            state: PositionState::Pending,
            realized_pnl: Decimal::ZERO,
            partial_closed: false,
            strategy_id,
            peak_price: entry_price,
            trailing_stop: None,
            entry_confidence: confidence,
            last_confidence: confidence,
            confidence_history: vec![confidence],
            stop_order_id: None,
            unverified: false,
        }
    }

    /// Checks entry_price > 0, ordering stop < entry < tp1 < tp2, size_qty > 0.
    pub fn is_valid(&self) -> bool {
        self.entry_price > Decimal::ZERO
            && self.stop_price < self.entry_price
            && self.entry_price < self.tp1_price
            && self.tp1_price < self.tp2_price
            && self.size_qty > Decimal::ZERO
    }

    pub fn cost_basis(&self) -> Decimal {
        self.entry_cost_usd
    }

    /// Trailing stop only ever tightens a long's exit, so the effective
    /// stop is whichever is higher.
    pub fn effective_stop(&self) -> Decimal {
        match self.trailing_stop {
            Some(trail) => trail.max(self.stop_price),
            None => self.stop_price,
        }
    }

    pub fn update_peak(&mut self, price: Decimal) {
        if price > self.peak_price {
            self.peak_price = price;
        }
    }

    pub fn unrealized_pnl(&self, current_price: Decimal) -> Decimal {
        (current_price - self.entry_price) * self.size_qty
    }

    pub fn unrealized_pnl_pct(&self, current_price: Decimal) -> Decimal {
        if self.entry_price.is_zero() {
            return Decimal::ZERO;
        }
        ((current_price - self.entry_price) / self.entry_price) * Decimal::from(100)
    }

    pub fn holding_minutes(&self) -> i64 {
        (Utc::now() - self.entry_time).num_minutes()
    }

    pub fn record_confidence(&mut self, score: Decimal) {
        self.last_confidence = score;
        self.confidence_history.push(score);
        if self.confidence_history.len() > 5 {
            self.confidence_history.remove(0);
        }
    }

    /// Classifies confidence trajectory over the retained history:
    /// rising if the latest sample exceeds the first by >= 5 points,
    /// fading if it has dropped by >= 5 points, otherwise stable.
    pub fn confidence_trend(&self) -> ConfidenceTrend {
        if self.confidence_history.len() < 2 {
            return ConfidenceTrend::Stable;
        }
        let first = self.confidence_history[0];
        let last = *self.confidence_history.last().unwrap();
        let delta = last - first;
        if delta >= Decimal::from(5) {
            ConfidenceTrend::Rising
        } else if delta <= Decimal::from(-5) {
            ConfidenceTrend::Fading
        } else {
            ConfidenceTrend::Stable
        }
    }

    /// Composite 0-100 quality signal blending entry confidence with the
    /// unrealized PnL trajectory so far; used for rotation comparisons
    /// between currently-held positions.
    pub fn play_quality(&self, current_price: Decimal) -> Decimal {
        let pnl_component = self.unrealized_pnl_pct(current_price).clamp(Decimal::from(-20), Decimal::from(20));
        (self.entry_confidence + pnl_component).clamp(Decimal::ZERO, Decimal::from(100))
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, PositionState::Open | PositionState::Closing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> Position {
        Position::new(
            Symbol::new("SOL-USD"),
            dec!(100),
            dec!(2),
            dec!(95),
            dec!(105),
            dec!(112),
            240,
            "momentum".to_string(),
            dec!(70),
        )
    }

    #[test]
    fn validates_price_ordering() {
        assert!(sample().is_valid());
    }

    #[test]
    fn confidence_trend_detects_fade() {
        let mut p = sample();
        p.record_confidence(dec!(60));
        p.record_confidence(dec!(50));
        assert_eq!(p.confidence_trend(), ConfidenceTrend::Fading);
    }

    #[test]
    fn unrealized_pnl_scales_with_qty() {
        let p = sample();
        assert_eq!(p.unrealized_pnl(dec!(110)), dec!(20));
    }
}

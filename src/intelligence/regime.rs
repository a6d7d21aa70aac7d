use chrono::{DateTime, Timelike, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{Regime, RegimeState};

const BTC_DUMP_THRESHOLD_PCT: Decimal = dec!(-1.5);
const BTC_CRASH_THRESHOLD_PCT: Decimal = dec!(-3.0);
const FEAR_GREED_EXTREME_GREED: u32 = 80;

/// Tracks BTC's own trend and derives the regime every symbol's scoring
/// path is gated on. One instance lives inside `IntelligenceLayer`.
pub struct RegimeDetector {
    regime: Regime,
    btc_trend_1h: Decimal,
    btc_trend_4h: Decimal,
    fear_greed: Option<u32>,
    updated_at: DateTime<Utc>,
}

impl RegimeDetector {
    pub fn new() -> Self {
        Self {
            regime: Regime::Normal,
            btc_trend_1h: Decimal::ZERO,
            btc_trend_4h: Decimal::ZERO,
            fear_greed: None,
            updated_at: Utc::now(),
        }
    }

    /// Recomputes the regime from a fresh BTC trend reading. A sharp dump
    /// overrides to Caution, a crash to RiskOff; extreme greed (>=80) also
    /// nudges Normal to Caution as a crowding signal.
    pub fn update_btc_trend(&mut self, trend_1h: Decimal, trend_4h: Decimal) {
        self.btc_trend_1h = trend_1h;
        self.btc_trend_4h = trend_4h;
        self.updated_at = Utc::now();

        self.regime = if trend_1h <= BTC_CRASH_THRESHOLD_PCT {
            Regime::RiskOff
        } else if trend_1h <= BTC_DUMP_THRESHOLD_PCT {
            Regime::Caution
        } else {
            Regime::Normal
        };

        if let Some(fg) = self.fear_greed {
            if fg >= FEAR_GREED_EXTREME_GREED && matches!(self.regime, Regime::Normal) {
                self.regime = Regime::Caution;
            }
        }
    }

    pub fn update_fear_greed(&mut self, value: u32) {
        self.fear_greed = Some(value);
        if value >= FEAR_GREED_EXTREME_GREED && matches!(self.regime, Regime::Normal) {
            self.regime = Regime::Caution;
        }
    }

    pub fn is_safe_to_trade(&self) -> bool {
        !matches!(self.regime, Regime::RiskOff)
    }

    pub fn snapshot(&self) -> RegimeState {
        RegimeState {
            regime: self.regime,
            btc_trend_1h: self.btc_trend_1h,
            btc_trend_4h: self.btc_trend_4h,
            fear_greed_index: self.fear_greed,
            updated_at: self.updated_at,
        }
    }

    pub fn regime(&self) -> Regime {
        self.regime
    }
}

impl Default for RegimeDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Session {
    Asia,
    Europe,
    Us,
    DeadZone,
}

impl Session {
    pub fn as_str(&self) -> &'static str {
        match self {
            Session::Asia => "asia",
            Session::Europe => "europe",
            Session::Us => "us",
            Session::DeadZone => "dead_zone",
        }
    }

    /// Position-size multiplier for the current UTC hour; the overnight
    /// dead zone (21:00-00:00 UTC) trades thinner books so sizing is cut.
    pub fn size_multiplier(&self) -> Decimal {
        match self {
            Session::DeadZone => dec!(0.6),
            _ => Decimal::ONE,
        }
    }
}

pub struct SessionDetector;

impl SessionDetector {
    pub fn current() -> Session {
        Self::for_hour(Utc::now().hour())
    }

    fn for_hour(hour: u32) -> Session {
        match hour {
            0..=7 => Session::Asia,
            8..=13 => Session::Europe,
            14..=20 => Session::Us,
            _ => Session::DeadZone,
        }
    }

    pub fn size_multiplier() -> Decimal {
        Self::current().size_multiplier()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_sets_caution() {
        let mut d = RegimeDetector::new();
        d.update_btc_trend(dec!(-2.0), dec!(-1.0));
        assert_eq!(d.regime(), Regime::Caution);
        assert!(d.is_safe_to_trade());
    }

    #[test]
    fn crash_sets_risk_off() {
        let mut d = RegimeDetector::new();
        d.update_btc_trend(dec!(-4.0), dec!(-3.0));
        assert_eq!(d.regime(), Regime::RiskOff);
        assert!(!d.is_safe_to_trade());
    }

    #[test]
    fn extreme_greed_nudges_normal_to_caution() {
        let mut d = RegimeDetector::new();
        d.update_btc_trend(dec!(1.0), dec!(0.5));
        d.update_fear_greed(85);
        assert_eq!(d.regime(), Regime::Caution);
    }

    #[test]
    fn dead_zone_hour_reduces_size() {
        assert_eq!(SessionDetector::for_hour(22).size_multiplier(), dec!(0.6));
        assert_eq!(SessionDetector::for_hour(10).size_multiplier(), Decimal::ONE);
    }
}

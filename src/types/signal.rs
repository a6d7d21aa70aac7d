use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BurstMetrics, Symbol};

/// A candidate long entry handed to the order router. Either carries a
/// strategy's own confidence (fast-path scoring in `intelligence::scoring`)
/// or leaves it `None` so the router falls back to the burst-metric rules
/// path. Stops/targets here are advisory only — the router's geometry gate
/// always overrides them with configured fixed percentages in normal mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSignal {
    pub symbol: Symbol,
    pub strategy_id: String,
    pub confidence: Option<Decimal>,
    pub spread_bps: Decimal,
    pub price: Decimal,
    pub suggested_stop: Option<Decimal>,
    pub suggested_tp1: Option<Decimal>,
    pub suggested_tp2: Option<Decimal>,
    #[serde(default)]
    pub burst: BurstMetrics,
    pub reason: String,
}

impl TradeSignal {
    pub fn new(symbol: Symbol, strategy_id: impl Into<String>, price: Decimal, spread_bps: Decimal, reason: impl Into<String>) -> Self {
        Self {
            symbol,
            strategy_id: strategy_id.into(),
            confidence: None,
            spread_bps,
            price,
            suggested_stop: None,
            suggested_tp1: None,
            suggested_tp2: None,
            burst: BurstMetrics::default(),
            reason: reason.into(),
        }
    }

    pub fn with_confidence(mut self, confidence: Decimal) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_burst(mut self, burst: BurstMetrics) -> Self {
        self.burst = burst;
        self
    }
}

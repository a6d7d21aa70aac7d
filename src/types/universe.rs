use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CapClass, Symbol, Tier};

/// Static/slow-changing metadata about a universe member, refreshed by the
/// backfill worker rather than the tick path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniverseEntry {
    pub symbol: Symbol,
    pub cap_class: CapClass,
    pub sector: String,
    pub avg_spread_bps: Decimal,
    pub atr_24h_pct: Decimal,
    pub listed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_stablecoin: bool,
}

impl UniverseEntry {
    pub fn new(symbol: Symbol, cap_class: CapClass, sector: impl Into<String>) -> Self {
        let is_stablecoin = symbol.is_stablecoin_base();
        Self {
            symbol,
            cap_class,
            sector: sector.into(),
            avg_spread_bps: Decimal::ZERO,
            atr_24h_pct: Decimal::ZERO,
            listed_at: None,
            is_stablecoin,
        }
    }

    pub fn is_tradeable(&self) -> bool {
        !self.is_stablecoin
    }
}

/// Maps a symbol to its current polling tier, tracking warmth (has enough
/// history to be scored) and the last promotion/demotion transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierAssignment {
    pub symbol: Symbol,
    pub tier: Tier,
    pub warm: bool,
    pub assigned_at: DateTime<Utc>,
    #[serde(default)]
    pub consecutive_misses: u32,
}

impl TierAssignment {
    pub fn new(symbol: Symbol, tier: Tier) -> Self {
        Self {
            symbol,
            tier,
            warm: false,
            assigned_at: Utc::now(),
            consecutive_misses: 0,
        }
    }

    pub fn promote(&mut self, tier: Tier) {
        self.tier = tier;
        self.assigned_at = Utc::now();
        self.consecutive_misses = 0;
    }

    pub fn demote(&mut self, tier: Tier) {
        self.tier = tier;
        self.assigned_at = Utc::now();
    }

    pub fn mark_warm(&mut self) {
        self.warm = true;
    }

    pub fn record_miss(&mut self) {
        self.consecutive_misses += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stablecoin_entry_is_not_tradeable() {
        let entry = UniverseEntry::new(Symbol::new("USDT-USD"), CapClass::Large, "stablecoin");
        assert!(!entry.is_tradeable());
    }

    #[test]
    fn promote_resets_miss_counter() {
        let mut t = TierAssignment::new(Symbol::new("SOL-USD"), Tier::T3Slow);
        t.record_miss();
        t.record_miss();
        t.promote(Tier::T2Fast);
        assert_eq!(t.consecutive_misses, 0);
        assert_eq!(t.tier, Tier::T2Fast);
    }
}

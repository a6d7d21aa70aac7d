use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::limits::sector_for;
use crate::types::Symbol;

#[derive(Debug, Clone, Default)]
pub struct SectorStats {
    pub sector: String,
    pub symbols: Vec<Symbol>,
    pub avg_trend_1h: Decimal,
    pub best_performer: Option<Symbol>,
    pub best_trend: Decimal,
    pub worst_performer: Option<Symbol>,
    pub worst_trend: Decimal,
    pub strength_score: Decimal,
    pub diverging_from_btc: bool,
}

struct SymbolTrend {
    trend_1h: Decimal,
    updated_at: DateTime<Utc>,
}

/// Tracks sector-level momentum so rotation/diverging-basket comparisons
/// can run without recomputing from raw candles on every call.
#[derive(Default)]
pub struct SectorTracker {
    symbol_trends: HashMap<Symbol, SymbolTrend>,
    stats: HashMap<String, SectorStats>,
    btc_trend_1h: Decimal,
}

const STALE_CUTOFF_MIN: i64 = 5;

impl SectorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_symbol_trend(&mut self, symbol: &Symbol, trend_1h: Decimal) {
        self.symbol_trends.insert(
            symbol.clone(),
            SymbolTrend {
                trend_1h,
                updated_at: Utc::now(),
            },
        );
    }

    pub fn update_btc_trend(&mut self, trend_1h: Decimal) {
        self.btc_trend_1h = trend_1h;
    }

    /// Recomputes per-sector aggregates from fresh (<5min) symbol trends.
    pub fn refresh(&mut self) {
        let now = Utc::now();
        let mut grouped: HashMap<String, Vec<(Symbol, Decimal)>> = HashMap::new();

        for (symbol, trend) in &self.symbol_trends {
            if (now - trend.updated_at).num_minutes() > STALE_CUTOFF_MIN {
                continue;
            }
            grouped.entry(sector_for(symbol).to_string()).or_default().push((symbol.clone(), trend.trend_1h));
        }

        self.stats.clear();
        for (sector, members) in grouped {
            let sum: Decimal = members.iter().map(|(_, t)| *t).sum();
            let avg = sum / Decimal::from(members.len() as u32);

            let best = members.iter().max_by_key(|(_, t)| *t).cloned();
            let worst = members.iter().min_by_key(|(_, t)| *t).cloned();

            let diverging = (avg > dec!(0.5) && self.btc_trend_1h < dec!(-0.5)) || (avg < dec!(-0.5) && self.btc_trend_1h > dec!(0.5));

            self.stats.insert(
                sector.clone(),
                SectorStats {
                    sector,
                    symbols: members.iter().map(|(s, _)| s.clone()).collect(),
                    avg_trend_1h: avg,
                    best_performer: best.as_ref().map(|(s, _)| s.clone()),
                    best_trend: best.map(|(_, t)| t).unwrap_or(Decimal::ZERO),
                    worst_performer: worst.as_ref().map(|(s, _)| s.clone()),
                    worst_trend: worst.map(|(_, t)| t).unwrap_or(Decimal::ZERO),
                    strength_score: (avg * Decimal::from(20)).clamp(dec!(-100), dec!(100)),
                    diverging_from_btc: diverging,
                },
            );
        }
    }

    pub fn hot_sectors(&self, min_strength: Decimal) -> Vec<&SectorStats> {
        let mut hot: Vec<&SectorStats> = self.stats.values().filter(|s| s.strength_score >= min_strength).collect();
        hot.sort_by(|a, b| b.strength_score.cmp(&a.strength_score));
        hot
    }

    pub fn diverging_sectors(&self) -> Vec<&SectorStats> {
        self.stats.values().filter(|s| s.diverging_from_btc).collect()
    }

    pub fn sector_summary(&self) -> Vec<SectorStats> {
        self.stats.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diverging_sector_flagged_against_btc_dump() {
        let mut tracker = SectorTracker::new();
        tracker.update_btc_trend(dec!(-1.0));
        tracker.update_symbol_trend(&Symbol::new("SOL-USD"), dec!(1.0));
        tracker.refresh();
        let diverging = tracker.diverging_sectors();
        assert!(!diverging.is_empty());
    }
}

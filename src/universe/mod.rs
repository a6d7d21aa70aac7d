//! Tiered universe scheduler. Tier assignment itself is driven externally
//! (a hot-list ranker feeds `set_tier`); this module owns warmth tracking,
//! promotion/demotion callbacks, and per-tier symbol listing, per §4.2.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::info;

use crate::types::{CandleBuffer, Symbol, Tier, TierAssignment};

const WARM_1M_THRESHOLD: usize = 20;
const WARM_5M_THRESHOLD: usize = 10;

/// Signal consumed by the backfill worker: a symbol was just promoted to
/// T1 and needs its history filled before the feature engine can compute
/// a full indicator snapshot for it.
#[derive(Debug, Clone)]
pub struct BackfillRequest {
    pub symbol: Symbol,
}

/// Promotion/demotion observer. Registered closures, matching the
/// collector's `on_candle`/`on_tick` callback idiom rather than a trait
/// object hierarchy.
pub type TierTransitionCallback = Box<dyn Fn(&Symbol, Tier, Tier) + Send + Sync>;

pub struct TierScheduler {
    assignments: HashMap<Symbol, TierAssignment>,
    t1_capacity: usize,
    backfill_tx: mpsc::Sender<BackfillRequest>,
    on_transition: Vec<TierTransitionCallback>,
}

impl TierScheduler {
    /// `t1_capacity` bounds how many symbols may sit in the streamed tier
    /// at once (the configured WS stream limit, e.g. 150).
    pub fn new(t1_capacity: usize) -> (Self, mpsc::Receiver<BackfillRequest>) {
        let (tx, rx) = mpsc::channel(256);
        (
            Self {
                assignments: HashMap::new(),
                t1_capacity,
                backfill_tx: tx,
                on_transition: Vec::new(),
            },
            rx,
        )
    }

    pub fn on_transition<F>(&mut self, callback: F)
    where
        F: Fn(&Symbol, Tier, Tier) + Send + Sync + 'static,
    {
        self.on_transition.push(Box::new(callback));
    }

    pub fn t1_count(&self) -> usize {
        self.assignments.values().filter(|a| matches!(a.tier, Tier::T1Ws)).count()
    }

    pub fn t1_has_capacity(&self) -> bool {
        self.t1_count() < self.t1_capacity
    }

    /// Assigns (or reassigns) a symbol's tier. T1 promotions past capacity
    /// are refused; the caller's hot-list ranker is expected to demote a
    /// lower-ranked symbol first.
    pub fn set_tier(&mut self, symbol: &Symbol, tier: Tier) -> bool {
        if matches!(tier, Tier::T1Ws) && !self.t1_has_capacity() {
            if !self.assignments.get(symbol).map(|a| matches!(a.tier, Tier::T1Ws)).unwrap_or(false) {
                return false;
            }
        }

        let prev_tier = self.assignments.get(symbol).map(|a| a.tier);
        match self.assignments.get_mut(symbol) {
            Some(assignment) => {
                if assignment.tier == tier {
                    return true;
                }
                if matches!(tier, Tier::T1Ws) {
                    assignment.promote(tier);
                } else {
                    assignment.demote(tier);
                }
            }
            None => {
                self.assignments.insert(symbol.clone(), TierAssignment::new(symbol.clone(), tier));
            }
        }

        if let Some(prev) = prev_tier {
            for cb in &self.on_transition {
                cb(symbol, prev, tier);
            }
            if matches!(tier, Tier::T1Ws) && !matches!(prev, Tier::T1Ws) {
                let _ = self.backfill_tx.try_send(BackfillRequest { symbol: symbol.clone() });
                info!(symbol = %symbol, "promoted to T1, backfill requested");
            }
        }

        true
    }

    /// Updates warmth from a symbol's candle buffer. Demotion from T1
    /// never clears warmth once earned — only a fresh symbol starts cold.
    pub fn update_warmth(&mut self, symbol: &Symbol, buffer: &CandleBuffer) {
        let (n1m, n5m) = buffer.warmth();
        if let Some(assignment) = self.assignments.get_mut(symbol) {
            if !assignment.warm && n1m >= WARM_1M_THRESHOLD && n5m >= WARM_5M_THRESHOLD {
                assignment.mark_warm();
                info!(symbol = %symbol, "symbol warm");
            }
        }
    }

    pub fn is_warm(&self, symbol: &Symbol) -> bool {
        self.assignments.get(symbol).map(|a| a.warm).unwrap_or(false)
    }

    pub fn tier_of(&self, symbol: &Symbol) -> Option<Tier> {
        self.assignments.get(symbol).map(|a| a.tier)
    }

    pub fn symbols_in_tier(&self, tier: Tier) -> Vec<Symbol> {
        self.assignments
            .values()
            .filter(|a| match (a.tier, tier) {
                (Tier::T1Ws, Tier::T1Ws) | (Tier::T2Fast, Tier::T2Fast) | (Tier::T3Slow, Tier::T3Slow) => true,
                _ => false,
            })
            .map(|a| a.symbol.clone())
            .collect()
    }

    pub fn all_symbols(&self) -> Vec<Symbol> {
        self.assignments.keys().cloned().collect()
    }

    pub fn backfill_sender(&self) -> mpsc::Sender<BackfillRequest> {
        self.backfill_tx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use crate::types::{Candle, TimeFrame};

    fn warm_buffer(symbol: &Symbol) -> CandleBuffer {
        let mut buf = CandleBuffer::new(symbol.clone());
        for i in 0..25 {
            buf.add_1m(Candle {
                symbol: symbol.clone(),
                timeframe: TimeFrame::M1,
                timestamp: Utc::now() + chrono::Duration::minutes(i),
                open: dec!(100),
                high: dec!(101),
                low: dec!(99),
                close: dec!(100),
                volume: dec!(10),
                is_closed: true,
            });
        }
        buf
    }

    #[test]
    fn promotion_to_t1_enqueues_backfill() {
        let (mut sched, mut rx) = TierScheduler::new(150);
        let sym = Symbol::new("SOL-USD");
        sched.set_tier(&sym, Tier::T3Slow);
        sched.set_tier(&sym, Tier::T1Ws);
        assert_eq!(rx.try_recv().unwrap().symbol, sym);
    }

    #[test]
    fn demotion_does_not_clear_warmth() {
        let (mut sched, _rx) = TierScheduler::new(150);
        let sym = Symbol::new("SOL-USD");
        sched.set_tier(&sym, Tier::T1Ws);
        sched.update_warmth(&sym, &warm_buffer(&sym));
        assert!(sched.is_warm(&sym));
        sched.set_tier(&sym, Tier::T3Slow);
        assert!(sched.is_warm(&sym));
    }

    #[test]
    fn t1_capacity_is_enforced() {
        let (mut sched, _rx) = TierScheduler::new(1);
        let a = Symbol::new("AAA-USD");
        let b = Symbol::new("BBB-USD");
        assert!(sched.set_tier(&a, Tier::T1Ws));
        assert!(!sched.set_tier(&b, Tier::T1Ws));
    }
}

use std::sync::atomic::{AtomicU32, Ordering};

use tracing::warn;

/// Trips after a run of consecutive execution/exchange failures, gating
/// new entries until manually (or time-based, via `reset`) cleared. Grounds
/// router gate 3; distinct from the exchange synchronizer's degraded mode,
/// which gates the whole sync loop rather than just new entries.
pub struct CircuitBreaker {
    consecutive_failures: AtomicU32,
    threshold: u32,
    tripped: std::sync::atomic::AtomicBool,
}

impl CircuitBreaker {
    pub fn new(threshold: u32) -> Self {
        Self {
            consecutive_failures: AtomicU32::new(0),
            threshold,
            tripped: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
        self.tripped.store(false, Ordering::SeqCst);
    }

    pub fn record_failure(&self) {
        let n = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
        if n >= self.threshold {
            if !self.tripped.swap(true, Ordering::SeqCst) {
                warn!(failures = n, threshold = self.threshold, "circuit breaker tripped");
            }
        }
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
        self.tripped.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trips_after_threshold_consecutive_failures() {
        let breaker = CircuitBreaker::new(3);
        breaker.record_failure();
        breaker.record_failure();
        assert!(!breaker.is_tripped());
        breaker.record_failure();
        assert!(breaker.is_tripped());
    }

    #[test]
    fn success_clears_the_streak() {
        let breaker = CircuitBreaker::new(3);
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();
        breaker.record_failure();
        breaker.record_failure();
        assert!(!breaker.is_tripped());
    }
}

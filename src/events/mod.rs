//! Normalized event fanout. Grounded on the source's `MarketEventBus`: every
//! handler invocation is wrapped so a misbehaving subscriber (dashboard,
//! alert delivery, session logger) can never break the tick/candle/order
//! data path feeding the trading core.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Mutex;

use tracing::error;

use crate::types::MarketEvent;

type Handler = Box<dyn Fn(&MarketEvent) + Send + Sync>;

/// Synchronous fanout bus. `emit` is called inline from the collector/
/// router/exit-manager hot paths, so handlers must be cheap; anything
/// slower should hand off to its own channel inside the handler closure.
#[derive(Default)]
pub struct MarketEventBus {
    handlers: Mutex<Vec<Handler>>,
}

impl MarketEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, handler: F)
    where
        F: Fn(&MarketEvent) + Send + Sync + 'static,
    {
        self.handlers.lock().unwrap().push(Box::new(handler));
    }

    /// Invokes every handler for this event. A handler that panics is
    /// caught and logged; it never propagates into the caller's data path.
    pub fn emit(&self, event: MarketEvent) {
        let handlers = self.handlers.lock().unwrap();
        for handler in handlers.iter() {
            let result = catch_unwind(AssertUnwindSafe(|| handler(&event)));
            if result.is_err() {
                error!("event handler panicked, discarding and continuing");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Symbol, TickEvent};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn panicking_handler_does_not_block_others() {
        let bus = MarketEventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        bus.subscribe(|_| panic!("boom"));
        let count_clone = Arc::clone(&count);
        bus.subscribe(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(MarketEvent::Tick(TickEvent {
            symbol: Symbol::new("BTC-USD"),
            price: dec!(100),
            spread_bps: None,
            timestamp: Utc::now(),
        }));

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}

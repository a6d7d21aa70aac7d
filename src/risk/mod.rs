//! Circuit breaker and daily-loss gates used by the order router (gates 2
//! and 3 of the pipeline). Per-symbol exposure, cooldowns, and correlation
//! limits live in `intelligence::limits` instead; position sizing lives in
//! the router itself, keyed off `config::core::CoreConfig`.

pub mod circuit_breaker;
pub mod daily_stop;

pub use circuit_breaker::CircuitBreaker;
pub use daily_stop::DailyStopTracker;

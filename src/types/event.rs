use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Candle, Symbol};

/// Kind of order-lifecycle event carried on the `order` channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEventKind {
    Open,
    Close,
    PartialClose,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickEvent {
    pub symbol: Symbol,
    pub price: Decimal,
    pub spread_bps: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandleEvent {
    pub candle: Candle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    pub kind: OrderEventKind,
    pub symbol: Symbol,
    pub strategy_id: String,
    pub price: Decimal,
    pub size_qty: Decimal,
    pub realized_pnl: Option<Decimal>,
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Normalized tagged union emitted on the market event bus. Handlers
/// (dashboard, alerts, session logs) are best-effort consumers — never a
/// dependency of the trading-core data path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MarketEvent {
    Tick(TickEvent),
    Candle(CandleEvent),
    Order(OrderEvent),
}

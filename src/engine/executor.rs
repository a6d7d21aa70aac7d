//! Mode-agnostic execution surface. Paper and live trading share every
//! upstream component (router, exits, sync) by going through these traits;
//! only the `TradingContainer` factory in `engine::container` knows which
//! concrete implementation backs a given `TradingMode`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::{Order, OrderRequest, Position, Side, Symbol};

/// Replaces exception-based control flow with a tagged result: transient
/// failures (timeouts, rate limits, momentary exchange errors) are worth
/// retrying; fatal ones (rejected order, insufficient balance, bad
/// signature) are not.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("transient execution failure: {0}")]
    Transient(String),
    #[error("fatal execution failure: {0}")]
    Fatal(String),
}

impl ExecError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ExecError::Transient(_))
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        ExecError::Transient(msg.into())
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        ExecError::Fatal(msg.into())
    }
}

pub type ExecResult<T> = Result<T, ExecError>;

/// Places and tracks regular (entry/exit) orders.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn place_order(&self, request: OrderRequest) -> ExecResult<Order>;
    async fn cancel_order(&self, symbol: &Symbol, order_id: &str) -> ExecResult<()>;
    async fn get_order(&self, symbol: &Symbol, order_id: &str) -> ExecResult<Order>;
    async fn get_balance(&self, asset: &str) -> ExecResult<Decimal>;
}

/// Places, relinks, and health-checks exchange-resident stop orders. Paper
/// trading simulates these in-process; live trading mirrors the
/// `stop_<symbol>_<ts>` client-id convention against the real exchange.
#[async_trait]
pub trait StopOrderManager: Send + Sync {
    async fn place_stop(&self, symbol: &Symbol, side: Side, qty: Decimal, stop_price: Decimal) -> ExecResult<Order>;
    async fn cancel_stop(&self, symbol: &Symbol, order_id: &str) -> ExecResult<()>;
    async fn stop_status(&self, symbol: &Symbol, order_id: &str) -> ExecResult<Order>;
}

/// In-memory view of currently-held positions and available balance. Both
/// trading modes use `engine::portfolio::InMemoryPortfolio`; live mode
/// additionally has this view refreshed by `sync::ExchangeSynchronizer`.
#[async_trait]
pub trait PortfolioManager: Send + Sync {
    async fn positions_snapshot(&self) -> Vec<Position>;
    async fn position(&self, symbol: &Symbol) -> Option<Position>;
    async fn upsert_position(&self, position: Position);
    async fn remove_position(&self, symbol: &Symbol) -> Option<Position>;
    async fn available_balance(&self) -> Decimal;
    async fn set_available_balance(&self, balance: Decimal);
    async fn total_equity(&self) -> Decimal;
}

/// Durable position-registry snapshotting, backed by
/// `persistence::AtomicJsonStore`.
#[async_trait]
pub trait PositionPersistence: Send + Sync {
    /// `force` bypasses the underlying store's hash + min-interval
    /// write-amplification guard (see `AtomicJsonStore::save`).
    async fn save(&self, positions: &[Position], force: bool) -> anyhow::Result<()>;
    async fn load(&self) -> anyhow::Result<Vec<Position>>;
}

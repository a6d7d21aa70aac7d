#![allow(dead_code)]
pub mod binance;
pub mod orderbook;
pub mod websocket;

pub use binance::*;
pub use websocket::*;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::engine::executor::ExecResult;
use crate::types::{Candle, Order, OrderRequest, Ticker, TimeFrame, Symbol};

/// REST surface the live executor and exchange synchronizer both depend
/// on. `binance::BinanceClient` is the concrete implementation; anything
/// generic enough to swap exchanges later only needs a new impl of this.
#[async_trait]
pub trait Exchange: Send + Sync {
    async fn get_ticker(&self, symbol: &Symbol) -> ExecResult<Ticker>;
    async fn get_candles(&self, symbol: &Symbol, timeframe: TimeFrame, limit: u32) -> ExecResult<Vec<Candle>>;
    async fn place_order(&self, request: OrderRequest) -> ExecResult<Order>;
    async fn cancel_order(&self, symbol: &Symbol, order_id: &str) -> ExecResult<()>;
    async fn get_order(&self, symbol: &Symbol, order_id: &str) -> ExecResult<Order>;
    async fn get_balance(&self, asset: &str) -> ExecResult<Decimal>;
    async fn get_server_time(&self) -> ExecResult<u64>;
}

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::info;

use crate::types::{Order, OrderRequest, OrderStatus, OrderType, Side, Symbol};

use super::executor::{ExecError, ExecResult, Executor, StopOrderManager};

fn taker_fee() -> Decimal {
    Decimal::new(1, 3) // 0.1%
}

fn maker_fee() -> Decimal {
    Decimal::new(1, 3) // 0.1%
}

fn slippage() -> Decimal {
    Decimal::new(5, 4) // 0.05%
}

/// Simulated fills against the last known mark price, with the same
/// taker/maker fee split and slippage model the engine always used, just
/// keyed on `Symbol` instead of a closed pair enum. `update_price` is fed
/// by the market-data collector and is what trips any resting stop orders.
pub struct PaperExecutor {
    prices: Arc<RwLock<HashMap<Symbol, Decimal>>>,
    resting_stops: RwLock<HashMap<String, Order>>,
    balances: RwLock<HashMap<String, Decimal>>,
}

impl PaperExecutor {
    pub fn new(prices: Arc<RwLock<HashMap<Symbol, Decimal>>>) -> Self {
        Self {
            prices,
            resting_stops: RwLock::new(HashMap::new()),
            balances: RwLock::new(HashMap::new()),
        }
    }

    pub fn shared(prices: Arc<RwLock<HashMap<Symbol, Decimal>>>) -> Arc<Self> {
        Arc::new(Self::new(prices))
    }

    pub async fn set_balance(&self, asset: &str, amount: Decimal) {
        self.balances.write().await.insert(asset.to_string(), amount);
    }

    fn simulate_execution_price(&self, price: Decimal, side: Side) -> Decimal {
        let slip = price * slippage();
        match side {
            Side::Buy => price + slip,
            Side::Sell => price - slip,
        }
    }

    async fn price_for(&self, symbol: &Symbol) -> ExecResult<Decimal> {
        self.prices
            .read()
            .await
            .get(symbol)
            .copied()
            .ok_or_else(|| ExecError::transient(format!("no mark price available for {}", symbol)))
    }

    /// Feeds a fresh mark price and checks resting stop orders for triggers.
    /// A triggered stop is filled in place; callers learn about it on their
    /// next `stop_status` poll (mirroring how a live stop-order health check
    /// only discovers a fill after the fact).
    pub async fn update_price(&self, symbol: &Symbol, price: Decimal) {
        self.prices.write().await.insert(symbol.clone(), price);

        let mut stops = self.resting_stops.write().await;
        for order in stops.values_mut() {
            if &order.symbol != symbol || !order.status.is_active() {
                continue;
            }
            let stop = order.stop_price.unwrap_or(price);
            let triggered = match order.side {
                Side::Sell => price <= stop,
                Side::Buy => price >= stop,
            };
            if triggered {
                let exec_price = self.simulate_execution_price(price, order.side);
                let notional = exec_price * order.size_qty;
                order.status = OrderStatus::Filled;
                order.filled_qty = order.size_qty;
                order.filled_value = notional;
                order.fees = notional * taker_fee();
                order.updated_at = Utc::now();
                info!(symbol = %symbol, price = %exec_price, "paper stop order triggered");
            }
        }
    }
}

#[async_trait]
impl Executor for PaperExecutor {
    async fn place_order(&self, request: OrderRequest) -> ExecResult<Order> {
        let mut order = Order::from_request(&request);
        let mark = self.price_for(&request.symbol).await?;
        let exec_price = self.simulate_execution_price(mark, request.side);
        let notional = exec_price * order.size_qty;
        let fee_rate = match request.order_type {
            OrderType::Market => taker_fee(),
            _ => maker_fee(),
        };

        order.status = OrderStatus::Filled;
        order.filled_qty = order.size_qty;
        order.filled_value = notional;
        order.fees = notional * fee_rate;
        order.updated_at = Utc::now();

        info!(
            symbol = %order.symbol,
            side = ?order.side,
            qty = %order.size_qty,
            price = %exec_price,
            "paper order filled"
        );

        Ok(order)
    }

    async fn cancel_order(&self, _symbol: &Symbol, order_id: &str) -> ExecResult<()> {
        let mut stops = self.resting_stops.write().await;
        if let Some(order) = stops.get_mut(order_id) {
            if order.status.is_final() {
                return Err(ExecError::fatal("order already in a final state"));
            }
            order.status = OrderStatus::Cancelled;
            order.updated_at = Utc::now();
            Ok(())
        } else {
            Err(ExecError::fatal(format!("unknown order {order_id}")))
        }
    }

    async fn get_order(&self, _symbol: &Symbol, order_id: &str) -> ExecResult<Order> {
        self.resting_stops
            .read()
            .await
            .get(order_id)
            .cloned()
            .ok_or_else(|| ExecError::fatal(format!("unknown order {order_id}")))
    }

    async fn get_balance(&self, asset: &str) -> ExecResult<Decimal> {
        Ok(self.balances.read().await.get(asset).copied().unwrap_or(Decimal::ZERO))
    }
}

#[async_trait]
impl StopOrderManager for PaperExecutor {
    async fn place_stop(&self, symbol: &Symbol, side: Side, qty: Decimal, stop_price: Decimal) -> ExecResult<Order> {
        let request = OrderRequest::stop_limit(symbol.clone(), side, qty, stop_price, stop_price);
        let order = Order::from_request(&request);
        self.resting_stops.write().await.insert(order.client_id.clone(), order.clone());
        info!(symbol = %symbol, stop = %stop_price, "paper stop order placed");
        Ok(order)
    }

    async fn cancel_stop(&self, symbol: &Symbol, order_id: &str) -> ExecResult<()> {
        self.cancel_order(symbol, order_id).await
    }

    async fn stop_status(&self, symbol: &Symbol, order_id: &str) -> ExecResult<Order> {
        self.get_order(symbol, order_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    async fn executor_with_price(symbol: &Symbol, price: Decimal) -> PaperExecutor {
        let prices = Arc::new(RwLock::new(HashMap::new()));
        let exec = PaperExecutor::new(prices);
        exec.update_price(symbol, price).await;
        exec
    }

    #[tokio::test]
    async fn market_buy_fills_with_slippage_against_ask() {
        let symbol = Symbol::new("SOL-USD");
        let exec = executor_with_price(&symbol, dec!(100)).await;
        let order = exec
            .place_order(OrderRequest::market(symbol.clone(), Side::Buy, dec!(2)))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Filled);
        assert!(order.average_fill_price().unwrap() > dec!(100));
    }

    #[tokio::test]
    async fn stop_order_triggers_on_price_update() {
        let symbol = Symbol::new("SOL-USD");
        let exec = executor_with_price(&symbol, dec!(100)).await;
        let stop = exec.place_stop(&symbol, Side::Sell, dec!(2), dec!(95)).await.unwrap();
        exec.update_price(&symbol, dec!(90)).await;
        let status = exec.stop_status(&symbol, &stop.client_id).await.unwrap();
        assert_eq!(status.status, OrderStatus::Filled);
    }

    #[tokio::test]
    async fn missing_price_is_a_transient_error() {
        let prices = Arc::new(RwLock::new(HashMap::new()));
        let exec = PaperExecutor::new(prices);
        let err = exec
            .place_order(OrderRequest::market(Symbol::new("BTC-USD"), Side::Buy, dec!(1)))
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }
}

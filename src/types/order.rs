use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Side, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
    StopLimit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "market",
            OrderType::Limit => "limit",
            OrderType::StopLimit => "stop_limit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Open,
    Filled,
    Cancelled,
    Expired,
    Failed,
}

impl OrderStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Open)
    }

    pub fn is_final(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Expired | OrderStatus::Failed
        )
    }
}

/// Builds an entry/exit client order id: `ct_<symbol>_<unix>`.
pub fn make_client_order_id(symbol: &Symbol) -> String {
    format!("ct_{}_{}", symbol.as_str().to_lowercase(), Utc::now().timestamp())
}

/// Builds a stop-order client order id: `stop_<symbol>_<unix>`.
pub fn make_stop_client_order_id(symbol: &Symbol) -> String {
    format!("stop_{}_{}", symbol.as_str().to_lowercase(), Utc::now().timestamp())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub client_order_id: String,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub size_qty: Decimal,
    pub limit_price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub is_stop: bool,
    pub linked_position_symbol: Option<Symbol>,
}

impl OrderRequest {
    pub fn market(symbol: Symbol, side: Side, size_qty: Decimal) -> Self {
        let client_order_id = make_client_order_id(&symbol);
        Self {
            client_order_id,
            symbol,
            side,
            order_type: OrderType::Market,
            size_qty,
            limit_price: None,
            stop_price: None,
            is_stop: false,
            linked_position_symbol: None,
        }
    }

    pub fn limit(symbol: Symbol, side: Side, size_qty: Decimal, price: Decimal) -> Self {
        let client_order_id = make_client_order_id(&symbol);
        Self {
            client_order_id,
            symbol,
            side,
            order_type: OrderType::Limit,
            size_qty,
            limit_price: Some(price),
            stop_price: None,
            is_stop: false,
            linked_position_symbol: None,
        }
    }

    pub fn stop_limit(symbol: Symbol, side: Side, size_qty: Decimal, stop_price: Decimal, limit_price: Decimal) -> Self {
        let linked = symbol.clone();
        let client_order_id = make_stop_client_order_id(&symbol);
        Self {
            client_order_id,
            symbol,
            side,
            order_type: OrderType::StopLimit,
            size_qty,
            limit_price: Some(limit_price),
            stop_price: Some(stop_price),
            is_stop: true,
            linked_position_symbol: Some(linked),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub client_id: String,
    pub exchange_order_id: Option<String>,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub size_qty: Decimal,
    pub filled_qty: Decimal,
    pub filled_value: Decimal,
    pub fees: Decimal,
    pub limit_price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub is_stop: bool,
    pub linked_position_symbol: Option<Symbol>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn from_request(request: &OrderRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            client_id: request.client_order_id.clone(),
            exchange_order_id: None,
            symbol: request.symbol.clone(),
            side: request.side,
            order_type: request.order_type,
            status: OrderStatus::Pending,
            size_qty: request.size_qty,
            filled_qty: Decimal::ZERO,
            filled_value: Decimal::ZERO,
            fees: Decimal::ZERO,
            limit_price: request.limit_price,
            stop_price: request.stop_price,
            is_stop: request.is_stop,
            linked_position_symbol: request.linked_position_symbol.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn remaining_qty(&self) -> Decimal {
        self.size_qty - self.filled_qty
    }

    pub fn fill_ratio(&self) -> Decimal {
        if self.size_qty.is_zero() {
            Decimal::ZERO
        } else {
            self.filled_qty / self.size_qty
        }
    }

    /// Market orders confirm at 95% filled, limit orders at 99% — the
    /// exchange's partial-fill reporting granularity differs by order type
    /// and this asymmetry is intentional, not a bug.
    pub fn meets_fill_threshold(&self) -> bool {
        let threshold = match self.order_type {
            OrderType::Market => Decimal::new(95, 2),
            _ => Decimal::new(99, 2),
        };
        self.fill_ratio() >= threshold
    }

    pub fn average_fill_price(&self) -> Option<Decimal> {
        if self.filled_qty.is_zero() {
            None
        } else {
            Some(self.filled_value / self.filled_qty)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: String,
    pub trade_id: String,
    pub price: Decimal,
    pub quantity: Decimal,
    pub fee: Decimal,
    pub fee_asset: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn client_order_id_formats() {
        let sym = Symbol::new("SOL-USD");
        assert!(make_client_order_id(&sym).starts_with("ct_sol-usd_"));
        assert!(make_stop_client_order_id(&sym).starts_with("stop_sol-usd_"));
    }

    #[test]
    fn fill_threshold_differs_by_type() {
        let mut order = Order::from_request(&OrderRequest::market(Symbol::new("BTC-USD"), Side::Buy, dec!(1)));
        order.filled_qty = dec!(0.96);
        assert!(order.meets_fill_threshold());

        let mut limit_order = Order::from_request(&OrderRequest::limit(Symbol::new("BTC-USD"), Side::Buy, dec!(1), dec!(100)));
        limit_order.filled_qty = dec!(0.96);
        assert!(!limit_order.meets_fill_threshold());
    }
}

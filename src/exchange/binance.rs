#![allow(dead_code)]
use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, info};

use crate::engine::executor::{ExecError, ExecResult};
use crate::types::{
    make_client_order_id, Candle, Order, OrderRequest, OrderStatus, OrderType, Side, Ticker,
    TimeFrame, Symbol,
};

use super::Exchange;

const BINANCE_US_API: &str = "https://api.binance.us";
const BINANCE_US_TESTNET: &str = "https://testnet.binance.vision";

type HmacSha256 = Hmac<Sha256>;

/// "SOL-USD" -> "SOLUSD". Shared with `websocket` so REST and stream
/// symbols are derived from `Symbol` the same way.
pub(crate) fn exchange_symbol(symbol: &Symbol) -> String {
    symbol.as_str().replace('-', "").to_uppercase()
}

/// REST binding against a concrete spot exchange. `granularity_name` on
/// `TimeFrame` already speaks this exchange's interval strings; a second
/// exchange would need its own client behind the same `Exchange` trait,
/// not a rewrite of the router/sync layers that consume it.
#[derive(Debug, Clone)]
pub struct BinanceClient {
    client: Client,
    api_key: String,
    secret_key: String,
    base_url: String,
}

impl BinanceClient {
    pub fn new(api_key: String, secret_key: String, use_testnet: bool) -> Self {
        let base_url = if use_testnet { BINANCE_US_TESTNET } else { BINANCE_US_API }.to_string();
        Self { client: Client::new(), api_key, secret_key, base_url }
    }

    pub fn public_only() -> Self {
        Self {
            client: Client::new(),
            api_key: String::new(),
            secret_key: String::new(),
            base_url: BINANCE_US_API.to_string(),
        }
    }

    fn sign(&self, query: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes()).expect("HMAC accepts any key length");
        mac.update(query.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn build_signed_query(&self, params: &HashMap<&str, String>) -> String {
        let timestamp = Utc::now().timestamp_millis();
        let mut parts: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        parts.push(format!("timestamp={timestamp}"));
        parts.push("recvWindow=5000".to_string());
        let query = parts.join("&");
        let signature = self.sign(&query);
        format!("{query}&signature={signature}")
    }

    fn exchange_symbol(symbol: &Symbol) -> String {
        exchange_symbol(symbol)
    }

    fn transient(e: impl std::fmt::Display) -> ExecError {
        ExecError::transient(e.to_string())
    }

    fn convert_order_response(&self, resp: OrderResponse, symbol: &Symbol) -> ExecResult<Order> {
        let status = match resp.status.as_str() {
            "NEW" => OrderStatus::Open,
            "PARTIALLY_FILLED" => OrderStatus::Open,
            "FILLED" => OrderStatus::Filled,
            "CANCELED" => OrderStatus::Cancelled,
            "REJECTED" => OrderStatus::Failed,
            "EXPIRED" => OrderStatus::Expired,
            _ => OrderStatus::Pending,
        };
        let order_type = match resp.order_type.as_str() {
            "MARKET" => OrderType::Market,
            "LIMIT" => OrderType::Limit,
            _ => OrderType::StopLimit,
        };
        let side = if resp.side == "BUY" { Side::Buy } else { Side::Sell };

        let filled_qty = Decimal::from_str(&resp.executed_qty).map_err(Self::transient)?;
        let filled_value = resp
            .cummulative_quote_qty
            .as_deref()
            .and_then(|q| Decimal::from_str(q).ok())
            .unwrap_or(Decimal::ZERO);

        Ok(Order {
            id: resp.order_id.to_string(),
            client_id: resp.client_order_id,
            exchange_order_id: Some(resp.order_id.to_string()),
            symbol: symbol.clone(),
            side,
            order_type,
            status,
            size_qty: Decimal::from_str(&resp.orig_qty).map_err(Self::transient)?,
            filled_qty,
            filled_value,
            fees: Decimal::ZERO,
            limit_price: resp.price.as_deref().and_then(|p| Decimal::from_str(p).ok()),
            stop_price: resp.stop_price.as_deref().and_then(|p| Decimal::from_str(p).ok()),
            is_stop: resp.stop_price.is_some(),
            linked_position_symbol: None,
            created_at: Utc.timestamp_millis_opt(resp.transact_time.unwrap_or(0)).single().unwrap_or_else(Utc::now),
            updated_at: Utc::now(),
        })
    }
}

#[async_trait]
impl Exchange for BinanceClient {
    async fn get_ticker(&self, symbol: &Symbol) -> ExecResult<Ticker> {
        let url = format!("{}/api/v3/ticker/24hr?symbol={}", self.base_url, Self::exchange_symbol(symbol));
        let resp: TickerResponse = self.client.get(&url).send().await.map_err(Self::transient)?.json().await.map_err(Self::transient)?;
        Ok(Ticker {
            symbol: symbol.clone(),
            price: Decimal::from_str(&resp.last_price).map_err(Self::transient)?,
            bid: Decimal::from_str(&resp.bid_price).ok(),
            ask: Decimal::from_str(&resp.ask_price).ok(),
            timestamp: Utc::now(),
        })
    }

    async fn get_candles(&self, symbol: &Symbol, timeframe: TimeFrame, limit: u32) -> ExecResult<Vec<Candle>> {
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            self.base_url,
            Self::exchange_symbol(symbol),
            timeframe.granularity_name(),
            limit.min(300),
        );
        let resp: Vec<Vec<serde_json::Value>> = self.client.get(&url).send().await.map_err(Self::transient)?.json().await.map_err(Self::transient)?;

        resp.into_iter()
            .map(|k| {
                let open_time = k.get(0).and_then(|v| v.as_i64()).unwrap_or(0);
                let open = k.get(1).and_then(|v| v.as_str()).unwrap_or("0");
                let high = k.get(2).and_then(|v| v.as_str()).unwrap_or("0");
                let low = k.get(3).and_then(|v| v.as_str()).unwrap_or("0");
                let close = k.get(4).and_then(|v| v.as_str()).unwrap_or("0");
                let volume = k.get(5).and_then(|v| v.as_str()).unwrap_or("0");
                Ok(Candle {
                    symbol: symbol.clone(),
                    timeframe,
                    timestamp: Utc.timestamp_millis_opt(open_time).single().unwrap_or_else(Utc::now),
                    open: Decimal::from_str(open).map_err(Self::transient)?,
                    high: Decimal::from_str(high).map_err(Self::transient)?,
                    low: Decimal::from_str(low).map_err(Self::transient)?,
                    close: Decimal::from_str(close).map_err(Self::transient)?,
                    volume: Decimal::from_str(volume).map_err(Self::transient)?,
                    is_closed: true,
                })
            })
            .collect()
    }

    async fn place_order(&self, request: OrderRequest) -> ExecResult<Order> {
        let url = format!("{}/api/v3/order", self.base_url);
        let mut params: HashMap<&str, String> = HashMap::new();
        params.insert("symbol", Self::exchange_symbol(&request.symbol));
        params.insert("side", if matches!(request.side, Side::Buy) { "BUY".to_string() } else { "SELL".to_string() });
        params.insert("type", match request.order_type { OrderType::Market => "MARKET", OrderType::Limit => "LIMIT", OrderType::StopLimit => "STOP_LOSS_LIMIT" }.to_string());
        params.insert("quantity", request.size_qty.to_string());
        params.insert("newClientOrderId", request.client_order_id.clone());
        if let Some(price) = request.limit_price {
            params.insert("price", price.to_string());
            params.insert("timeInForce", "GTC".to_string());
        }
        if let Some(stop) = request.stop_price {
            params.insert("stopPrice", stop.to_string());
        }

        let query = self.build_signed_query(&params);
        let full_url = format!("{url}?{query}");
        debug!(symbol = %request.symbol, "placing live order");

        let resp = self.client.post(&full_url).header("X-MBX-APIKEY", &self.api_key).send().await.map_err(Self::transient)?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(if status.is_server_error() { ExecError::transient(text) } else { ExecError::fatal(text) });
        }
        let order_resp: OrderResponse = resp.json().await.map_err(Self::transient)?;
        self.convert_order_response(order_resp, &request.symbol)
    }

    async fn cancel_order(&self, symbol: &Symbol, order_id: &str) -> ExecResult<()> {
        let url = format!("{}/api/v3/order", self.base_url);
        let mut params: HashMap<&str, String> = HashMap::new();
        params.insert("symbol", Self::exchange_symbol(symbol));
        params.insert("origClientOrderId", order_id.to_string());
        let query = self.build_signed_query(&params);
        let full_url = format!("{url}?{query}");

        let resp = self.client.delete(&full_url).header("X-MBX-APIKEY", &self.api_key).send().await.map_err(Self::transient)?;
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ExecError::transient(text));
        }
        info!(order_id, "live order cancelled");
        Ok(())
    }

    async fn get_order(&self, symbol: &Symbol, order_id: &str) -> ExecResult<Order> {
        let url = format!("{}/api/v3/order", self.base_url);
        let mut params: HashMap<&str, String> = HashMap::new();
        params.insert("symbol", Self::exchange_symbol(symbol));
        params.insert("origClientOrderId", order_id.to_string());
        let query = self.build_signed_query(&params);
        let full_url = format!("{url}?{query}");

        let resp = self.client.get(&full_url).header("X-MBX-APIKEY", &self.api_key).send().await.map_err(Self::transient)?;
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ExecError::transient(text));
        }
        let order_resp: OrderResponse = resp.json().await.map_err(Self::transient)?;
        self.convert_order_response(order_resp, symbol)
    }

    async fn get_balance(&self, asset: &str) -> ExecResult<Decimal> {
        let url = format!("{}/api/v3/account", self.base_url);
        let params: HashMap<&str, String> = HashMap::new();
        let query = self.build_signed_query(&params);
        let full_url = format!("{url}?{query}");

        let resp = self.client.get(&full_url).header("X-MBX-APIKEY", &self.api_key).send().await.map_err(Self::transient)?;
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ExecError::transient(text));
        }
        let account: AccountResponse = resp.json().await.map_err(Self::transient)?;
        for balance in account.balances {
            if balance.asset == asset {
                return Decimal::from_str(&balance.free).map_err(Self::transient);
            }
        }
        Ok(Decimal::ZERO)
    }

    async fn get_server_time(&self) -> ExecResult<u64> {
        let url = format!("{}/api/v3/time", self.base_url);
        let resp: ServerTimeResponse = self.client.get(&url).send().await.map_err(Self::transient)?.json().await.map_err(Self::transient)?;
        Ok(resp.server_time)
    }
}

impl BinanceClient {
    /// Used by the entry order path: an entry and its stop share the same
    /// `ct_<symbol>_<unix>` prefix convention as a non-stop client id.
    pub fn new_entry_order(symbol: Symbol, side: Side, qty: Decimal) -> OrderRequest {
        let mut req = OrderRequest::market(symbol, side, qty);
        req.client_order_id = make_client_order_id(&req.symbol);
        req
    }
}

#[derive(Debug, Deserialize)]
struct ServerTimeResponse {
    #[serde(rename = "serverTime")]
    server_time: u64,
}

#[derive(Debug, Deserialize)]
struct TickerResponse {
    #[serde(rename = "lastPrice")]
    last_price: String,
    #[serde(rename = "bidPrice")]
    bid_price: String,
    #[serde(rename = "askPrice")]
    ask_price: String,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    #[serde(rename = "orderId")]
    order_id: u64,
    #[serde(rename = "clientOrderId")]
    client_order_id: String,
    status: String,
    #[serde(rename = "type")]
    order_type: String,
    side: String,
    #[serde(rename = "origQty")]
    orig_qty: String,
    #[serde(rename = "executedQty")]
    executed_qty: String,
    price: Option<String>,
    #[serde(rename = "cummulativeQuoteQty")]
    cummulative_quote_qty: Option<String>,
    #[serde(rename = "stopPrice")]
    stop_price: Option<String>,
    #[serde(rename = "transactTime")]
    transact_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    balances: Vec<BalanceResponse>,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    asset: String,
    free: String,
    #[allow(dead_code)]
    locked: String,
}

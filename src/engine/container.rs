//! Picks the concrete `Executor`/`StopOrderManager`/`PortfolioManager`/
//! `PositionPersistence`/`PortfolioSource` set for a `TradingMode`. Router,
//! exit manager, and synchronizer only ever see the trait objects this
//! hands back — they never know which mode they're running in.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::engine::executor::{ExecResult, Executor, PortfolioManager, PositionPersistence, StopOrderManager};
use crate::engine::paper::PaperExecutor;
use crate::engine::portfolio::InMemoryPortfolio;
use crate::exchange::binance::BinanceClient;
use crate::exchange::Exchange;
use crate::persistence::JsonPositionStore;
use crate::sync::{PortfolioSnapshot, PortfolioSource};
use crate::types::{Order, OrderRequest, Side, Symbol, TradingMode};

/// Thin delegation from the mode-agnostic `Executor`/`StopOrderManager`
/// traits onto the `Exchange` REST surface. Stop orders reuse the same
/// `stop_<symbol>_<unix>` client-id convention the synchronizer already
/// parses back to a symbol.
pub struct LiveExecutor {
    exchange: Arc<dyn Exchange>,
}

impl LiveExecutor {
    pub fn new(exchange: Arc<dyn Exchange>) -> Arc<Self> {
        Arc::new(Self { exchange })
    }
}

#[async_trait]
impl Executor for LiveExecutor {
    async fn place_order(&self, request: OrderRequest) -> ExecResult<Order> {
        self.exchange.place_order(request).await
    }

    async fn cancel_order(&self, symbol: &Symbol, order_id: &str) -> ExecResult<()> {
        self.exchange.cancel_order(symbol, order_id).await
    }

    async fn get_order(&self, symbol: &Symbol, order_id: &str) -> ExecResult<Order> {
        self.exchange.get_order(symbol, order_id).await
    }

    async fn get_balance(&self, asset: &str) -> ExecResult<Decimal> {
        self.exchange.get_balance(asset).await
    }
}

#[async_trait]
impl StopOrderManager for LiveExecutor {
    async fn place_stop(&self, symbol: &Symbol, side: Side, qty: Decimal, stop_price: Decimal) -> ExecResult<Order> {
        let request = OrderRequest::stop_limit(symbol.clone(), side, qty, stop_price, stop_price);
        self.exchange.place_order(request).await
    }

    async fn cancel_stop(&self, symbol: &Symbol, order_id: &str) -> ExecResult<()> {
        self.exchange.cancel_order(symbol, order_id).await
    }

    async fn stop_status(&self, symbol: &Symbol, order_id: &str) -> ExecResult<Order> {
        self.exchange.get_order(symbol, order_id).await
    }
}

/// Mirrors the in-memory portfolio back as if it were exchange truth.
/// `verify_truth` against this source is always a no-op diff — paper mode
/// has no external ledger to reconcile against.
pub struct PaperPortfolioSource {
    portfolio: Arc<dyn PortfolioManager>,
}

impl PaperPortfolioSource {
    pub fn new(portfolio: Arc<dyn PortfolioManager>) -> Self {
        Self { portfolio }
    }
}

#[async_trait]
impl PortfolioSource for PaperPortfolioSource {
    async fn fetch(&self) -> ExecResult<PortfolioSnapshot> {
        let mut snapshot = PortfolioSnapshot { cash_balance: self.portfolio.available_balance().await, ..Default::default() };
        for position in self.portfolio.positions_snapshot().await {
            snapshot.holdings_qty.insert(position.symbol.clone(), position.size_qty);
            snapshot.cost_basis.insert(position.symbol.clone(), position.entry_cost_usd);
            snapshot.available_to_trade.insert(position.symbol.clone(), position.size_qty);
        }
        Ok(snapshot)
    }
}

/// Account-balance view of exchange truth. Cost basis isn't available from
/// the plain balance endpoint, so a holding with no locally-tracked
/// position is recovered with `entry_price = 0` and skipped by
/// `verify_truth` until a real fill establishes one — acceptable because
/// the recovery path exists to catch positions this bot itself opened,
/// not to import arbitrary account history.
pub struct LivePortfolioSource {
    exchange: Arc<dyn Exchange>,
    quote_asset: String,
    tracked_symbols: Vec<Symbol>,
}

impl LivePortfolioSource {
    pub fn new(exchange: Arc<dyn Exchange>, quote_asset: impl Into<String>, tracked_symbols: Vec<Symbol>) -> Self {
        Self { exchange, quote_asset: quote_asset.into(), tracked_symbols }
    }
}

#[async_trait]
impl PortfolioSource for LivePortfolioSource {
    async fn fetch(&self) -> ExecResult<PortfolioSnapshot> {
        let cash_balance = self.exchange.get_balance(&self.quote_asset).await?;
        let mut snapshot = PortfolioSnapshot { cash_balance, ..Default::default() };
        for symbol in &self.tracked_symbols {
            let qty = self.exchange.get_balance(symbol.base()).await.unwrap_or(Decimal::ZERO);
            if qty > Decimal::ZERO {
                snapshot.holdings_qty.insert(symbol.clone(), qty);
                snapshot.available_to_trade.insert(symbol.clone(), qty);
            }
        }
        Ok(snapshot)
    }
}

/// Credentials needed to stand up the live exchange binding. Absent in
/// paper mode, where `TradingContainer::build` never touches the network.
pub struct LiveCredentials {
    pub api_key: String,
    pub secret_key: String,
    pub use_testnet: bool,
}

/// Bundles every trait object the router/exits/sync trio needs, already
/// wired to the right concrete implementation for the requested mode.
pub struct TradingContainer {
    pub executor: Arc<dyn Executor>,
    pub stop_mgr: Arc<dyn StopOrderManager>,
    pub portfolio: Arc<dyn PortfolioManager>,
    pub persistence: Arc<dyn PositionPersistence>,
    pub portfolio_source: Arc<dyn PortfolioSource>,
    pub exchange: Option<Arc<dyn Exchange>>,
    pub prices: Arc<RwLock<std::collections::HashMap<Symbol, Decimal>>>,
}

impl TradingContainer {
    /// `positions_path` backs the one `PositionPersistence` both modes
    /// share; `live` is `None` in paper mode and required in live mode.
    pub fn build(
        mode: TradingMode,
        starting_balance: Decimal,
        positions_path: PathBuf,
        tracked_symbols: Vec<Symbol>,
        live: Option<LiveCredentials>,
    ) -> Self {
        let prices = Arc::new(RwLock::new(std::collections::HashMap::new()));
        let portfolio = InMemoryPortfolio::shared(starting_balance);
        let persistence = Arc::new(JsonPositionStore::new(positions_path, 5));

        match mode {
            TradingMode::Paper => {
                let executor = PaperExecutor::shared(prices.clone());
                let portfolio_source = Arc::new(PaperPortfolioSource::new(portfolio.clone()));
                Self {
                    executor: executor.clone(),
                    stop_mgr: executor,
                    portfolio,
                    persistence,
                    portfolio_source,
                    exchange: None,
                    prices,
                }
            }
            TradingMode::Live => {
                let creds = live.expect("live trading mode requires LiveCredentials");
                let client: Arc<dyn Exchange> = Arc::new(BinanceClient::new(creds.api_key, creds.secret_key, creds.use_testnet));
                let executor = LiveExecutor::new(client.clone());
                let portfolio_source = Arc::new(LivePortfolioSource::new(client.clone(), "USD", tracked_symbols));
                Self {
                    executor: executor.clone(),
                    stop_mgr: executor,
                    portfolio,
                    persistence,
                    portfolio_source,
                    exchange: Some(client),
                    prices,
                }
            }
        }
    }
}

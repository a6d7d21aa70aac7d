use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::types::{Position, Symbol};

use super::executor::PortfolioManager;

/// Shared in-memory position book. Acquire the positions lock and release
/// it in its own scope before touching anything else to avoid lock
/// ordering deadlocks with the balance lock.
pub struct InMemoryPortfolio {
    positions: RwLock<HashMap<Symbol, Position>>,
    available_balance: RwLock<Decimal>,
}

impl InMemoryPortfolio {
    pub fn new(starting_balance: Decimal) -> Self {
        Self {
            positions: RwLock::new(HashMap::new()),
            available_balance: RwLock::new(starting_balance),
        }
    }

    pub fn shared(starting_balance: Decimal) -> Arc<Self> {
        Arc::new(Self::new(starting_balance))
    }
}

#[async_trait]
impl PortfolioManager for InMemoryPortfolio {
    async fn positions_snapshot(&self) -> Vec<Position> {
        self.positions.read().await.values().cloned().collect()
    }

    async fn position(&self, symbol: &Symbol) -> Option<Position> {
        self.positions.read().await.get(symbol).cloned()
    }

    async fn upsert_position(&self, position: Position) {
        self.positions.write().await.insert(position.symbol.clone(), position);
    }

    async fn remove_position(&self, symbol: &Symbol) -> Option<Position> {
        self.positions.write().await.remove(symbol)
    }

    async fn available_balance(&self) -> Decimal {
        *self.available_balance.read().await
    }

    async fn set_available_balance(&self, balance: Decimal) {
        *self.available_balance.write().await = balance;
    }

    async fn total_equity(&self) -> Decimal {
        let available = self.available_balance().await;
        let positions_value: Decimal = self.positions.read().await.values().map(|p| p.size_usd).sum();
        available + positions_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_position(symbol: &str) -> Position {
        Position::new(
            Symbol::new(symbol),
            dec!(100),
            dec!(2),
            dec!(95),
            dec!(105),
            dec!(112),
            240,
            "momentum".to_string(),
            dec!(70),
        )
    }

    #[tokio::test]
    async fn equity_includes_open_positions() {
        let portfolio = InMemoryPortfolio::new(dec!(1000));
        portfolio.upsert_position(sample_position("SOL-USD")).await;
        assert_eq!(portfolio.total_equity().await, dec!(1200));
    }

    #[tokio::test]
    async fn remove_clears_the_symbol() {
        let portfolio = InMemoryPortfolio::new(dec!(1000));
        portfolio.upsert_position(sample_position("SOL-USD")).await;
        assert!(portfolio.remove_position(&Symbol::new("SOL-USD")).await.is_some());
        assert!(portfolio.position(&Symbol::new("SOL-USD")).await.is_none());
    }
}

use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Tracks realized losses against the configured daily cap. Resets at UTC
/// midnight, same as the exchange synchronizer's daily PnL bookkeeping in
/// `intelligence::IntelligenceLayer`; this tracker is the router's own copy
/// so gate 2 can short-circuit before scoring runs at all.
pub struct DailyStopTracker {
    realized_loss: RwLock<Decimal>,
    reset_date: RwLock<chrono::NaiveDate>,
}

impl DailyStopTracker {
    pub fn new() -> Self {
        Self {
            realized_loss: RwLock::new(Decimal::ZERO),
            reset_date: RwLock::new(chrono::Utc::now().date_naive()),
        }
    }

    async fn maybe_reset(&self) {
        let today = chrono::Utc::now().date_naive();
        let mut reset_date = self.reset_date.write().await;
        if today != *reset_date {
            *self.realized_loss.write().await = Decimal::ZERO;
            *reset_date = today;
            info!("daily loss tracker reset");
        }
    }

    pub async fn record_realized_pnl(&self, pnl: Decimal) {
        self.maybe_reset().await;
        if pnl < Decimal::ZERO {
            *self.realized_loss.write().await += pnl.abs();
        }
    }

    pub async fn realized_loss(&self) -> Decimal {
        self.maybe_reset().await;
        *self.realized_loss.read().await
    }

    /// Gate 2: true once the day's realized losses breach the configured cap.
    pub async fn is_tripped(&self, daily_max_loss_usd: Decimal) -> bool {
        let loss = self.realized_loss().await;
        if loss >= daily_max_loss_usd {
            warn!(loss = %loss, cap = %daily_max_loss_usd, "daily stop tripped");
            true
        } else {
            false
        }
    }
}

impl Default for DailyStopTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn trips_once_cap_breached() {
        let tracker = DailyStopTracker::new();
        tracker.record_realized_pnl(dec!(-40)).await;
        tracker.record_realized_pnl(dec!(-65)).await;
        assert!(tracker.is_tripped(dec!(100)).await);
    }

    #[tokio::test]
    async fn gains_do_not_offset_losses() {
        let tracker = DailyStopTracker::new();
        tracker.record_realized_pnl(dec!(-90)).await;
        tracker.record_realized_pnl(dec!(500)).await;
        assert!(tracker.is_tripped(dec!(100)).await);
    }
}

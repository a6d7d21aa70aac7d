use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{Position, Symbol};

/// Base-asset -> sector label, used for diversification telemetry (not a
/// hard cap — the budget-driven sizing gate does the real risk control).
fn sector_map() -> &'static HashMap<&'static str, &'static str> {
    static MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    MAP.get_or_init(|| {
        let mut m = HashMap::new();
        for sym in ["BTC", "ETH"] {
            m.insert(sym, "major");
        }
        for sym in [
            "SOL", "AVAX", "ADA", "DOT", "NEAR", "APT", "SUI", "SEI", "INJ", "TIA", "ATOM", "ALGO", "HBAR", "ICP",
        ] {
            m.insert(sym, "l1");
        }
        for sym in ["ORCA", "TNSR", "JTO", "JUP", "PYTH", "BONK", "WIF"] {
            m.insert(sym, "sol_eco");
        }
        for sym in [
            "UNI", "AAVE", "COMP", "MKR", "LINK", "SNX", "SUSHI", "CRV", "LDO", "FXS", "LQTY", "ONDO", "ENA", "AERO",
            "SUPER",
        ] {
            m.insert(sym, "defi");
        }
        for sym in ["FET", "RNDR", "TAO", "AGIX"] {
            m.insert(sym, "ai");
        }
        for sym in ["DOGE", "SHIB", "PEPE", "FARTCOIN", "FLOKI", "MEME", "PENGU"] {
            m.insert(sym, "meme");
        }
        for sym in ["AXS", "SAND", "MANA", "IMX", "GALA", "ENJ"] {
            m.insert(sym, "gaming");
        }
        for sym in ["FIL", "AR", "STORJ", "GRT", "QNT"] {
            m.insert(sym, "infra");
        }
        for sym in ["BNB", "OKB"] {
            m.insert(sym, "exchange");
        }
        for sym in ["ZEC", "XMR"] {
            m.insert(sym, "privacy");
        }
        for sym in ["XLM", "XRP", "LTC", "BCH"] {
            m.insert(sym, "payments");
        }
        m
    })
}

/// Named baskets of symbols that tend to move together; used by the
/// sector tracker's rotation/diverging-basket comparisons, not as a hard
/// position cap.
pub fn correlation_groups() -> &'static HashMap<&'static str, &'static [&'static str]> {
    static GROUPS: OnceLock<HashMap<&'static str, &'static [&'static str]>> = OnceLock::new();
    GROUPS.get_or_init(|| {
        let mut g: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
        g.insert("sol_heavy", &["SOL", "ORCA", "TNSR", "JTO", "BONK", "WIF"]);
        g.insert("eth_heavy", &["ETH", "LDO", "AAVE", "UNI", "LINK"]);
        g.insert("l1_basket", &["SOL", "AVAX", "ADA", "SUI", "APT", "SEI"]);
        g.insert("meme_basket", &["DOGE", "SHIB", "PEPE", "FARTCOIN", "BONK"]);
        g
    })
}

pub fn sector_for(symbol: &Symbol) -> &'static str {
    sector_map().get(symbol.base()).copied().unwrap_or("other")
}

#[derive(Debug, Clone)]
pub struct PositionLimits {
    pub max_per_symbol_usd: Decimal,
    pub global_cooldown_sec: i64,
    pub symbol_cooldown_sec: i64,
    pub daily_loss_limit_usd: Decimal,
}

impl Default for PositionLimits {
    fn default() -> Self {
        Self {
            max_per_symbol_usd: dec!(100.0),
            global_cooldown_sec: 10,
            symbol_cooldown_sec: 60,
            daily_loss_limit_usd: dec!(50.0),
        }
    }
}

/// Enforces the router's non-sizing gates: exposure cap per symbol and
/// the global/per-symbol cooldown windows. Position COUNT is deliberately
/// not capped here — the budget gate and per-trade sizing carry that risk.
pub struct LimitChecker {
    limits: PositionLimits,
    last_trade_at: Option<DateTime<Utc>>,
    last_symbol_trade: HashMap<Symbol, DateTime<Utc>>,
}

impl LimitChecker {
    pub fn new(limits: PositionLimits) -> Self {
        Self {
            limits,
            last_trade_at: None,
            last_symbol_trade: HashMap::new(),
        }
    }

    pub fn check(&self, symbol: &Symbol, positions: &HashMap<Symbol, Position>) -> Result<(), String> {
        let exposure: Decimal = positions
            .values()
            .filter(|p| &p.symbol == symbol)
            .map(|p| p.size_usd)
            .sum();
        if exposure >= self.limits.max_per_symbol_usd {
            return Err(format!("max ${} exposure in {symbol} reached", self.limits.max_per_symbol_usd));
        }

        if let Some(last) = self.last_trade_at {
            let elapsed = (Utc::now() - last).num_seconds();
            if elapsed < self.limits.global_cooldown_sec {
                return Err(format!("global cooldown: {}s remaining", self.limits.global_cooldown_sec - elapsed));
            }
        }

        if let Some(last) = self.last_symbol_trade.get(symbol) {
            let elapsed = (Utc::now() - *last).num_seconds();
            if elapsed < self.limits.symbol_cooldown_sec {
                return Err(format!("{symbol} cooldown: {}s remaining", self.limits.symbol_cooldown_sec - elapsed));
            }
        }

        Ok(())
    }

    pub fn record_trade(&mut self, symbol: &Symbol) {
        let now = Utc::now();
        self.last_trade_at = Some(now);
        self.last_symbol_trade.insert(symbol.clone(), now);
    }
}

impl Default for LimitChecker {
    fn default() -> Self {
        Self::new(PositionLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sector_lookup_known_and_unknown() {
        assert_eq!(sector_for(&Symbol::new("SOL-USD")), "l1");
        assert_eq!(sector_for(&Symbol::new("ZZZZ-USD")), "other");
    }

    #[test]
    fn global_cooldown_blocks_rapid_reentry() {
        let mut checker = LimitChecker::default();
        let positions = HashMap::new();
        checker.record_trade(&Symbol::new("BTC-USD"));
        let result = checker.check(&Symbol::new("ETH-USD"), &positions);
        assert!(result.is_err());
    }
}

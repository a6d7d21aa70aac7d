#![allow(dead_code)]
use serde::{Deserialize, Serialize};
use std::fmt;

/// A tradeable symbol, e.g. "SOL-USD". The universe spans hundreds of
/// symbols so this is an open string newtype rather than a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Base asset, e.g. "SOL" from "SOL-USD". Falls back to the whole
    /// symbol when no separator is present.
    pub fn base(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }

    pub fn quote(&self) -> &str {
        self.0.split('-').nth(1).unwrap_or("USD")
    }

    pub fn is_stablecoin_base(&self) -> bool {
        const STABLES: &[&str] = &["USDT", "USDC", "DAI", "USD", "EURC", "FDUSD", "PYUSD", "GUSD", "TUSD"];
        STABLES.contains(&self.base())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Symbol::new(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeFrame {
    M1,
    M5,
    M15,
    H1,
    H4,
    D1,
}

impl TimeFrame {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFrame::M1 => "1m",
            TimeFrame::M5 => "5m",
            TimeFrame::M15 => "15m",
            TimeFrame::H1 => "1h",
            TimeFrame::H4 => "4h",
            TimeFrame::D1 => "1d",
        }
    }

    pub fn to_minutes(&self) -> u64 {
        match self {
            TimeFrame::M1 => 1,
            TimeFrame::M5 => 5,
            TimeFrame::M15 => 15,
            TimeFrame::H1 => 60,
            TimeFrame::H4 => 240,
            TimeFrame::D1 => 1440,
        }
    }

    /// Maps this timeframe to the exchange's granularity enum name, per
    /// the REST candle endpoint's accepted values.
    pub fn granularity_name(&self) -> &'static str {
        match self {
            TimeFrame::M1 => "ONE_MINUTE",
            TimeFrame::M5 => "FIVE_MINUTE",
            TimeFrame::M15 => "FIFTEEN_MINUTE",
            TimeFrame::H1 => "ONE_HOUR",
            TimeFrame::H4 => "SIX_HOUR",
            TimeFrame::D1 => "ONE_DAY",
        }
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradingMode {
    Paper,
    Live,
}

impl fmt::Display for TradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradingMode::Paper => write!(f, "paper"),
            TradingMode::Live => write!(f, "live"),
        }
    }
}

/// Coarse market mood, derived from BTC 1h trend. See
/// `intelligence::regime::RegimeDetector`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Regime {
    #[default]
    Normal,
    Caution,
    RiskOff,
}

impl Regime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::Normal => "normal",
            Regime::Caution => "caution",
            Regime::RiskOff => "risk_off",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Symbol class for polling cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    T1Ws,
    T2Fast,
    T3Slow,
}

impl Tier {
    pub fn poll_interval_secs(&self) -> Option<u64> {
        match self {
            Tier::T1Ws => None,
            Tier::T2Fast => Some(15),
            Tier::T3Slow => Some(60),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::T1Ws => write!(f, "T1_WS"),
            Tier::T2Fast => write!(f, "T2_FAST"),
            Tier::T3Slow => write!(f, "T3_SLOW"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapClass {
    Large,
    Mid,
    Small,
    Micro,
}

impl CapClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapClass::Large => "large",
            CapClass::Mid => "mid",
            CapClass::Small => "small",
            CapClass::Micro => "micro",
        }
    }
}

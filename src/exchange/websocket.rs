use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{TimeZone, Utc};
use futures_util::{SinkExt, StreamExt};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::types::{Candle, Symbol, Ticker, TimeFrame};

use super::binance::exchange_symbol;

const BINANCE_US_WS: &str = "wss://stream.binance.us:9443/ws";
const BINANCE_US_STREAM: &str = "wss://stream.binance.us:9443/stream";

/// §4.1 reconnection policy: 1s initial backoff, doubling to a 60s cap,
/// give up entirely after this many consecutive failed handshakes.
const RECONNECT_BASE_SECS: u64 = 1;
const RECONNECT_MAX_SECS: u64 = 60;
const MAX_CONSECUTIVE_FAILURES: u32 = 10;

/// Raw feed off the wire, before main's collector folds it into
/// `FeatureRegistry`/`TierScheduler` state and re-emits a normalized
/// `types::event::MarketEvent` onto the shared bus.
#[derive(Debug, Clone)]
pub enum WsEvent {
    Ticker(Ticker),
    Candle(Candle),
    Disconnected,
    Error(String),
}

/// Cheap, cloneable handle onto the collector's connection health, per
/// §4.1's `is_receiving`/`last_message_age` surface. Shared between the
/// background reconnect task and whoever owns the event receiver.
#[derive(Clone)]
pub struct CollectorHealth {
    connected: Arc<AtomicBool>,
    last_message_millis: Arc<AtomicI64>,
}

impl CollectorHealth {
    fn new() -> Self {
        Self {
            connected: Arc::new(AtomicBool::new(false)),
            last_message_millis: Arc::new(AtomicI64::new(Utc::now().timestamp_millis())),
        }
    }

    fn mark_connected(&self) {
        self.connected.store(true, Ordering::SeqCst);
        self.touch();
    }

    fn mark_disconnected(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    fn touch(&self) {
        self.last_message_millis.store(Utc::now().timestamp_millis(), Ordering::SeqCst);
    }

    pub fn last_message_age_secs(&self) -> i64 {
        let last = self.last_message_millis.load(Ordering::SeqCst);
        (Utc::now().timestamp_millis() - last) / 1000
    }

    /// True once connected and the last message arrived within 30s.
    pub fn is_receiving(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && self.last_message_age_secs() < 30
    }
}

pub struct BinanceWebSocket {
    streams: Vec<String>,
}

impl BinanceWebSocket {
    pub fn new() -> Self {
        Self { streams: Vec::new() }
    }

    pub fn subscribe_ticker(&mut self, symbol: &Symbol) -> &mut Self {
        let stream = format!("{}@ticker", exchange_symbol(symbol).to_lowercase());
        self.streams.push(stream);
        self
    }

    pub fn subscribe_kline(&mut self, symbol: &Symbol, timeframe: TimeFrame) -> &mut Self {
        let stream = format!("{}@kline_{}", exchange_symbol(symbol).to_lowercase(), timeframe.as_str());
        self.streams.push(stream);
        self
    }

    /// Subscribes ticker + kline streams for every symbol currently in
    /// tier 1 (websocket-fed) — the only tier that gets a push feed.
    pub fn subscribe_symbols(&mut self, symbols: &[Symbol], timeframe: TimeFrame) -> &mut Self {
        for symbol in symbols {
            self.subscribe_ticker(symbol);
            self.subscribe_kline(symbol, timeframe);
        }
        self
    }

    /// Connects in the background, reconnecting with exponential backoff
    /// (1s doubling to a 60s cap) on every drop, and gives up after
    /// `MAX_CONSECUTIVE_FAILURES` handshakes in a row fail. A successful
    /// connection resets the backoff and failure counter.
    pub async fn connect(self) -> Result<(mpsc::Receiver<WsEvent>, CollectorHealth)> {
        let (tx, rx) = mpsc::channel(1000);
        let health = CollectorHealth::new();

        if self.streams.is_empty() {
            return Err(anyhow!("No streams subscribed"));
        }

        let url = if self.streams.len() == 1 {
            format!("{}/{}", BINANCE_US_WS, self.streams[0])
        } else {
            format!("{}?streams={}", BINANCE_US_STREAM, self.streams.join("/"))
        };

        info!("Connecting to WebSocket: {}", url);

        let tx_clone = tx.clone();
        let health_clone = health.clone();
        tokio::spawn(async move {
            let mut consecutive_failures: u32 = 0;

            loop {
                match Self::run_connection(&url, tx_clone.clone(), &health_clone).await {
                    Ok(_) => {
                        warn!("WebSocket connection closed, reconnecting...");
                        consecutive_failures = 0;
                    }
                    Err(e) => {
                        error!("WebSocket error: {}, reconnecting...", e);
                        let _ = tx_clone.send(WsEvent::Error(e.to_string())).await;
                        consecutive_failures += 1;
                    }
                }

                health_clone.mark_disconnected();
                let _ = tx_clone.send(WsEvent::Disconnected).await;

                if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                    error!(
                        "WebSocket gave up after {} consecutive failures",
                        consecutive_failures
                    );
                    let _ = tx_clone
                        .send(WsEvent::Error("giving up after max consecutive failures".into()))
                        .await;
                    break;
                }

                let backoff_secs = RECONNECT_BASE_SECS
                    .saturating_shl(consecutive_failures.min(6))
                    .min(RECONNECT_MAX_SECS);
                tokio::time::sleep(tokio::time::Duration::from_secs(backoff_secs)).await;
            }
        });

        Ok((rx, health))
    }

    async fn run_connection(url: &str, tx: mpsc::Sender<WsEvent>, health: &CollectorHealth) -> Result<()> {
        let (ws_stream, _) = connect_async(url).await?;
        let (mut write, mut read) = ws_stream.split();

        info!("WebSocket connected");
        health.mark_connected();

        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    health.touch();
                    if let Some(event) = Self::parse_message(&text) {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                }
                Ok(Message::Ping(data)) => {
                    debug!("Received ping, sending pong");
                    health.touch();
                    let _ = write.send(Message::Pong(data)).await;
                }
                Ok(Message::Close(_)) => {
                    info!("WebSocket closed by server");
                    break;
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn parse_message(text: &str) -> Option<WsEvent> {
        if let Ok(combined) = serde_json::from_str::<CombinedStreamMessage>(text) {
            return Self::parse_stream_data(&combined.stream, &combined.data);
        }

        if let Ok(ticker) = serde_json::from_str::<WsTickerMessage>(text) {
            if ticker.event_type == "24hrTicker" {
                return Self::parse_ticker(&ticker);
            }
        }

        if let Ok(kline) = serde_json::from_str::<WsKlineMessage>(text) {
            if kline.event_type == "kline" {
                return Self::parse_kline(&kline);
            }
        }

        debug!("Unknown message type: {}", text);
        None
    }

    fn parse_stream_data(stream: &str, data: &serde_json::Value) -> Option<WsEvent> {
        if stream.contains("@ticker") {
            let ticker: WsTickerMessage = serde_json::from_value(data.clone()).ok()?;
            return Self::parse_ticker(&ticker);
        }

        if stream.contains("@kline") {
            let kline: WsKlineMessage = serde_json::from_value(data.clone()).ok()?;
            return Self::parse_kline(&kline);
        }

        None
    }

    fn parse_ticker(msg: &WsTickerMessage) -> Option<WsEvent> {
        Some(WsEvent::Ticker(Ticker {
            symbol: Symbol::new(msg.symbol.clone()),
            price: Decimal::from_str(&msg.last_price).ok()?,
            bid: Decimal::from_str(&msg.best_bid).ok(),
            ask: Decimal::from_str(&msg.best_ask).ok(),
            timestamp: Utc::now(),
        }))
    }

    fn parse_kline(msg: &WsKlineMessage) -> Option<WsEvent> {
        let k = &msg.kline;
        let timeframe = match k.interval.as_str() {
            "1m" => TimeFrame::M1,
            "5m" => TimeFrame::M5,
            "15m" => TimeFrame::M15,
            "1h" => TimeFrame::H1,
            "4h" => TimeFrame::H4,
            "1d" => TimeFrame::D1,
            _ => return None,
        };

        Some(WsEvent::Candle(Candle {
            symbol: Symbol::new(msg.symbol.clone()),
            timeframe,
            timestamp: Utc.timestamp_millis_opt(k.start_time).single()?,
            open: Decimal::from_str(&k.open).ok()?,
            high: Decimal::from_str(&k.high).ok()?,
            low: Decimal::from_str(&k.low).ok()?,
            close: Decimal::from_str(&k.close).ok()?,
            volume: Decimal::from_str(&k.volume).ok()?,
            is_closed: k.is_closed,
        }))
    }
}

impl Default for BinanceWebSocket {
    fn default() -> Self {
        Self::new()
    }
}

// WebSocket Message Types
#[derive(Debug, Deserialize)]
struct CombinedStreamMessage {
    stream: String,
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct WsTickerMessage {
    #[serde(rename = "e")]
    event_type: String,
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "c")]
    last_price: String,
    #[serde(rename = "b")]
    best_bid: String,
    #[serde(rename = "a")]
    best_ask: String,
}

#[derive(Debug, Deserialize)]
struct WsKlineMessage {
    #[serde(rename = "e")]
    event_type: String,
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "k")]
    kline: WsKlineData,
}

#[derive(Debug, Deserialize)]
struct WsKlineData {
    #[serde(rename = "t")]
    start_time: i64,
    #[serde(rename = "i")]
    interval: String,
    #[serde(rename = "o")]
    open: String,
    #[serde(rename = "h")]
    high: String,
    #[serde(rename = "l")]
    low: String,
    #[serde(rename = "c")]
    close: String,
    #[serde(rename = "v")]
    volume: String,
    #[serde(rename = "x")]
    is_closed: bool,
}

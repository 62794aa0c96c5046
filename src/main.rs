use std::sync::{Arc, Mutex, RwLock};

use clap::Parser;
use tokio::sync::{mpsc, watch};
use tokio::time::Duration;

use trendbot::config::StrategyConfig;
use trendbot::engine::{run_event_loop, StrategyController};
use trendbot::feed::{MarketScenario, SyntheticFeed};
use trendbot::gateway::PaperGateway;
use trendbot::risk::RateLimiter;

/// Single-instrument trend-following engine, paper-traded against a
/// synthetic market feed
#[derive(Parser, Debug)]
#[command(name = "trendbot")]
struct Cli {
    /// Instrument to trade (overrides TRENDBOT_INSTRUMENT)
    #[arg(long)]
    instrument: Option<String>,

    /// Synthetic market scenario: uptrend, downtrend or sideways
    #[arg(long, default_value = "uptrend")]
    scenario: String,

    /// Number of synthetic price steps to stream
    #[arg(long, default_value_t = 300)]
    steps: usize,

    /// RNG seed for the synthetic feed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Milliseconds between price steps
    #[arg(long, default_value_t = 10)]
    step_interval_ms: u64,

    /// Starting price for the synthetic tape
    #[arg(long, default_value_t = 50_000.0)]
    base_price: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();
    let scenario: MarketScenario = cli
        .scenario
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let mut config = StrategyConfig::from_env();
    if let Some(instrument) = cli.instrument {
        config.instrument = instrument;
    }
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!("🚀 trendbot starting");
    tracing::info!("Configuration: {}", serde_json::to_string_pretty(&config)?);
    tracing::info!(
        "Feed: {:?} scenario, {} steps, seed {}",
        scenario,
        cli.steps,
        cli.seed
    );

    // One channel carries the whole mutation surface: market data from the
    // feed plus account updates from the paper venue
    let (tx, rx) = mpsc::channel(256);
    let mark = Arc::new(RwLock::new(cli.base_price));
    let limiter = Arc::new(Mutex::new(RateLimiter::new(config.max_orders_per_minute)));

    let instrument = config.instrument.clone();
    let gateway = Arc::new(PaperGateway::new(
        &instrument,
        config.capital,
        mark.clone(),
        tx.clone(),
    ));
    let controller = StrategyController::new(config, limiter.clone());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let feed = SyntheticFeed::new(instrument, cli.seed, cli.base_price);
    let feed_handle = tokio::spawn(feed.stream(
        scenario,
        cli.steps,
        tx,
        mark,
        Duration::from_millis(cli.step_interval_ms),
    ));

    let engine_handle = tokio::spawn(run_event_loop(
        controller,
        rx,
        gateway,
        limiter,
        shutdown_rx,
    ));

    tokio::select! {
        _ = feed_handle => {
            // Grace period for in-flight submissions to fill and report back
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl-C received, shutting down");
        }
    }
    shutdown_tx.send(true).ok();

    let controller = engine_handle.await?;
    let account = controller.account();
    tracing::info!("📊 Final state:");
    tracing::info!("  Position: {:?}", account.position());
    tracing::info!("  Position size: {:.6}", account.position_size());
    tracing::info!("  Capital: ${:.2}", account.capital());
    tracing::info!(
        "  Samples in history: {}",
        controller.market().history().len()
    );

    Ok(())
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "trendbot=info".to_string()),
        )
        .init();
}

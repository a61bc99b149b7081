//! TALOS — Threshold-Aware Live Options Scanner
//!
//! Entry point. Loads configuration, initialises structured logging,
//! builds the broker client, and runs the scan→display→execute loop
//! with graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use talos::broker::alpaca::AlpacaClient;
use talos::config;
use talos::display;
use talos::engine::executor::Executor;
use talos::engine::scanner::{ScanConfig, Scanner};

const BANNER: &str = r#"
 _____  _    _     ___  ____
|_   _|/ \  | |   / _ \/ ___|
  | | / _ \ | |  | | | \___ \
  | |/ ___ \| |__| |_| |___) |
  |_/_/   \_\_____\___/|____/

  Threshold-Aware Live Options Scanner
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = config::AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        symbols = ?cfg.scanner.symbols,
        scan_interval_secs = cfg.scanner.scan_interval_secs,
        max_in_flight = cfg.scanner.max_in_flight,
        min_profit = %cfg.scanner.min_profit,
        orders_enabled = cfg.orders.enabled,
        "TALOS starting up"
    );

    // -- Broker client ----------------------------------------------------

    let (api_key, secret_key) = cfg.alpaca.resolve_credentials()?;
    let client = Arc::new(
        AlpacaClient::new(&cfg.alpaca, &api_key, &secret_key)
            .context("Failed to build Alpaca client")?,
    );

    match client.fetch_market_clock().await {
        Some(clock) => info!(clock = %clock, "Connected to venue"),
        None => info!("Venue clock unavailable, continuing anyway"),
    }

    // -- Pipeline components ----------------------------------------------

    let scanner = Scanner::new(
        client.clone(),
        ScanConfig {
            filters: cfg.snapshot.clone(),
            quote_feed: cfg.quote.feed.clone(),
            max_in_flight: cfg.scanner.max_in_flight,
            min_profit: cfg.scanner.min_profit,
        },
    );

    let executor = Executor::new(client, cfg.orders.clone());

    // -- Main loop ---------------------------------------------------------

    let scan_interval = Duration::from_secs(cfg.scanner.scan_interval_secs);
    let mut interval = tokio::time::interval(scan_interval);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        interval_secs = cfg.scanner.scan_interval_secs,
        "Entering scan loop. Press Ctrl+C to stop."
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                display::clear_screen();
                for symbol in &cfg.scanner.symbols {
                    let report = scanner.scan(symbol).await;
                    display::print_report(&report);

                    let summary = executor.execute(&report).await;
                    info!(symbol = %symbol, report = %report, execution = %summary, "Cycle complete");
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    executor.shutdown();
    info!("TALOS shut down cleanly.");

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("talos=info"));

    let json_logging = std::env::var("TALOS_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}

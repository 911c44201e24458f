//! TradeSmart server entry point.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use tradesmart_engine::{AdmissionFilter, PaperEngine};
use tradesmart_monitor::PositionMonitor;
use tradesmart_notify::Notifier;
use tradesmart_oracle::VerdictOracle;
use tradesmart_persistence::StateStore;
use tradesmart_quotes::QuoteClient;
use tradesmart_server::{build_router, AnalysisOrchestrator, AppConfig, AppState};

/// TradeSmart: webhook-driven LLM analysis and paper trading
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via TRADESMART_CONFIG)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tradesmart_server::logging::init_logging();
    info!("Starting TradeSmart v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load(args.config.as_deref()).context("loading configuration")?;
    info!(
        bind_addr = %config.server.bind_addr,
        paper_trading = config.paper_trading.enabled,
        "Configuration loaded"
    );

    let timeframes = config.analysis.parsed_timeframes()?;

    let quotes = QuoteClient::new(config.quotes.clone()).context("building quote client")?;
    let oracle = VerdictOracle::new(config.oracle.clone()).context("building oracle client")?;
    let notifier = Arc::new(Notifier::new(config.notifier.clone()));

    let store = StateStore::new(
        &config.paper_trading.state_file_path,
        config.paper_trading.initial_balance,
    );
    let engine = Arc::new(PaperEngine::new(config.paper_trading.clone(), store));
    let admission = Arc::new(AdmissionFilter::new(engine.clone()));

    let orchestrator = Arc::new(AnalysisOrchestrator::new(
        quotes.clone(),
        oracle,
        admission,
        notifier.clone(),
        timeframes,
        config.analysis.candles_per_timeframe,
    ));

    let shutdown = CancellationToken::new();

    // Monitor runs only when paper trading is on
    let monitor_handle = if config.paper_trading.enabled {
        let monitor = PositionMonitor::new(
            engine.clone(),
            quotes,
            notifier.clone(),
            Duration::from_secs(config.paper_trading.monitor_interval_secs),
            shutdown.clone(),
        );
        Some(tokio::spawn(monitor.run()))
    } else {
        info!("Paper trading disabled, position monitor not started");
        None
    };

    let state = AppState {
        orchestrator,
        engine,
        notifier,
        webhook_secret: config.webhook.effective_secret().map(str::to_string),
    };
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.server.bind_addr))?;
    info!(addr = %config.server.bind_addr, "HTTP server listening");

    let server_shutdown = shutdown.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
            server_shutdown.cancel();
        })
        .await
        .context("HTTP server failed")?;

    shutdown.cancel();
    if let Some(handle) = monitor_handle {
        handle.await.ok();
    }
    info!("TradeSmart stopped");
    Ok(())
}

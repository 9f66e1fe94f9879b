//! Automation Engine Binary
//!
//! Runs the engine against a paper venue seeded from a portfolio snapshot.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin automation-engine
//! ```
//!
//! # Environment Variables
//!
//! - `AUTOMATION_CONFIG`: YAML config path (default: automation.yaml)
//! - `AUTOMATION_SNAPSHOT`: JSON portfolio snapshot (default: empty book)
//! - `RUST_LOG`: Overrides `observability.logging.level`

use std::sync::Arc;

use anyhow::Context;
use automation_engine::config::load_config;
use automation_engine::domain::market::AccountSnapshot;
use automation_engine::observability::{init_metrics, init_tracing};
use automation_engine::{AutomationEngine, PaperVenue, PortfolioSnapshot, SystemClock};
use rust_decimal::Decimal;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let config_path = std::env::var("AUTOMATION_CONFIG").ok();
    let config = load_config(config_path.as_deref()).context("loading configuration")?;

    init_tracing(&config.observability.logging);
    tracing::info!(
        config = config_path.as_deref().unwrap_or("automation.yaml"),
        "Starting automation engine"
    );

    if config.observability.metrics.enabled
        && let Err(e) = init_metrics(&config.observability.metrics)
    {
        tracing::warn!(error = %e, "Metrics exporter failed to start, continuing without it");
    }

    let venue = create_venue()?;
    let engine = AutomationEngine::new(config, venue.collaborators())?;

    spawn_event_log(&engine);
    engine.start()?;

    let status = engine.status();
    tracing::info!(
        position_management = status.position_management_enabled,
        emergency_monitor = status.emergency_monitor_enabled,
        auto_entry = status.auto_entry_enabled,
        "Automation engine ready"
    );

    shutdown_signal().await;
    engine.stop();

    tracing::info!(
        queue_depth = engine.status().queue_depth,
        intents = venue.orders.intents().len(),
        "Automation engine stopped"
    );
    Ok(())
}

/// Load .env file if present.
fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("ignoring unreadable .env: {e}");
    }
}

/// Paper venue from `AUTOMATION_SNAPSHOT`, or an empty book.
fn create_venue() -> anyhow::Result<PaperVenue> {
    let clock = Arc::new(SystemClock);

    let Ok(path) = std::env::var("AUTOMATION_SNAPSHOT") else {
        tracing::warn!("AUTOMATION_SNAPSHOT not set, starting with an empty book");
        let account = AccountSnapshot {
            net_liquidation: Decimal::ZERO,
            daily_pnl: Decimal::ZERO,
            buying_power_used: Decimal::ZERO,
            buying_power_total: Decimal::ZERO,
        };
        return Ok(PaperVenue::new(Vec::new(), account, clock));
    };

    let snapshot = PortfolioSnapshot::load(&path).with_context(|| format!("loading snapshot {path}"))?;
    tracing::info!(
        path = %path,
        positions = snapshot.positions.len(),
        quotes = snapshot.quotes.len(),
        chains = snapshot.chains.len(),
        "Portfolio snapshot loaded"
    );
    Ok(PaperVenue::from_snapshot(snapshot, clock))
}

/// Mirror engine events to the log as JSON.
fn spawn_event_log(engine: &AutomationEngine) {
    let mut events = engine.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => tracing::debug!(event = %json, "Engine event"),
                    Err(e) => tracing::warn!(error = %e, "Failed to serialize event"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event log lagging");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}

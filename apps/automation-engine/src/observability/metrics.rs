//! Prometheus metrics for the automation engine.
//!
//! Queue traffic, execution outcomes, emergency triggers, entry signals and
//! tick timing. Recording is a no-op until a recorder is installed, so the
//! engine records unconditionally.
//!
//! # Example
//!
//! ```ignore
//! use automation_engine::config::MetricsSettings;
//! use automation_engine::observability::init_metrics;
//!
//! init_metrics(&MetricsSettings::default()).expect("Failed to initialize metrics");
//! record_action_queued("STOP_LOSS");
//! ```

use std::net::SocketAddr;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::config::MetricsSettings;

/// Tick duration buckets, 1ms to 30s.
const TICK_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

/// Initialize the Prometheus metrics exporter.
///
/// Starts an HTTP listener exposing `/metrics` on `settings.listen_addr`.
///
/// # Errors
///
/// Returns an error if the address does not parse or the exporter fails to
/// start (e.g., port already in use).
pub fn init_metrics(settings: &MetricsSettings) -> Result<(), MetricsError> {
    let addr: SocketAddr = settings
        .listen_addr
        .parse()
        .map_err(|e| MetricsError::Configuration(format!("{}: {e}", settings.listen_addr)))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets(TICK_BUCKETS)
        .map_err(|e| MetricsError::Configuration(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(addr = %addr, "Prometheus metrics exporter started");

    Ok(())
}

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to configure metrics exporter.
    #[error("metrics configuration error: {0}")]
    Configuration(String),
    /// Failed to install metrics exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

// ============================================================================
// Action Queue Metrics
// ============================================================================

/// Record an action entering the queue.
///
/// # Arguments
///
/// * `action_type` - Action type wire name (e.g., `"MANAGE_21DTE"`)
pub fn record_action_queued(action_type: &str) {
    counter!(
        "automation_actions_queued_total",
        "action_type" => action_type.to_string()
    )
    .increment(1);
}

/// Record an action rejected at enqueue.
///
/// # Arguments
///
/// * `action_type` - Action type wire name
/// * `outcome` - `"duplicate"` or `"cooling_down"`
pub fn record_action_skipped(action_type: &str, outcome: &str) {
    counter!(
        "automation_actions_skipped_total",
        "action_type" => action_type.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a successful execution.
pub fn record_action_executed(action_type: &str) {
    counter!(
        "automation_actions_executed_total",
        "action_type" => action_type.to_string()
    )
    .increment(1);
}

/// Record a failed execution.
///
/// # Arguments
///
/// * `action_type` - Action type wire name
/// * `requeued` - Whether the action went back on the queue (false = dropped)
pub fn record_action_failed(action_type: &str, requeued: bool) {
    let disposition = if requeued { "requeued" } else { "dropped" };
    counter!(
        "automation_actions_failed_total",
        "action_type" => action_type.to_string(),
        "disposition" => disposition.to_string()
    )
    .increment(1);
}

/// Update queue depth and cooling-down gauges.
pub fn update_queue_gauges(depth: usize, cooling_down: usize) {
    #[allow(clippy::cast_precision_loss)]
    {
        gauge!("automation_queue_depth").set(depth as f64);
        gauge!("automation_cooling_down").set(cooling_down as f64);
    }
}

// ============================================================================
// Emergency and Entry Metrics
// ============================================================================

/// Record an emergency check firing.
///
/// # Arguments
///
/// * `trigger` - Trigger label (e.g., `"drawdown"`, `"volatility_spike"`)
pub fn record_emergency_trigger(trigger: &str) {
    counter!(
        "automation_emergency_triggers_total",
        "trigger" => trigger.to_string()
    )
    .increment(1);
}

/// Record an entry signal.
///
/// # Arguments
///
/// * `strategy` - Strategy name (e.g., `"zero_dte"`)
pub fn record_entry_signal(strategy: &str) {
    counter!(
        "automation_entry_signals_total",
        "strategy" => strategy.to_string()
    )
    .increment(1);
}

// ============================================================================
// Tick Metrics
// ============================================================================

/// Record a completed or abandoned tick.
///
/// # Arguments
///
/// * `cadence` - `"regular"` or `"emergency"`
/// * `status` - `"ok"`, `"error"` or `"halted"`
/// * `duration_seconds` - Wall time of the tick
pub fn record_tick(cadence: &str, status: &str, duration_seconds: f64) {
    counter!(
        "automation_ticks_total",
        "cadence" => cadence.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        "automation_tick_duration_seconds",
        "cadence" => cadence.to_string()
    )
    .record(duration_seconds);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_recorder_is_noop() {
        record_action_queued("STOP_LOSS");
        record_action_skipped("STOP_LOSS", "duplicate");
        record_action_executed("STOP_LOSS");
        record_action_failed("EMERGENCY_CLOSE", false);
        update_queue_gauges(3, 1);
        record_emergency_trigger("drawdown");
        record_entry_signal("zero_dte");
        record_tick("regular", "ok", 0.02);
    }

    #[test]
    fn bad_listen_addr_is_configuration_error() {
        let settings = MetricsSettings {
            enabled: true,
            listen_addr: "not-an-address".to_string(),
        };
        assert!(matches!(
            init_metrics(&settings),
            Err(MetricsError::Configuration(_))
        ));
    }
}

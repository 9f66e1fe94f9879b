//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise `observability.logging.level` becomes
//! the default directive for this crate.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Output formats accepted by `observability.logging.format`.
pub const LOG_FORMATS: &[&str] = &["json", "pretty"];

/// Build the filter used by [`init_tracing`].
#[must_use]
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("automation_engine={}", config.level)))
}

/// Install the global subscriber.
///
/// Does nothing if a subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = env_filter(config);

    let result = if config.format == "pretty" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .pretty()
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(false)
            .try_init()
    };

    if let Err(e) = result {
        eprintln!("tracing subscriber already installed: {e}");
    }
}

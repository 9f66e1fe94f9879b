//! Configuration module for the automation engine.
//!
//! Loads YAML configuration with environment variable interpolation and
//! validates every tunable before the engine is built.
//!
//! # Usage
//!
//! ```rust,ignore
//! use automation_engine::config::load_config;
//!
//! // Load from default path (automation.yaml)
//! let config = load_config(None)?;
//!
//! println!("regular cadence: {}s", config.engine.regular_interval_secs);
//! ```

mod emergency;
mod engine;
mod entry;
mod management;
mod observability;
mod roll;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::market::CorrelationGroups;

pub use emergency::EmergencyConfig;
pub use engine::EngineConfig;
pub use entry::{EntryConfig, LongDatedConfig, StrangleConfig, ZeroDteConfig};
pub use management::ManagementConfig;
pub use observability::{LoggingConfig, MetricsSettings, ObservabilityConfig};
pub use roll::{DteBand, RollConfig};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Cadences, feature switches, reference symbols.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Position evaluator thresholds.
    #[serde(default)]
    pub management: ManagementConfig,
    /// Emergency monitor thresholds.
    #[serde(default)]
    pub emergency: EmergencyConfig,
    /// Roll analyzer parameters.
    #[serde(default)]
    pub roll: RollConfig,
    /// Entry evaluator parameters.
    #[serde(default)]
    pub entry: EntryConfig,
    /// Correlation groups, name → symbols.
    #[serde(default)]
    pub correlation_groups: CorrelationGroups,
    /// Logging and metrics.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

pub(crate) const fn default_true() -> bool {
    true
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "automation.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("automation.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string.
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match cap.get(1).map(|m| std::env::var(m.as_str())) {
            Some(Ok(v)) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

fn check_pct(name: &str, value: rust_decimal::Decimal) -> Result<(), ConfigError> {
    if value < rust_decimal::Decimal::ZERO || value > rust_decimal::Decimal::ONE_THOUSAND {
        return Err(ConfigError::ValidationError(format!(
            "{name} must be between 0 and 1000 percent"
        )));
    }
    Ok(())
}

fn check_delta(name: &str, value: rust_decimal::Decimal) -> Result<(), ConfigError> {
    if value <= rust_decimal::Decimal::ZERO || value >= rust_decimal::Decimal::ONE {
        return Err(ConfigError::ValidationError(format!(
            "{name} must be between 0 and 1 (exclusive)"
        )));
    }
    Ok(())
}

fn check_band(name: &str, band: DteBand) -> Result<(), ConfigError> {
    if band.min < 0 || band.min > band.max {
        return Err(ConfigError::ValidationError(format!(
            "{name} must satisfy 0 <= min <= max (got {}..{})",
            band.min, band.max
        )));
    }
    Ok(())
}

/// Validate configuration values.
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` naming the first offending field.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let engine = &config.engine;
    if engine.regular_interval_secs == 0 || engine.emergency_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "engine intervals must be positive".to_string(),
        ));
    }
    engine.cooldown()?;
    if engine.event_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "engine.event_capacity must be positive".to_string(),
        ));
    }

    let management = &config.management;
    check_pct("management.profit_target_pct", management.profit_target_pct)?;
    check_pct("management.roll_below_pct", management.roll_below_pct)?;
    check_pct("management.stop_loss_pct", management.stop_loss_pct)?;
    check_pct("management.tested_buffer_pct", management.tested_buffer_pct)?;
    if management.roll_below_pct > management.profit_target_pct {
        return Err(ConfigError::ValidationError(
            "management.roll_below_pct must not exceed profit_target_pct".to_string(),
        ));
    }
    if management.management_dte < 0 || management.defensive_dte < 0 {
        return Err(ConfigError::ValidationError(
            "management DTE thresholds must be non-negative".to_string(),
        ));
    }

    check_pct(
        "emergency.max_daily_drawdown_pct",
        config.emergency.max_daily_drawdown_pct,
    )?;
    if config.emergency.correlation_breach == 0 {
        return Err(ConfigError::ValidationError(
            "emergency.correlation_breach must be positive".to_string(),
        ));
    }

    let roll = &config.roll;
    check_band("roll.defensive_band", roll.defensive_band)?;
    check_band("roll.management_band", roll.management_band)?;
    check_band("roll.standard_band", roll.standard_band)?;
    check_delta("roll.defensive_delta", roll.defensive_delta)?;
    check_delta("roll.standard_delta", roll.standard_delta)?;
    check_delta("roll.defend_delta", roll.defend_delta)?;
    check_pct("roll.max_debit_pct", roll.max_debit_pct)?;
    check_pct("roll.defensive_max_debit_pct", roll.defensive_max_debit_pct)?;
    if roll.low_volatility > roll.high_volatility {
        return Err(ConfigError::ValidationError(
            "roll.low_volatility must not exceed high_volatility".to_string(),
        ));
    }

    let entry = &config.entry;
    entry.time_zone()?;
    entry.zero_dte.cutoff()?;
    check_pct("entry.max_buying_power_pct", entry.max_buying_power_pct)?;
    check_delta("entry.zero_dte.short_delta", entry.zero_dte.short_delta)?;
    check_delta("entry.long_dated.target_delta", entry.long_dated.target_delta)?;
    check_delta("entry.strangle.short_delta", entry.strangle.short_delta)?;
    let regime = &entry.regime;
    if !(regime.low <= regime.elevated && regime.elevated <= regime.extreme) {
        return Err(ConfigError::ValidationError(
            "entry.regime thresholds must be ascending".to_string(),
        ));
    }
    for (name, base, max) in [
        ("zero_dte", entry.zero_dte.base_lots, entry.zero_dte.max_lots),
        ("long_dated", entry.long_dated.base_lots, entry.long_dated.max_lots),
        ("strangle", entry.strangle.base_lots, entry.strangle.max_lots),
    ] {
        if base == 0 || max < base {
            return Err(ConfigError::ValidationError(format!(
                "entry.{name} lots must satisfy 0 < base_lots <= max_lots"
            )));
        }
    }

    let format = config.observability.logging.format.as_str();
    if !crate::observability::LOG_FORMATS.contains(&format) {
        return Err(ConfigError::ValidationError(format!(
            "observability.logging.format must be json or pretty (got {format})"
        )));
    }
    if config.observability.metrics.enabled
        && config
            .observability
            .metrics
            .listen_addr
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        return Err(ConfigError::ValidationError(
            "observability.metrics.listen_addr is not a socket address".to_string(),
        ));
    }

    Ok(())
}

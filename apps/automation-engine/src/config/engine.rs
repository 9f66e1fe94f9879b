//! Engine cadence and feature switches.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::{ConfigError, default_true};
use crate::domain::action::DEFAULT_COOLDOWN_SECS;
use crate::domain::shared::Symbol;

/// Engine-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Position evaluation, entry scanning, and drain cadence (seconds).
    #[serde(default = "default_regular_interval")]
    pub regular_interval_secs: u64,
    /// Emergency monitoring cadence (seconds).
    #[serde(default = "default_emergency_interval")]
    pub emergency_interval_secs: u64,
    /// How long an executed position stays ineligible for new actions (seconds).
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,
    /// Run the position evaluator on the regular cadence.
    #[serde(default = "default_true")]
    pub position_management_enabled: bool,
    /// Run the emergency monitor on the fast cadence.
    #[serde(default = "default_true")]
    pub emergency_monitor_enabled: bool,
    /// Run the entry evaluator on the regular cadence.
    #[serde(default)]
    pub auto_entry_enabled: bool,
    /// Volatility index quoted for regime and spike checks.
    #[serde(default = "default_volatility_symbol")]
    pub volatility_symbol: Symbol,
    /// Benchmark instrument for the trend reading.
    #[serde(default = "default_benchmark_symbol")]
    pub benchmark_symbol: Symbol,
    /// Capacity of the event broadcast channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            regular_interval_secs: default_regular_interval(),
            emergency_interval_secs: default_emergency_interval(),
            cooldown_secs: default_cooldown(),
            position_management_enabled: true,
            emergency_monitor_enabled: true,
            auto_entry_enabled: false,
            volatility_symbol: default_volatility_symbol(),
            benchmark_symbol: default_benchmark_symbol(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl EngineConfig {
    /// Cool-down window as a duration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `cooldown_secs` is zero or
    /// too large to represent.
    pub fn cooldown(&self) -> Result<Duration, ConfigError> {
        i64::try_from(self.cooldown_secs)
            .ok()
            .filter(|secs| *secs > 0)
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "engine.cooldown_secs {} out of range",
                    self.cooldown_secs
                ))
            })
    }
}

const fn default_regular_interval() -> u64 {
    60
}

const fn default_emergency_interval() -> u64 {
    5
}

const fn default_cooldown() -> u64 {
    DEFAULT_COOLDOWN_SECS.unsigned_abs()
}

fn default_volatility_symbol() -> Symbol {
    Symbol::new("VIX")
}

fn default_benchmark_symbol() -> Symbol {
    Symbol::new("SPY")
}

const fn default_event_capacity() -> usize {
    256
}

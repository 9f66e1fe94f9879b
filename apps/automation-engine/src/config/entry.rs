//! Automated entry parameters.

use chrono::{NaiveTime, Weekday};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{ConfigError, default_true};
use crate::domain::market::RegimeThresholds;
use crate::domain::shared::Symbol;

/// Entry evaluator settings shared by every strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryConfig {
    /// Most entries per local trading day.
    #[serde(default = "default_daily_max")]
    pub daily_max_entries: u32,
    /// No entries while buying-power utilization is above this percent.
    #[serde(default = "default_max_buying_power")]
    pub max_buying_power_pct: Decimal,
    /// IANA time zone of the trading day.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Queue priority of entry actions.
    #[serde(default = "default_entry_priority")]
    pub priority: i32,
    /// Skip symbols whose correlation group holds this many open positions.
    #[serde(default = "default_max_group_positions")]
    pub max_group_positions: usize,
    /// Benchmark change, in percent, that counts as a trend.
    #[serde(default = "default_trend_threshold")]
    pub trend_threshold_pct: Decimal,
    /// Volatility regime boundaries.
    #[serde(default)]
    pub regime: RegimeThresholds,
    /// Same-day expiration entries.
    #[serde(default)]
    pub zero_dte: ZeroDteConfig,
    /// Long-dated directional entries.
    #[serde(default)]
    pub long_dated: LongDatedConfig,
    /// Micro-futures strangle entries.
    #[serde(default)]
    pub strangle: StrangleConfig,
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            daily_max_entries: default_daily_max(),
            max_buying_power_pct: default_max_buying_power(),
            timezone: default_timezone(),
            priority: default_entry_priority(),
            max_group_positions: default_max_group_positions(),
            trend_threshold_pct: default_trend_threshold(),
            regime: RegimeThresholds::default(),
            zero_dte: ZeroDteConfig::default(),
            long_dated: LongDatedConfig::default(),
            strangle: StrangleConfig::default(),
        }
    }
}

impl EntryConfig {
    /// Parsed trading-day time zone.
    pub fn time_zone(&self) -> Result<Tz, ConfigError> {
        self.timezone.parse::<Tz>().map_err(|e| {
            ConfigError::ValidationError(format!("entry.timezone '{}': {e}", self.timezone))
        })
    }
}

/// Zero-DTE entry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZeroDteConfig {
    /// Evaluate this strategy.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Underlying traded.
    #[serde(default = "default_zero_dte_symbol")]
    pub symbol: Symbol,
    /// Only this weekday.
    #[serde(default = "default_weekday")]
    pub weekday: Weekday,
    /// Local cutoff hour; entries only after cutoff.
    #[serde(default = "default_cutoff_hour")]
    pub cutoff_hour: u32,
    /// Local cutoff minute.
    #[serde(default = "default_cutoff_minute")]
    pub cutoff_minute: u32,
    /// Never enter with the volatility index above this.
    #[serde(default = "default_zero_dte_ceiling")]
    pub volatility_ceiling: Decimal,
    /// Minimum score to enter.
    #[serde(default = "default_zero_dte_threshold")]
    pub entry_threshold: Decimal,
    /// Short-leg |delta| target.
    #[serde(default = "default_zero_dte_delta")]
    pub short_delta: Decimal,
    /// Wing width in strike points.
    #[serde(default = "default_zero_dte_wing")]
    pub wing_width: Decimal,
    /// Contracts before score scaling.
    #[serde(default = "default_base_lots")]
    pub base_lots: u32,
    /// Contract ceiling after scaling.
    #[serde(default = "default_zero_dte_max_lots")]
    pub max_lots: u32,
}

impl Default for ZeroDteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            symbol: default_zero_dte_symbol(),
            weekday: default_weekday(),
            cutoff_hour: default_cutoff_hour(),
            cutoff_minute: default_cutoff_minute(),
            volatility_ceiling: default_zero_dte_ceiling(),
            entry_threshold: default_zero_dte_threshold(),
            short_delta: default_zero_dte_delta(),
            wing_width: default_zero_dte_wing(),
            base_lots: default_base_lots(),
            max_lots: default_zero_dte_max_lots(),
        }
    }
}

impl ZeroDteConfig {
    /// Local cutoff time.
    pub fn cutoff(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::from_hms_opt(self.cutoff_hour, self.cutoff_minute, 0).ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "entry.zero_dte cutoff {}:{} is not a valid time",
                self.cutoff_hour, self.cutoff_minute
            ))
        })
    }
}

/// Long-dated entry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LongDatedConfig {
    /// Evaluate this strategy.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Candidates, in preference order.
    #[serde(default = "default_long_dated_symbols")]
    pub symbols: Vec<Symbol>,
    /// Minimum score to enter.
    #[serde(default = "default_swing_threshold")]
    pub entry_threshold: Decimal,
    /// Target DTE of the structure.
    #[serde(default = "default_long_dated_dte")]
    pub target_dte: i64,
    /// |delta| of the purchased leg.
    #[serde(default = "default_long_dated_delta")]
    pub target_delta: Decimal,
    /// Contracts before score scaling.
    #[serde(default = "default_base_lots")]
    pub base_lots: u32,
    /// Contract ceiling after scaling.
    #[serde(default = "default_long_dated_max_lots")]
    pub max_lots: u32,
}

impl Default for LongDatedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            symbols: default_long_dated_symbols(),
            entry_threshold: default_swing_threshold(),
            target_dte: default_long_dated_dte(),
            target_delta: default_long_dated_delta(),
            base_lots: default_base_lots(),
            max_lots: default_long_dated_max_lots(),
        }
    }
}

/// Strangle entry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrangleConfig {
    /// Evaluate this strategy.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Micro-futures candidates, in preference order.
    #[serde(default = "default_strangle_symbols")]
    pub symbols: Vec<Symbol>,
    /// Minimum score to enter.
    #[serde(default = "default_swing_threshold")]
    pub entry_threshold: Decimal,
    /// Target DTE.
    #[serde(default = "default_strangle_dte")]
    pub target_dte: i64,
    /// Short-leg |delta| target.
    #[serde(default = "default_strangle_delta")]
    pub short_delta: Decimal,
    /// Contracts before score scaling.
    #[serde(default = "default_base_lots")]
    pub base_lots: u32,
    /// Contract ceiling after scaling.
    #[serde(default = "default_strangle_max_lots")]
    pub max_lots: u32,
}

impl Default for StrangleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            symbols: default_strangle_symbols(),
            entry_threshold: default_swing_threshold(),
            target_dte: default_strangle_dte(),
            short_delta: default_strangle_delta(),
            base_lots: default_base_lots(),
            max_lots: default_strangle_max_lots(),
        }
    }
}

const fn default_daily_max() -> u32 {
    2
}

fn default_max_buying_power() -> Decimal {
    dec!(50)
}

fn default_timezone() -> String {
    "America/New_York".to_string()
}

const fn default_entry_priority() -> i32 {
    5
}

const fn default_max_group_positions() -> usize {
    2
}

fn default_trend_threshold() -> Decimal {
    dec!(0.5)
}

fn default_zero_dte_symbol() -> Symbol {
    Symbol::new("SPY")
}

const fn default_weekday() -> Weekday {
    Weekday::Fri
}

const fn default_cutoff_hour() -> u32 {
    10
}

const fn default_cutoff_minute() -> u32 {
    30
}

fn default_zero_dte_ceiling() -> Decimal {
    dec!(30)
}

fn default_zero_dte_threshold() -> Decimal {
    dec!(80)
}

fn default_zero_dte_delta() -> Decimal {
    dec!(0.10)
}

fn default_zero_dte_wing() -> Decimal {
    dec!(5)
}

const fn default_base_lots() -> u32 {
    1
}

const fn default_zero_dte_max_lots() -> u32 {
    2
}

fn default_long_dated_symbols() -> Vec<Symbol> {
    ["SPY", "QQQ", "IWM"].into_iter().map(Symbol::new).collect()
}

fn default_swing_threshold() -> Decimal {
    dec!(75)
}

const fn default_long_dated_dte() -> i64 {
    120
}

fn default_long_dated_delta() -> Decimal {
    dec!(0.70)
}

const fn default_long_dated_max_lots() -> u32 {
    3
}

fn default_strangle_symbols() -> Vec<Symbol> {
    ["/MES", "/MCL", "/MGC"].into_iter().map(Symbol::new).collect()
}

const fn default_strangle_dte() -> i64 {
    45
}

fn default_strangle_delta() -> Decimal {
    dec!(0.16)
}

const fn default_strangle_max_lots() -> u32 {
    4
}

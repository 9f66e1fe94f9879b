//! Entry Evaluator
//!
//! Scores new-entry opportunities for the zero-DTE, long-dated and strangle
//! strategies against the current market conditions, under a per-day entry
//! cap and an account buying-power ceiling.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::application::ports::StrikeRequest;
use crate::config::{ConfigError, EntryConfig};
use crate::domain::market::{CorrelationGroups, MarketConditions, Trend, VolatilityRegime};
use crate::domain::position::{OptionRight, StrategyKind};
use crate::domain::shared::Symbol;

/// Entries made on the current local day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyEntryCounter {
    day: Option<NaiveDate>,
    count: u32,
}

impl DailyEntryCounter {
    /// Entries recorded on `day`; a new day starts from zero.
    #[must_use]
    pub fn count_on(&self, day: NaiveDate) -> u32 {
        if self.day == Some(day) { self.count } else { 0 }
    }

    /// Record one entry on `day`, resetting on rollover.
    pub fn record(&mut self, day: NaiveDate) {
        if self.day != Some(day) {
            self.day = Some(day);
            self.count = 0;
        }
        self.count += 1;
    }
}

/// A qualified opportunity awaiting strike selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryOpportunity {
    /// Underlying.
    pub symbol: Symbol,
    /// Structure to open.
    pub strategy: StrategyKind,
    /// Composite score.
    pub score: Decimal,
    /// Sized contracts.
    pub quantity: u32,
    /// Strike selection parameters.
    pub request: StrikeRequest,
    /// Scoring summary.
    pub reason: String,
}

/// Strategy scoring and sizing for automated entries.
#[derive(Debug, Clone)]
pub struct EntryEvaluator {
    config: EntryConfig,
    groups: CorrelationGroups,
    time_zone: Tz,
    cutoff: NaiveTime,
}

impl EntryEvaluator {
    /// Create an evaluator, resolving the time zone and zero-DTE cutoff.
    pub fn new(config: EntryConfig, groups: CorrelationGroups) -> Result<Self, ConfigError> {
        let time_zone = config.time_zone()?;
        let cutoff = config.zero_dte.cutoff()?;
        Ok(Self {
            config,
            groups,
            time_zone,
            cutoff,
        })
    }

    /// Local time zone for day rollover and the zero-DTE cutoff.
    #[must_use]
    pub const fn time_zone(&self) -> Tz {
        self.time_zone
    }

    /// Tunables in use.
    #[must_use]
    pub const fn config(&self) -> &EntryConfig {
        &self.config
    }

    /// Qualified opportunities for this cycle, in strategy order, limited to
    /// the entries still allowed today.
    #[must_use]
    pub fn evaluate(
        &self,
        conditions: &MarketConditions,
        local_now: DateTime<Tz>,
        entries_today: u32,
    ) -> Vec<EntryOpportunity> {
        let cfg = &self.config;

        if entries_today >= cfg.daily_max_entries {
            tracing::debug!(
                entries_today,
                cap = cfg.daily_max_entries,
                "Daily entry cap reached"
            );
            return Vec::new();
        }

        if conditions.buying_power_utilization_pct > cfg.max_buying_power_pct {
            tracing::debug!(
                utilization = %conditions.buying_power_utilization_pct,
                ceiling = %cfg.max_buying_power_pct,
                "Buying power above entry ceiling"
            );
            return Vec::new();
        }

        let remaining = (cfg.daily_max_entries - entries_today) as usize;
        [
            self.zero_dte(conditions, local_now),
            self.long_dated(conditions),
            self.strangle(conditions),
        ]
        .into_iter()
        .flatten()
        .take(remaining)
        .collect()
    }

    fn zero_dte(&self, conditions: &MarketConditions, local_now: DateTime<Tz>) -> Option<EntryOpportunity> {
        let cfg = &self.config.zero_dte;
        if !cfg.enabled || !self.zero_dte_window_open(local_now) {
            return None;
        }

        // No volatility reading, no same-day risk.
        let level = conditions.volatility_level?;
        if level > cfg.volatility_ceiling {
            tracing::debug!(level = %level, ceiling = %cfg.volatility_ceiling, "Zero-DTE above volatility ceiling");
            return None;
        }

        let score = zero_dte_score(conditions);
        if score < cfg.entry_threshold {
            return None;
        }

        Some(EntryOpportunity {
            symbol: cfg.symbol.clone(),
            strategy: StrategyKind::ZeroDte,
            score,
            quantity: size(cfg.base_lots, cfg.max_lots, score, cfg.entry_threshold),
            request: StrikeRequest {
                symbol: cfg.symbol.clone(),
                strategy: StrategyKind::ZeroDte,
                target_dte: 0,
                expiration: Some(local_now.date_naive()),
                delta: cfg.short_delta,
                right: None,
                wing_width: Some(cfg.wing_width),
            },
            reason: format!("zero-DTE score {score} in {:?} regime", conditions.regime),
        })
    }

    /// Designated weekday, at or after the local cutoff.
    #[must_use]
    pub fn zero_dte_window_open(&self, local_now: DateTime<Tz>) -> bool {
        local_now.weekday() == self.config.zero_dte.weekday && local_now.time() >= self.cutoff
    }

    fn long_dated(&self, conditions: &MarketConditions) -> Option<EntryOpportunity> {
        let cfg = &self.config.long_dated;
        if !cfg.enabled {
            return None;
        }

        let score = long_dated_score(conditions);
        let symbol = self.first_open_symbol(&cfg.symbols, conditions, score, cfg.entry_threshold)?;
        let right = if conditions.trend == Trend::Down {
            OptionRight::Put
        } else {
            OptionRight::Call
        };

        Some(EntryOpportunity {
            symbol: symbol.clone(),
            strategy: StrategyKind::LongDated,
            score,
            quantity: size(cfg.base_lots, cfg.max_lots, score, cfg.entry_threshold),
            request: StrikeRequest {
                symbol: symbol.clone(),
                strategy: StrategyKind::LongDated,
                target_dte: cfg.target_dte,
                expiration: None,
                delta: cfg.target_delta,
                right: Some(right),
                wing_width: None,
            },
            reason: format!(
                "long-dated {right} score {score}, trend {:?}, {:?} regime",
                conditions.trend, conditions.regime
            ),
        })
    }

    fn strangle(&self, conditions: &MarketConditions) -> Option<EntryOpportunity> {
        let cfg = &self.config.strangle;
        if !cfg.enabled {
            return None;
        }

        let score = strangle_score(conditions);
        let symbol = self.first_open_symbol(&cfg.symbols, conditions, score, cfg.entry_threshold)?;

        Some(EntryOpportunity {
            symbol: symbol.clone(),
            strategy: StrategyKind::Strangle,
            score,
            quantity: size(cfg.base_lots, cfg.max_lots, score, cfg.entry_threshold),
            request: StrikeRequest {
                symbol: symbol.clone(),
                strategy: StrategyKind::Strangle,
                target_dte: cfg.target_dte,
                expiration: None,
                delta: cfg.short_delta,
                right: None,
                wing_width: None,
            },
            reason: format!(
                "strangle score {score}, {:?} regime, {}% buying power free",
                conditions.regime,
                conditions.buying_power_available_pct()
            ),
        })
    }

    /// First candidate whose correlation group has room, when the score
    /// qualifies at all. Scores are market-wide, so every symbol shares one.
    fn first_open_symbol<'a>(
        &self,
        symbols: &'a [Symbol],
        conditions: &MarketConditions,
        score: Decimal,
        threshold: Decimal,
    ) -> Option<&'a Symbol> {
        if score < threshold {
            return None;
        }

        symbols.iter().find(|symbol| {
            let group = self.groups.group_of(symbol);
            let open = conditions.occupancy_of(&group);
            if open >= self.config.max_group_positions {
                tracing::debug!(symbol = %symbol, group = %group, open, "Correlation group full");
                false
            } else {
                true
            }
        })
    }
}

/// 50 plus regime and buying-power bonuses.
#[must_use]
pub fn zero_dte_score(conditions: &MarketConditions) -> Decimal {
    let regime = match conditions.regime {
        VolatilityRegime::Normal => dec!(30),
        VolatilityRegime::Elevated => dec!(15),
        VolatilityRegime::Low => dec!(10),
        VolatilityRegime::Extreme => Decimal::ZERO,
    };
    let used = conditions.buying_power_utilization_pct;
    let buying_power = if used < dec!(30) {
        dec!(20)
    } else if used < dec!(50) {
        dec!(10)
    } else {
        Decimal::ZERO
    };
    dec!(50) + regime + buying_power
}

/// 40 plus volatility, trend and buying-power bonuses.
#[must_use]
pub fn long_dated_score(conditions: &MarketConditions) -> Decimal {
    let volatility = match conditions.regime {
        VolatilityRegime::Elevated | VolatilityRegime::Extreme => dec!(20),
        VolatilityRegime::Normal => dec!(10),
        VolatilityRegime::Low => Decimal::ZERO,
    };
    let trend = match conditions.trend {
        Trend::Up => dec!(25),
        Trend::Down => dec!(10),
        Trend::Sideways => Decimal::ZERO,
    };
    let buying_power = if conditions.buying_power_utilization_pct < dec!(50) {
        dec!(10)
    } else {
        Decimal::ZERO
    };
    dec!(40) + volatility + trend + buying_power
}

/// 40 plus volatility and available buying-power bonuses.
#[must_use]
pub fn strangle_score(conditions: &MarketConditions) -> Decimal {
    let volatility = match conditions.regime {
        VolatilityRegime::Extreme => dec!(35),
        VolatilityRegime::Elevated => dec!(25),
        VolatilityRegime::Normal => dec!(10),
        VolatilityRegime::Low => Decimal::ZERO,
    };
    let available = conditions.buying_power_available_pct();
    let buying_power = if available >= dec!(50) {
        dec!(20)
    } else if available >= dec!(30) {
        dec!(10)
    } else {
        Decimal::ZERO
    };
    dec!(40) + volatility + buying_power
}

/// Base lots doubled for strong scores, halved (min 1) for marginal ones,
/// clamped to `max_lots`.
#[must_use]
pub fn size(base_lots: u32, max_lots: u32, score: Decimal, threshold: Decimal) -> u32 {
    let lots = if score >= dec!(90) {
        base_lots.saturating_mul(2)
    } else if score < threshold + dec!(5) {
        (base_lots / 2).max(1)
    } else {
        base_lots
    };
    lots.min(max_lots)
}

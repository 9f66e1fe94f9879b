//! Market conditions snapshot used by the entry evaluator and roll scoring.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AccountSnapshot, Quote};
use crate::domain::position::Position;
use crate::domain::shared::Symbol;

/// Coarse bucket of the volatility index level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityRegime {
    /// Below the low threshold.
    Low,
    /// Between low and elevated.
    Normal,
    /// Between elevated and extreme.
    Elevated,
    /// At or above the extreme threshold.
    Extreme,
}

/// Boundaries between volatility regimes (index points).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeThresholds {
    /// Levels below this are `Low`.
    pub low: Decimal,
    /// Levels at or above this are `Elevated`.
    pub elevated: Decimal,
    /// Levels at or above this are `Extreme`.
    pub extreme: Decimal,
}

impl Default for RegimeThresholds {
    fn default() -> Self {
        Self {
            low: Decimal::from(15),
            elevated: Decimal::from(20),
            extreme: Decimal::from(30),
        }
    }
}

impl VolatilityRegime {
    /// Classify a volatility index level.
    #[must_use]
    pub fn classify(level: Decimal, thresholds: &RegimeThresholds) -> Self {
        if level >= thresholds.extreme {
            Self::Extreme
        } else if level >= thresholds.elevated {
            Self::Elevated
        } else if level < thresholds.low {
            Self::Low
        } else {
            Self::Normal
        }
    }
}

/// Short-term direction of the benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    /// Benchmark up more than the trend threshold.
    Up,
    /// Benchmark down more than the trend threshold.
    Down,
    /// Inside the threshold band, or unknown.
    Sideways,
}

impl Trend {
    /// Classify from a benchmark quote's change versus previous close.
    #[must_use]
    pub fn from_quote(quote: Option<&Quote>, threshold_pct: Decimal) -> Self {
        match quote.and_then(Quote::change_pct) {
            Some(change) if change > threshold_pct => Self::Up,
            Some(change) if change < -threshold_pct => Self::Down,
            _ => Self::Sideways,
        }
    }
}

/// Named sets of instruments treated as correlated for concentration limits.
///
/// Symbols not listed in any group form a singleton group named after
/// themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationGroups(BTreeMap<String, Vec<Symbol>>);

impl CorrelationGroups {
    /// Build from a group → symbols map.
    #[must_use]
    pub const fn new(groups: BTreeMap<String, Vec<Symbol>>) -> Self {
        Self(groups)
    }

    /// Group name for a symbol.
    #[must_use]
    pub fn group_of(&self, symbol: &Symbol) -> String {
        self.0
            .iter()
            .find(|(_, members)| members.contains(symbol))
            .map_or_else(|| symbol.to_string(), |(name, _)| name.clone())
    }

    /// Count open positions per group.
    #[must_use]
    pub fn occupancy(&self, positions: &[Position]) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for position in positions {
            *counts.entry(self.group_of(&position.symbol)).or_insert(0) += 1;
        }
        counts
    }
}

/// Snapshot of market state for one entry evaluation cycle. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketConditions {
    /// Volatility index level, if quoted.
    pub volatility_level: Option<Decimal>,
    /// Regime bucket (Normal when the level is unknown).
    pub regime: VolatilityRegime,
    /// Benchmark trend.
    pub trend: Trend,
    /// Open positions per correlation group.
    pub group_occupancy: BTreeMap<String, usize>,
    /// Percentage of buying power in use.
    pub buying_power_utilization_pct: Decimal,
}

impl MarketConditions {
    /// Assemble a snapshot.
    #[must_use]
    pub fn build(
        volatility: Option<&Quote>,
        benchmark: Option<&Quote>,
        positions: &[Position],
        account: &AccountSnapshot,
        groups: &CorrelationGroups,
        thresholds: &RegimeThresholds,
        trend_threshold_pct: Decimal,
    ) -> Self {
        let volatility_level = volatility.filter(|q| q.has_price()).map(|q| q.last);
        let regime = volatility_level.map_or(VolatilityRegime::Normal, |level| {
            VolatilityRegime::classify(level, thresholds)
        });

        Self {
            volatility_level,
            regime,
            trend: Trend::from_quote(benchmark, trend_threshold_pct),
            group_occupancy: groups.occupancy(positions),
            buying_power_utilization_pct: account.buying_power_utilization_pct(),
        }
    }

    /// Open positions in the named group.
    #[must_use]
    pub fn occupancy_of(&self, group: &str) -> usize {
        self.group_occupancy.get(group).copied().unwrap_or(0)
    }

    /// Percentage of buying power still available.
    #[must_use]
    pub fn buying_power_available_pct(&self) -> Decimal {
        (Decimal::ONE_HUNDRED - self.buying_power_utilization_pct).max(Decimal::ZERO)
    }
}

//! Roll analyzer parameters.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Inclusive DTE range searched for replacement expirations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DteBand {
    /// Shortest acceptable DTE.
    pub min: i64,
    /// Longest acceptable DTE.
    pub max: i64,
}

impl DteBand {
    /// Create a band.
    #[must_use]
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Whether `dte` lies inside the band.
    #[must_use]
    pub const fn contains(&self, dte: i64) -> bool {
        dte >= self.min && dte <= self.max
    }
}

/// Rolling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RollConfig {
    // Advisability
    /// Untested positions at or below this DTE are closed instead of rolled...
    pub late_dte: i64,
    /// ...when P/L% of credit is at least this.
    pub late_profit_pct: Decimal,
    /// Positions at or above this P/L% are closed instead of rolled.
    pub profit_close_pct: Decimal,

    // Candidate search
    /// DTE band for defensive (tested) rolls.
    pub defensive_band: DteBand,
    /// DTE band for time-decay management rolls.
    pub management_band: DteBand,
    /// DTE band for any other roll.
    pub standard_band: DteBand,
    /// Short-leg |delta| target for defensive rolls.
    pub defensive_delta: Decimal,
    /// Short-leg |delta| target for other rolls.
    pub standard_delta: Decimal,

    // Scoring
    /// DTE the scoring treats as ideal.
    pub ideal_dte: i64,
    /// Volatility index at or above which wider strikes are rewarded.
    pub high_volatility: Decimal,
    /// Volatility index below which tighter strikes are tolerated.
    pub low_volatility: Decimal,

    // Guards
    /// Largest debit, as a percent of original credit, for non-defensive rolls.
    pub max_debit_pct: Decimal,
    /// Largest debit, as a percent of original credit, for defensive rolls.
    pub defensive_max_debit_pct: Decimal,

    // Defend
    /// |delta| the untested strangle side is rolled to when defending.
    pub defend_delta: Decimal,
}

impl Default for RollConfig {
    fn default() -> Self {
        Self {
            late_dte: 7,
            late_profit_pct: dec!(25),
            profit_close_pct: dec!(50),

            defensive_band: DteBand::new(30, 45),
            management_band: DteBand::new(45, 60),
            standard_band: DteBand::new(35, 50),
            defensive_delta: dec!(0.16),
            standard_delta: dec!(0.20),

            ideal_dte: 45,
            high_volatility: dec!(25),
            low_volatility: dec!(15),

            max_debit_pct: dec!(25),
            defensive_max_debit_pct: dec!(100),

            defend_delta: dec!(0.30),
        }
    }
}

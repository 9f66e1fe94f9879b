//! Per-position management rule thresholds.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Thresholds for the position evaluator rules.
///
/// Percentages are P/L relative to credit received (or cost basis).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagementConfig {
    /// Close for profit at or above this P/L%.
    #[serde(default = "default_profit_target")]
    pub profit_target_pct: Decimal,
    /// Time-decay management starts at or below this DTE.
    #[serde(default = "default_management_dte")]
    pub management_dte: i64,
    /// Below this P/L% a managed position is rolled rather than closed.
    #[serde(default = "default_roll_below")]
    pub roll_below_pct: Decimal,
    /// Losing positions at or below this DTE are closed.
    #[serde(default = "default_defensive_dte")]
    pub defensive_dte: i64,
    /// Stop out at a loss of this percentage of credit.
    #[serde(default = "default_stop_loss")]
    pub stop_loss_pct: Decimal,
    /// A short strike counts as tested within this percent of the underlying.
    #[serde(default = "default_tested_buffer")]
    pub tested_buffer_pct: Decimal,
}

impl Default for ManagementConfig {
    fn default() -> Self {
        Self {
            profit_target_pct: default_profit_target(),
            management_dte: default_management_dte(),
            roll_below_pct: default_roll_below(),
            defensive_dte: default_defensive_dte(),
            stop_loss_pct: default_stop_loss(),
            tested_buffer_pct: default_tested_buffer(),
        }
    }
}

fn default_profit_target() -> Decimal {
    dec!(50)
}

const fn default_management_dte() -> i64 {
    21
}

fn default_roll_below() -> Decimal {
    dec!(25)
}

const fn default_defensive_dte() -> i64 {
    7
}

fn default_stop_loss() -> Decimal {
    dec!(200)
}

fn default_tested_buffer() -> Decimal {
    dec!(2)
}

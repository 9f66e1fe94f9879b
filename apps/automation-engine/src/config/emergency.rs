//! Portfolio-wide emergency thresholds.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Emergency monitor thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyConfig {
    /// Daily loss as a percent of net liquidation that triggers flattening.
    #[serde(default = "default_drawdown")]
    pub max_daily_drawdown_pct: Decimal,
    /// Volatility index level that triggers flattening.
    #[serde(default = "default_volatility_spike")]
    pub volatility_spike: Decimal,
    /// Open positions in one correlation group that triggers flattening.
    #[serde(default = "default_group_breach")]
    pub correlation_breach: usize,
    /// Positions at or below this DTE get the near-expiry priority.
    #[serde(default = "default_near_expiry_dte")]
    pub near_expiry_dte: i64,
}

impl Default for EmergencyConfig {
    fn default() -> Self {
        Self {
            max_daily_drawdown_pct: default_drawdown(),
            volatility_spike: default_volatility_spike(),
            correlation_breach: default_group_breach(),
            near_expiry_dte: default_near_expiry_dte(),
        }
    }
}

fn default_drawdown() -> Decimal {
    dec!(10)
}

fn default_volatility_spike() -> Decimal {
    dec!(40)
}

const fn default_group_breach() -> usize {
    5
}

const fn default_near_expiry_dte() -> i64 {
    7
}

//! Emergency Monitor
//!
//! Portfolio-wide checks run on the fast cadence. Any trigger flattens every
//! open position through EMERGENCY_CLOSE actions.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::EmergencyConfig;
use crate::domain::action::{ActionType, ActionVerb, PendingAction};
use crate::domain::market::AccountSnapshot;
use crate::domain::position::Position;

/// Emergency priority for positions expiring today or already expired.
pub const PRIORITY_EXPIRING: i32 = 0;
/// Emergency priority for losing positions.
pub const PRIORITY_LOSING: i32 = 1;
/// Emergency priority for positions near expiry.
pub const PRIORITY_NEAR_EXPIRY: i32 = 2;
/// Emergency priority for everything else.
pub const PRIORITY_REMAINING: i32 = 10;

/// A check that fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmergencyTrigger {
    /// Daily loss beyond the drawdown threshold.
    Drawdown {
        /// Observed drawdown percent.
        drawdown_pct: Decimal,
    },
    /// Volatility index at or above the spike threshold.
    VolatilitySpike {
        /// Observed level.
        level: Decimal,
    },
    /// Too many open positions in one correlation group.
    CorrelationBreach {
        /// Group name.
        group: String,
        /// Open positions in it.
        count: usize,
    },
}

impl EmergencyTrigger {
    /// Metrics label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Drawdown { .. } => "drawdown",
            Self::VolatilitySpike { .. } => "volatility_spike",
            Self::CorrelationBreach { .. } => "correlation_breach",
        }
    }
}

impl std::fmt::Display for EmergencyTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Drawdown { drawdown_pct } => {
                write!(f, "daily drawdown {drawdown_pct:.2}%")
            }
            Self::VolatilitySpike { level } => write!(f, "volatility index at {level}"),
            Self::CorrelationBreach { group, count } => {
                write!(f, "{count} open positions in correlation group {group}")
            }
        }
    }
}

/// Portfolio-wide emergency checks.
#[derive(Debug, Clone)]
pub struct EmergencyMonitor {
    config: EmergencyConfig,
}

impl EmergencyMonitor {
    /// Create a monitor.
    #[must_use]
    pub const fn new(config: EmergencyConfig) -> Self {
        Self { config }
    }

    /// Every check that fires. Empty when all is well.
    ///
    /// A missing volatility level skips the spike check.
    #[must_use]
    pub fn check(
        &self,
        account: &AccountSnapshot,
        volatility: Option<Decimal>,
        group_occupancy: &BTreeMap<String, usize>,
    ) -> Vec<EmergencyTrigger> {
        let mut triggers = Vec::new();

        if account.daily_pnl < Decimal::ZERO && account.net_liquidation > Decimal::ZERO {
            let drawdown_pct = account.daily_drawdown_pct();
            if drawdown_pct >= self.config.max_daily_drawdown_pct {
                triggers.push(EmergencyTrigger::Drawdown { drawdown_pct });
            }
        }

        if let Some(level) = volatility
            && level >= self.config.volatility_spike
        {
            triggers.push(EmergencyTrigger::VolatilitySpike { level });
        }

        for (group, count) in group_occupancy {
            if *count >= self.config.correlation_breach {
                triggers.push(EmergencyTrigger::CorrelationBreach {
                    group: group.clone(),
                    count: *count,
                });
            }
        }

        triggers
    }

    /// Queue priority of a position during an emergency.
    #[must_use]
    pub fn priority_for(&self, position: &Position, today: NaiveDate) -> i32 {
        let dte = position.dte(today);
        if dte <= 0 {
            PRIORITY_EXPIRING
        } else if position.unrealized_pnl < Decimal::ZERO {
            PRIORITY_LOSING
        } else if dte <= self.config.near_expiry_dte {
            PRIORITY_NEAR_EXPIRY
        } else {
            PRIORITY_REMAINING
        }
    }

    /// EMERGENCY_CLOSE actions for every open position.
    #[must_use]
    pub fn emergency_actions(
        &self,
        positions: &[Position],
        triggers: &[EmergencyTrigger],
        today: NaiveDate,
    ) -> Vec<PendingAction> {
        let reason = triggers
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");

        positions
            .iter()
            .map(|position| {
                PendingAction::for_position(
                    ActionType::EmergencyClose,
                    ActionVerb::Close,
                    self.priority_for(position, today),
                    position.clone(),
                    format!("emergency: {reason}"),
                )
            })
            .collect()
    }
}

//! Position Evaluator
//!
//! Per-position management rules. Rule order:
//!
//! 1. Profit target reached: close, and nothing else for this position.
//! 2. Time-decay management threshold: roll when P/L is low, else close.
//! 3. Losing position near expiration: close.
//! 4. Loss beyond the stop-loss multiple of credit: close.
//! 5. Two-sided premium structure with a tested short strike: defend.
//!
//! Rules 3-5 are independent of 1-2 and can fire together; the queue
//! collapses duplicates.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::ManagementConfig;
use crate::domain::action::{ActionType, ActionVerb, PendingAction};
use crate::domain::position::{Position, StrategyKind};
use crate::domain::shared::Symbol;

/// Priority of profit-target closes.
pub const PRIORITY_CLOSE_PROFIT: i32 = 1;
/// Priority of low-profit management rolls.
pub const PRIORITY_MANAGE_ROLL: i32 = 2;
/// Priority of management closes.
pub const PRIORITY_MANAGE_CLOSE: i32 = 3;
/// Priority of defensive and stop-loss closes.
pub const PRIORITY_URGENT: i32 = 0;
/// Priority of tested-side defense.
pub const PRIORITY_DEFEND: i32 = 1;

/// Applies the management rules to position snapshots.
#[derive(Debug, Clone)]
pub struct PositionEvaluator {
    config: ManagementConfig,
}

impl PositionEvaluator {
    /// Create an evaluator.
    #[must_use]
    pub const fn new(config: ManagementConfig) -> Self {
        Self { config }
    }

    /// Thresholds in use.
    #[must_use]
    pub const fn config(&self) -> &ManagementConfig {
        &self.config
    }

    /// Every action the rules raise for one position.
    ///
    /// `underlying_price` is only needed for the tested-side rule; without it
    /// that rule yields nothing.
    #[must_use]
    pub fn evaluate(
        &self,
        position: &Position,
        underlying_price: Option<Decimal>,
        today: NaiveDate,
    ) -> Vec<PendingAction> {
        let cfg = &self.config;
        let dte = position.dte(today);
        let pnl_pct = position.pnl_pct();
        let mut actions = Vec::new();

        // Rule 1
        if pnl_pct >= cfg.profit_target_pct {
            actions.push(PendingAction::for_position(
                ActionType::CloseProfit,
                ActionVerb::Close,
                PRIORITY_CLOSE_PROFIT,
                position.clone(),
                format!(
                    "P/L {:.1}% reached profit target {}%",
                    pnl_pct, cfg.profit_target_pct
                ),
            ));
            return actions;
        }

        // Rule 2
        if dte <= cfg.management_dte && position.strategy.is_time_decay_sensitive() {
            let (verb, priority, what) = if pnl_pct < cfg.roll_below_pct {
                (ActionVerb::Roll, PRIORITY_MANAGE_ROLL, "roll")
            } else {
                (ActionVerb::Close, PRIORITY_MANAGE_CLOSE, "close")
            };
            actions.push(PendingAction::for_position(
                ActionType::Manage21Dte,
                verb,
                priority,
                position.clone(),
                format!(
                    "{dte} DTE at or below {}, P/L {:.1}%: {what}",
                    cfg.management_dte, pnl_pct
                ),
            ));
        }

        // Rule 3
        if dte <= cfg.defensive_dte && pnl_pct < Decimal::ZERO {
            actions.push(PendingAction::for_position(
                ActionType::DefensiveUrgent,
                ActionVerb::Close,
                PRIORITY_URGENT,
                position.clone(),
                format!("{dte} DTE with P/L {pnl_pct:.1}%"),
            ));
        }

        // Rule 4
        if pnl_pct <= -cfg.stop_loss_pct {
            actions.push(PendingAction::for_position(
                ActionType::StopLoss,
                ActionVerb::Close,
                PRIORITY_URGENT,
                position.clone(),
                format!(
                    "P/L {:.1}% beyond stop loss -{}%",
                    pnl_pct, cfg.stop_loss_pct
                ),
            ));
        }

        // Rule 5
        if is_two_sided_premium(position.strategy) {
            match underlying_price {
                Some(price) => {
                    if let Some(side) = position.tested_side(price, cfg.tested_buffer_pct) {
                        actions.push(PendingAction::for_position(
                            ActionType::ManageTested,
                            ActionVerb::Defend,
                            PRIORITY_DEFEND,
                            position.clone(),
                            format!("{side} side tested at {price}"),
                        ));
                    }
                }
                None => {
                    tracing::debug!(
                        symbol = %position.symbol,
                        "No underlying price, skipping tested-side check"
                    );
                }
            }
        }

        actions
    }

    /// Evaluate a batch, skipping malformed positions and those the
    /// `is_cooling_down` predicate rejects.
    pub fn evaluate_all<F>(
        &self,
        positions: &[Position],
        prices: &HashMap<Symbol, Decimal>,
        today: NaiveDate,
        is_cooling_down: F,
    ) -> Vec<PendingAction>
    where
        F: Fn(&Position) -> bool,
    {
        let mut actions = Vec::new();

        for position in positions {
            if let Err(e) = position.validate() {
                tracing::warn!(
                    position_id = %position.id,
                    error = %e,
                    "Skipping malformed position"
                );
                continue;
            }

            if is_cooling_down(position) {
                tracing::debug!(
                    position_id = %position.id,
                    symbol = %position.symbol,
                    "Position cooling down after recent execution"
                );
                continue;
            }

            let price = prices.get(&position.symbol).copied();
            actions.extend(self.evaluate(position, price, today));
        }

        actions
    }
}

const fn is_two_sided_premium(strategy: StrategyKind) -> bool {
    matches!(strategy, StrategyKind::Strangle | StrategyKind::IronCondor)
}

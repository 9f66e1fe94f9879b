//! Action Executor
//!
//! Dispatches drained actions to the order-preparation collaborator:
//! CLOSE prepares a close, ROLL consults the roll analyzer first, DEFEND
//! moves the untested strangle side, OPEN prepares a new entry.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use super::roll_analyzer::{RollAnalyzer, RollContext, RollRecommendation};
use crate::application::ports::{
    OptionChainError, OptionChainPort, OrderPreparationError, OrderPreparationPort, RollRequest,
    StrikeRequest,
};
use crate::domain::action::{ActionTarget, ActionVerb, PendingAction};
use crate::domain::events::AutomationEvent;
use crate::domain::position::{OptionLeg, OptionRight, Position, StrategyKind};
use crate::domain::shared::Symbol;

/// Execution failure for a single action.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExecutionError {
    /// Order preparation failed or was rejected.
    #[error(transparent)]
    Preparation(#[from] OrderPreparationError),

    /// Chain needed for a roll could not be fetched.
    #[error(transparent)]
    MarketData(#[from] OptionChainError),

    /// Verb and target do not fit together.
    #[error("Invalid action target: {message}")]
    InvalidTarget {
        /// Error details.
        message: String,
    },
}

/// Market state captured at the start of the tick that drains the queue.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    /// Local trading date.
    pub today: NaiveDate,
    /// Latest underlying prices.
    pub prices: HashMap<Symbol, Decimal>,
    /// Volatility index level.
    pub volatility: Option<Decimal>,
}

impl MarketSnapshot {
    /// Latest price for a symbol.
    #[must_use]
    pub fn price(&self, symbol: &Symbol) -> Option<Decimal> {
        self.prices.get(symbol).copied()
    }
}

/// Turns pending actions into prepared order intents.
pub struct ActionExecutor {
    orders: Arc<dyn OrderPreparationPort>,
    chains: Arc<dyn OptionChainPort>,
    analyzer: RollAnalyzer,
    tested_buffer_pct: Decimal,
}

impl ActionExecutor {
    /// Create an executor.
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderPreparationPort>,
        chains: Arc<dyn OptionChainPort>,
        analyzer: RollAnalyzer,
        tested_buffer_pct: Decimal,
    ) -> Self {
        Self {
            orders,
            chains,
            analyzer,
            tested_buffer_pct,
        }
    }

    /// Execute one action, returning the events to publish on success.
    pub async fn execute(
        &self,
        action: &PendingAction,
        snapshot: &MarketSnapshot,
        now: DateTime<Utc>,
    ) -> Result<Vec<AutomationEvent>, ExecutionError> {
        let mut events = match (&action.verb, &action.target) {
            (ActionVerb::Close, ActionTarget::Position(position)) => {
                vec![self.close(position, &action.reason, now).await?]
            }
            (ActionVerb::Roll, ActionTarget::Position(position)) => {
                vec![self.roll(position, snapshot, now).await?]
            }
            (ActionVerb::Defend, ActionTarget::Position(position)) => {
                vec![self.defend(position, snapshot, now).await?]
            }
            (ActionVerb::Open, ActionTarget::Entry(intent)) => {
                let order = self.orders.prepare_entry(intent).await?;
                tracing::info!(
                    symbol = %intent.symbol,
                    strategy = %intent.strategy,
                    quantity = intent.quantity,
                    intent_id = %order.id,
                    "Entry intent prepared"
                );
                Vec::new()
            }
            (verb, _) => {
                return Err(ExecutionError::InvalidTarget {
                    message: format!("{verb} cannot act on {} target", action.symbol()),
                });
            }
        };

        events.push(AutomationEvent::ActionExecuted {
            symbol: action.symbol().clone(),
            action_type: action.action_type,
            reason: action.reason.clone(),
            timestamp: now,
        });
        Ok(events)
    }

    async fn close(
        &self,
        position: &Position,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<AutomationEvent, ExecutionError> {
        let order = self.orders.prepare_close(position, reason).await?;
        tracing::info!(
            symbol = %position.symbol,
            position_id = %position.id,
            intent_id = %order.id,
            reason,
            "Close intent prepared"
        );
        Ok(AutomationEvent::PositionClosed {
            symbol: position.symbol.clone(),
            intent_id: order.id,
            reason: reason.to_string(),
            timestamp: now,
        })
    }

    async fn roll(
        &self,
        position: &Position,
        snapshot: &MarketSnapshot,
        now: DateTime<Utc>,
    ) -> Result<AutomationEvent, ExecutionError> {
        let chain = match self.chains.get_chain(&position.symbol).await {
            Ok(chain) => Some(chain),
            Err(OptionChainError::NotFound { .. }) => None,
            Err(e) => return Err(e.into()),
        };

        let ctx = RollContext {
            underlying_price: snapshot.price(&position.symbol),
            volatility: snapshot.volatility,
            chain: chain.as_ref(),
            today: snapshot.today,
        };

        match self.analyzer.analyze(position, &ctx) {
            RollRecommendation::Roll {
                roll_type,
                candidate,
                reason,
            } => {
                let lots = position.multiplier * Decimal::from(position.quantity());
                let limit_price = (lots > Decimal::ZERO).then(|| candidate.net_credit / lots);
                let request = RollRequest {
                    position: position.clone(),
                    close_legs: position.legs.clone(),
                    open_legs: candidate.legs.clone(),
                    limit_price,
                };
                let intents = self.orders.prepare_roll(&request).await?;
                tracing::info!(
                    symbol = %position.symbol,
                    roll_type = %roll_type,
                    expiration = %candidate.expiration,
                    net_credit = %candidate.net_credit,
                    score = %candidate.score,
                    "Roll intents prepared"
                );
                Ok(AutomationEvent::PositionRolled {
                    symbol: position.symbol.clone(),
                    close_intent_id: intents.close.id,
                    open_intent_id: intents.open.id,
                    new_expiration: candidate.expiration,
                    net_credit: candidate.net_credit,
                    reason,
                    timestamp: now,
                })
            }
            RollRecommendation::Close { reason } => {
                tracing::info!(symbol = %position.symbol, reason = %reason, "Roll not advisable, closing");
                self.close(position, &reason, now).await
            }
        }
    }

    async fn defend(
        &self,
        position: &Position,
        snapshot: &MarketSnapshot,
        now: DateTime<Utc>,
    ) -> Result<AutomationEvent, ExecutionError> {
        if position.dte(snapshot.today) <= 0 {
            return self.close(position, "expiring while tested", now).await;
        }

        if position.strategy != StrategyKind::Strangle {
            return self.close(position, "tested side on defined-risk structure", now).await;
        }

        let tested = snapshot
            .price(&position.symbol)
            .and_then(|price| position.tested_side(price, self.tested_buffer_pct));
        let Some(tested) = tested else {
            return self.close(position, "tested side could not be determined", now).await;
        };

        let untested = match tested {
            OptionRight::Put => OptionRight::Call,
            OptionRight::Call => OptionRight::Put,
        };
        let Some(leg) = position.short_legs().find(|l| l.right == untested) else {
            return self.close(position, "no untested short leg to move", now).await;
        };

        let request = StrikeRequest {
            symbol: position.symbol.clone(),
            strategy: position.strategy,
            target_dte: position.dte(snapshot.today),
            expiration: Some(leg.expiration),
            delta: self.analyzer.config().defend_delta,
            right: Some(untested),
            wing_width: None,
        };
        let selection = self.orders.find_optimal_strikes(&request).await?;
        let Some(strike) = selection
            .as_ref()
            .and_then(|s| s.legs.iter().find(|l| l.right == untested))
            .map(|l| l.strike)
        else {
            return self.close(position, "no strike found for untested side", now).await;
        };

        let replacement = OptionLeg::new(untested, strike, leg.expiration, leg.quantity);
        let reason = format!(
            "{tested} tested, moving {untested} {} to {strike}",
            leg.strike
        );
        let request = RollRequest {
            position: position.clone(),
            close_legs: vec![leg.clone()],
            open_legs: vec![replacement],
            limit_price: None,
        };
        let intents = self.orders.prepare_roll(&request).await?;
        tracing::info!(symbol = %position.symbol, reason = %reason, "Defense intents prepared");

        Ok(AutomationEvent::PositionDefended {
            symbol: position.symbol.clone(),
            close_intent_id: intents.close.id,
            open_intent_id: intents.open.id,
            reason,
            timestamp: now,
        })
    }
}

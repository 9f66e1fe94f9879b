//! Automation events published to subscribers.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::action::ActionType;
use crate::domain::position::StrategyKind;
use crate::domain::shared::Symbol;

/// Everything the engine reports to the outside world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AutomationEvent {
    /// Loops started.
    EngineStarted {
        /// Reason text.
        reason: String,
        /// When it happened.
        timestamp: DateTime<Utc>,
    },
    /// Loops cancelled.
    EngineStopped {
        /// Reason text.
        reason: String,
        /// When it happened.
        timestamp: DateTime<Utc>,
    },
    /// Any queued action completed successfully.
    ActionExecuted {
        /// Underlying symbol.
        symbol: Symbol,
        /// Action type that executed.
        action_type: ActionType,
        /// Reason the action was raised.
        reason: String,
        /// When it happened.
        timestamp: DateTime<Utc>,
    },
    /// A close intent was prepared.
    PositionClosed {
        /// Underlying symbol.
        symbol: Symbol,
        /// Close order intent.
        intent_id: Uuid,
        /// Why it was closed.
        reason: String,
        /// When it happened.
        timestamp: DateTime<Utc>,
    },
    /// A close/open roll pair was prepared.
    PositionRolled {
        /// Underlying symbol.
        symbol: Symbol,
        /// Closing leg intent.
        close_intent_id: Uuid,
        /// Opening leg intent.
        open_intent_id: Uuid,
        /// Replacement expiration.
        new_expiration: NaiveDate,
        /// Net credit (negative = debit) of the roll.
        net_credit: Decimal,
        /// Why it was rolled.
        reason: String,
        /// When it happened.
        timestamp: DateTime<Utc>,
    },
    /// The untested side was adjusted.
    PositionDefended {
        /// Underlying symbol.
        symbol: Symbol,
        /// Closing leg intent.
        close_intent_id: Uuid,
        /// Replacement leg intent.
        open_intent_id: Uuid,
        /// What was adjusted.
        reason: String,
        /// When it happened.
        timestamp: DateTime<Utc>,
    },
    /// A new entry qualified and was queued.
    EntrySignalGenerated {
        /// Underlying symbol.
        symbol: Symbol,
        /// Strategy to open.
        strategy: StrategyKind,
        /// Opportunity score.
        score: Decimal,
        /// Contracts.
        quantity: u32,
        /// Scoring summary.
        reason: String,
        /// When it happened.
        timestamp: DateTime<Utc>,
    },
    /// Portfolio-wide emergency detected.
    EmergencyTriggered {
        /// Every check that fired.
        reasons: Vec<String>,
        /// Positions enqueued for closing.
        positions: usize,
        /// When it happened.
        timestamp: DateTime<Utc>,
    },
}

impl AutomationEvent {
    /// Short variant name for logs and metrics labels.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::EngineStarted { .. } => "engine_started",
            Self::EngineStopped { .. } => "engine_stopped",
            Self::ActionExecuted { .. } => "action_executed",
            Self::PositionClosed { .. } => "position_closed",
            Self::PositionRolled { .. } => "position_rolled",
            Self::PositionDefended { .. } => "position_defended",
            Self::EntrySignalGenerated { .. } => "entry_signal_generated",
            Self::EmergencyTriggered { .. } => "emergency_triggered",
        }
    }

    /// Affected symbol, for position- or entry-scoped events.
    #[must_use]
    pub const fn symbol(&self) -> Option<&Symbol> {
        match self {
            Self::ActionExecuted { symbol, .. }
            | Self::PositionClosed { symbol, .. }
            | Self::PositionRolled { symbol, .. }
            | Self::PositionDefended { symbol, .. }
            | Self::EntrySignalGenerated { symbol, .. } => Some(symbol),
            Self::EngineStarted { .. }
            | Self::EngineStopped { .. }
            | Self::EmergencyTriggered { .. } => None,
        }
    }

    /// Human-readable reason.
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::EngineStarted { reason, .. }
            | Self::EngineStopped { reason, .. }
            | Self::ActionExecuted { reason, .. }
            | Self::PositionClosed { reason, .. }
            | Self::PositionRolled { reason, .. }
            | Self::PositionDefended { reason, .. }
            | Self::EntrySignalGenerated { reason, .. } => reason.clone(),
            Self::EmergencyTriggered { reasons, .. } => reasons.join("; "),
        }
    }

    /// When the event happened.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::EngineStarted { timestamp, .. }
            | Self::EngineStopped { timestamp, .. }
            | Self::ActionExecuted { timestamp, .. }
            | Self::PositionClosed { timestamp, .. }
            | Self::PositionRolled { timestamp, .. }
            | Self::PositionDefended { timestamp, .. }
            | Self::EntrySignalGenerated { timestamp, .. }
            | Self::EmergencyTriggered { timestamp, .. } => *timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emergency_reason_joins_all_checks() {
        let event = AutomationEvent::EmergencyTriggered {
            reasons: vec!["drawdown 12%".to_string(), "VIX 45".to_string()],
            positions: 3,
            timestamp: Utc::now(),
        };
        assert_eq!(event.reason(), "drawdown 12%; VIX 45");
        assert!(event.symbol().is_none());
        assert_eq!(event.kind(), "emergency_triggered");
    }

    #[test]
    fn serializes_with_type_tag() {
        let event = AutomationEvent::ActionExecuted {
            symbol: Symbol::new("SPY"),
            action_type: ActionType::StopLoss,
            reason: "stop".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "action_executed");
        assert_eq!(json["action_type"], "STOP_LOSS");
        assert_eq!(event.symbol().map(Symbol::as_str), Some("SPY"));
    }
}

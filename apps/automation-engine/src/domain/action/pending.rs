//! Pending action value objects.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::position::{OptionLeg, Position, StrategyKind};
use crate::domain::shared::Symbol;

/// Why an action was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    /// Profit target reached.
    #[serde(rename = "CLOSE_PROFIT")]
    CloseProfit,
    /// Time-decay management threshold reached.
    #[serde(rename = "MANAGE_21DTE")]
    Manage21Dte,
    /// Losing position close to expiration.
    #[serde(rename = "DEFENSIVE_URGENT")]
    DefensiveUrgent,
    /// Loss beyond the stop-loss multiple of credit.
    #[serde(rename = "STOP_LOSS")]
    StopLoss,
    /// Underlying has tested a short strike.
    #[serde(rename = "MANAGE_TESTED")]
    ManageTested,
    /// Portfolio-wide emergency flattening.
    #[serde(rename = "EMERGENCY_CLOSE")]
    EmergencyClose,
    /// New position from the entry evaluator.
    #[serde(rename = "AUTOMATED_ENTRY")]
    AutomatedEntry,
}

impl ActionType {
    /// Emergency actions are dropped instead of re-queued on failure.
    #[must_use]
    pub const fn is_emergency(&self) -> bool {
        matches!(self, Self::EmergencyClose)
    }

    /// Wire/label name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CloseProfit => "CLOSE_PROFIT",
            Self::Manage21Dte => "MANAGE_21DTE",
            Self::DefensiveUrgent => "DEFENSIVE_URGENT",
            Self::StopLoss => "STOP_LOSS",
            Self::ManageTested => "MANAGE_TESTED",
            Self::EmergencyClose => "EMERGENCY_CLOSE",
            Self::AutomatedEntry => "AUTOMATED_ENTRY",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the executor does with an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionVerb {
    /// Close every leg.
    Close,
    /// Close and reopen further out.
    Roll,
    /// Strategy-specific adjustment of the tested side.
    Defend,
    /// Open a new position.
    Open,
}

impl fmt::Display for ActionVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Close => "CLOSE",
            Self::Roll => "ROLL",
            Self::Defend => "DEFEND",
            Self::Open => "OPEN",
        };
        f.write_str(name)
    }
}

/// A new position the entry evaluator wants opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryIntent {
    /// Underlying symbol.
    pub symbol: Symbol,
    /// Strategy to open.
    pub strategy: StrategyKind,
    /// Legs to open, sized to `quantity`.
    pub legs: Vec<OptionLeg>,
    /// Target expiration.
    pub expiration: NaiveDate,
    /// Contracts per leg.
    pub quantity: u32,
    /// Limit price per spread (positive = credit).
    pub limit_price: Decimal,
    /// Opportunity score that qualified the entry.
    pub score: Decimal,
}

impl EntryIntent {
    /// Strike used to key the intent in the queue.
    #[must_use]
    pub fn key_strike(&self) -> Decimal {
        self.legs
            .iter()
            .find(|leg| leg.is_short())
            .or_else(|| self.legs.first())
            .map_or(Decimal::ZERO, |leg| leg.strike)
    }
}

/// What an action operates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionTarget {
    /// An existing position snapshot.
    Position(Position),
    /// A new entry.
    Entry(EntryIntent),
}

impl ActionTarget {
    /// Underlying symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        match self {
            Self::Position(position) => &position.symbol,
            Self::Entry(intent) => &intent.symbol,
        }
    }

    /// Key strike.
    #[must_use]
    pub fn strike(&self) -> Decimal {
        match self {
            Self::Position(position) => position.key_strike(),
            Self::Entry(intent) => intent.key_strike(),
        }
    }

    /// Nearest expiration.
    #[must_use]
    pub fn expiration(&self) -> Option<NaiveDate> {
        match self {
            Self::Position(position) => position.expiration(),
            Self::Entry(intent) => Some(intent.expiration),
        }
    }
}

/// De-duplication key for queued actions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionKey {
    /// Underlying symbol.
    pub symbol: Symbol,
    /// Key strike.
    pub strike: Decimal,
    /// Action type.
    pub action_type: ActionType,
}

/// Key of the executed-action registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExecutionKey {
    /// Underlying symbol.
    pub symbol: Symbol,
    /// Key strike.
    pub strike: Decimal,
    /// Nearest expiration.
    pub expiration: Option<NaiveDate>,
}

impl fmt::Display for ExecutionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expiration {
            Some(expiration) => write!(f, "{}:{}:{}", self.symbol, self.strike, expiration),
            None => write!(f, "{}:{}", self.symbol, self.strike),
        }
    }
}

/// An action waiting in the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    /// Why the action was raised.
    pub action_type: ActionType,
    /// What it operates on.
    pub target: ActionTarget,
    /// Lower is more urgent.
    pub priority: i32,
    /// Human-readable explanation.
    pub reason: String,
    /// What the executor should do.
    pub verb: ActionVerb,
    /// Insertion order, assigned by the queue.
    pub sequence: u64,
}

impl PendingAction {
    /// Action against an existing position.
    #[must_use]
    pub fn for_position(
        action_type: ActionType,
        verb: ActionVerb,
        priority: i32,
        position: Position,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            action_type,
            target: ActionTarget::Position(position),
            priority,
            reason: reason.into(),
            verb,
            sequence: 0,
        }
    }

    /// New-entry action.
    #[must_use]
    pub fn entry(intent: EntryIntent, priority: i32, reason: impl Into<String>) -> Self {
        Self {
            action_type: ActionType::AutomatedEntry,
            target: ActionTarget::Entry(intent),
            priority,
            reason: reason.into(),
            verb: ActionVerb::Open,
            sequence: 0,
        }
    }

    /// Underlying symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        self.target.symbol()
    }

    /// The position, when the target is one.
    #[must_use]
    pub const fn position(&self) -> Option<&Position> {
        match &self.target {
            ActionTarget::Position(position) => Some(position),
            ActionTarget::Entry(_) => None,
        }
    }

    /// De-duplication key.
    #[must_use]
    pub fn key(&self) -> ActionKey {
        ActionKey {
            symbol: self.symbol().clone(),
            strike: self.target.strike(),
            action_type: self.action_type,
        }
    }

    /// Executed-registry key.
    #[must_use]
    pub fn execution_key(&self) -> ExecutionKey {
        ExecutionKey {
            symbol: self.symbol().clone(),
            strike: self.target.strike(),
            expiration: self.target.expiration(),
        }
    }
}

/// Executed-registry key for a position, independent of action type.
#[must_use]
pub fn execution_key_for(position: &Position) -> ExecutionKey {
    ExecutionKey {
        symbol: position.symbol.clone(),
        strike: position.key_strike(),
        expiration: position.expiration(),
    }
}

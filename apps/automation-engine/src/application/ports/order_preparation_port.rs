//! Order Preparation Port (Driven Port)
//!
//! Turns engine decisions into order intents. Preparing an intent does not
//! guarantee it is ever submitted to a market.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::action::EntryIntent;
use crate::domain::position::{OptionLeg, OptionRight, Position, StrategyKind};
use crate::domain::shared::Symbol;

/// What an intent does to the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentPurpose {
    /// Flatten existing legs.
    Close,
    /// Establish new legs.
    Open,
}

/// A prepared, not necessarily submitted, order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderIntent {
    /// Intent ID.
    pub id: Uuid,
    /// Underlying symbol.
    pub symbol: Symbol,
    /// Close or open.
    pub purpose: IntentPurpose,
    /// Order legs; positive quantity buys, negative sells.
    pub legs: Vec<OptionLeg>,
    /// Net limit price per spread (positive = credit), if any.
    pub limit_price: Option<Decimal>,
    /// Whether the collaborator forwarded it to a broker.
    pub submitted: bool,
    /// When it was prepared.
    pub created_at: DateTime<Utc>,
}

impl OrderIntent {
    /// New unsubmitted intent.
    #[must_use]
    pub fn new(
        symbol: Symbol,
        purpose: IntentPurpose,
        legs: Vec<OptionLeg>,
        limit_price: Option<Decimal>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol,
            purpose,
            legs,
            limit_price,
            submitted: false,
            created_at,
        }
    }
}

/// Close/open pair for a roll or a defensive adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollIntent {
    /// Closes the legs being replaced.
    pub close: OrderIntent,
    /// Opens the replacement legs.
    pub open: OrderIntent,
}

/// Legs to replace and their replacements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollRequest {
    /// Position being adjusted.
    pub position: Position,
    /// Legs to close, as currently held.
    pub close_legs: Vec<OptionLeg>,
    /// Legs to open, as they will be held.
    pub open_legs: Vec<OptionLeg>,
    /// Net limit per spread (positive = credit), if any.
    pub limit_price: Option<Decimal>,
}

/// Parameters for strike selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikeRequest {
    /// Underlying symbol.
    pub symbol: Symbol,
    /// Structure to build.
    pub strategy: StrategyKind,
    /// Preferred DTE when `expiration` is not fixed.
    pub target_dte: i64,
    /// Exact expiration to use.
    pub expiration: Option<NaiveDate>,
    /// |delta| of the primary leg(s).
    pub delta: Decimal,
    /// Restrict to one right (single-leg selection).
    pub right: Option<OptionRight>,
    /// Wing width for defined-risk structures.
    pub wing_width: Option<Decimal>,
}

/// Strikes chosen for one lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikeSelection {
    /// Chosen expiration.
    pub expiration: NaiveDate,
    /// One-lot legs, signed as they will be held.
    pub legs: Vec<OptionLeg>,
    /// Net mid price per lot (positive = credit).
    pub limit_price: Decimal,
}

/// Order preparation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OrderPreparationError {
    /// Collaborator could not be reached.
    #[error("Order preparation unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// Collaborator refused the request.
    #[error("Order preparation rejected for {symbol}: {reason}")]
    Rejected {
        /// Underlying symbol.
        symbol: String,
        /// Rejection reason.
        reason: String,
    },
}

/// Port for preparing order intents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderPreparationPort: Send + Sync {
    /// Close every leg of a position.
    async fn prepare_close(
        &self,
        position: &Position,
        reason: &str,
    ) -> Result<OrderIntent, OrderPreparationError>;

    /// Close some legs and open replacements.
    async fn prepare_roll(&self, request: &RollRequest) -> Result<RollIntent, OrderPreparationError>;

    /// Open a new position.
    async fn prepare_entry(&self, intent: &EntryIntent) -> Result<OrderIntent, OrderPreparationError>;

    /// Choose strikes/expiration for a structure. `None` when nothing fits.
    async fn find_optimal_strikes(
        &self,
        request: &StrikeRequest,
    ) -> Result<Option<StrikeSelection>, OrderPreparationError>;
}

/// Order legs that flatten `legs`.
#[must_use]
pub fn closing_legs(legs: &[OptionLeg]) -> Vec<OptionLeg> {
    legs.iter()
        .map(|leg| OptionLeg::new(leg.right, leg.strike, leg.expiration, -leg.quantity))
        .collect()
}

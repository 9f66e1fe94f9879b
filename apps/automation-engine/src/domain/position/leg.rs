//! Option Leg Value Object

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Option right (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptionRight {
    /// Call option (right to buy).
    Call,
    /// Put option (right to sell).
    Put,
}

impl std::fmt::Display for OptionRight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "CALL"),
            Self::Put => write!(f, "PUT"),
        }
    }
}

/// A single leg of an option position.
///
/// `quantity` is signed: positive for long contracts, negative for short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionLeg {
    /// Call or put.
    pub right: OptionRight,
    /// Strike price.
    pub strike: Decimal,
    /// Expiration date.
    pub expiration: NaiveDate,
    /// Signed contract count.
    pub quantity: i32,
}

impl OptionLeg {
    /// Create a new leg.
    #[must_use]
    pub const fn new(right: OptionRight, strike: Decimal, expiration: NaiveDate, quantity: i32) -> Self {
        Self {
            right,
            strike,
            expiration,
            quantity,
        }
    }

    /// Create a short leg of `contracts` contracts.
    #[must_use]
    pub const fn short(right: OptionRight, strike: Decimal, expiration: NaiveDate, contracts: i32) -> Self {
        Self::new(right, strike, expiration, -contracts.abs())
    }

    /// Create a long leg of `contracts` contracts.
    #[must_use]
    pub const fn long(right: OptionRight, strike: Decimal, expiration: NaiveDate, contracts: i32) -> Self {
        Self::new(right, strike, expiration, contracts.abs())
    }

    /// Check if this leg is short (sold).
    #[must_use]
    pub const fn is_short(&self) -> bool {
        self.quantity < 0
    }

    /// Check if this leg is long (bought).
    #[must_use]
    pub const fn is_long(&self) -> bool {
        self.quantity > 0
    }

    /// Unsigned contract count.
    #[must_use]
    pub const fn contracts(&self) -> u32 {
        self.quantity.unsigned_abs()
    }

    /// Signed quantity as a decimal.
    #[must_use]
    pub fn signed_quantity(&self) -> Decimal {
        Decimal::from(self.quantity)
    }
}

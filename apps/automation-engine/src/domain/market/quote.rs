//! Latest quote for an underlying or index.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::Symbol;

/// Latest price/volume snapshot from the quote source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Instrument symbol.
    pub symbol: Symbol,
    /// Last traded price.
    pub last: Decimal,
    /// Previous session close, when known.
    #[serde(default)]
    pub previous_close: Option<Decimal>,
    /// Session volume.
    #[serde(default)]
    pub volume: Decimal,
    /// Quote timestamp.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// Create a quote stamped now.
    #[must_use]
    pub fn new(symbol: Symbol, last: Decimal) -> Self {
        Self {
            symbol,
            last,
            previous_close: None,
            volume: Decimal::ZERO,
            timestamp: Utc::now(),
        }
    }

    /// Attach the previous close.
    #[must_use]
    pub const fn with_previous_close(mut self, previous_close: Decimal) -> Self {
        self.previous_close = Some(previous_close);
        self
    }

    /// Percent change from the previous close.
    #[must_use]
    pub fn change_pct(&self) -> Option<Decimal> {
        let prev = self.previous_close?;
        if prev <= Decimal::ZERO {
            return None;
        }
        Some((self.last - prev) / prev * Decimal::ONE_HUNDRED)
    }

    /// Whether the quote carries a usable price.
    #[must_use]
    pub fn has_price(&self) -> bool {
        self.last > Decimal::ZERO
    }
}

//! Strategy tag carried by each position.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Strategy a position was opened under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Short OTM put + short OTM call, undefined risk.
    Strangle,
    /// Short put spread + short call spread.
    IronCondor,
    /// Short put vertical.
    PutCreditSpread,
    /// Short call vertical.
    CallCreditSpread,
    /// Same-day-expiration premium structure.
    ZeroDte,
    /// Long-dated debit structure.
    LongDated,
    /// Calendar/diagonal debit spread.
    Calendar,
    /// Anything the engine has no specific policy for.
    #[serde(other)]
    Other,
}

impl StrategyKind {
    /// Premium-selling strategies collect a credit and profit from decay.
    #[must_use]
    pub const fn is_premium_selling(&self) -> bool {
        matches!(
            self,
            Self::Strangle
                | Self::IronCondor
                | Self::PutCreditSpread
                | Self::CallCreditSpread
                | Self::ZeroDte
        )
    }

    /// Strategies managed by the DTE threshold rule.
    #[must_use]
    pub const fn is_time_decay_sensitive(&self) -> bool {
        self.is_premium_selling()
    }

    /// Undefined-risk structures (no long wings).
    #[must_use]
    pub const fn is_undefined_risk(&self) -> bool {
        matches!(self, Self::Strangle)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Strangle => "strangle",
            Self::IronCondor => "iron_condor",
            Self::PutCreditSpread => "put_credit_spread",
            Self::CallCreditSpread => "call_credit_spread",
            Self::ZeroDte => "zero_dte",
            Self::LongDated => "long_dated",
            Self::Calendar => "calendar",
            Self::Other => "other",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn premium_selling_classification() {
        assert!(StrategyKind::Strangle.is_premium_selling());
        assert!(StrategyKind::IronCondor.is_time_decay_sensitive());
        assert!(!StrategyKind::LongDated.is_premium_selling());
        assert!(!StrategyKind::Calendar.is_time_decay_sensitive());
        assert!(!StrategyKind::Other.is_premium_selling());
    }

    #[test]
    fn unknown_strategy_deserializes_as_other() {
        let kind: StrategyKind = serde_json::from_str("\"jade_lizard\"").unwrap();
        assert_eq!(kind, StrategyKind::Other);
    }

    #[test]
    fn display_matches_serde_name() {
        let json = serde_json::to_string(&StrategyKind::IronCondor).unwrap();
        assert_eq!(json, format!("\"{}\"", StrategyKind::IronCondor));
    }
}

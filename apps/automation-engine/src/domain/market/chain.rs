//! Option chain ladders.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::position::OptionRight;
use crate::domain::shared::Symbol;

/// One strike of one right at one expiration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikeQuote {
    /// Strike price.
    pub strike: Decimal,
    /// Call or put.
    pub right: OptionRight,
    /// Best bid.
    pub bid: Decimal,
    /// Best ask.
    pub ask: Decimal,
    /// Per-contract delta (calls positive, puts negative).
    pub delta: Decimal,
    /// Per-contract theta (per day, negative for long options).
    pub theta: Decimal,
    /// Implied volatility, when provided.
    #[serde(default)]
    pub implied_volatility: Option<Decimal>,
}

impl StrikeQuote {
    /// Mid price.
    #[must_use]
    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }
}

/// Strike ladder for one expiration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainExpiration {
    /// Expiration date.
    pub expiration: NaiveDate,
    /// Quotes for every listed strike and right.
    pub strikes: Vec<StrikeQuote>,
}

impl ChainExpiration {
    /// Days from `today` to this expiration.
    #[must_use]
    pub fn dte(&self, today: NaiveDate) -> i64 {
        (self.expiration - today).num_days()
    }

    /// Strike of `right` whose |delta| is closest to `target_delta`.
    ///
    /// Quotes without a two-sided market are ignored.
    #[must_use]
    pub fn find_by_delta(&self, right: OptionRight, target_delta: Decimal) -> Option<&StrikeQuote> {
        let target = target_delta.abs();
        self.strikes
            .iter()
            .filter(|q| q.right == right && q.ask > Decimal::ZERO)
            .min_by_key(|q| (q.delta.abs() - target).abs())
    }

    /// Exact strike lookup.
    #[must_use]
    pub fn find_strike(&self, right: OptionRight, strike: Decimal) -> Option<&StrikeQuote> {
        self.strikes
            .iter()
            .find(|q| q.right == right && q.strike == strike)
    }

    /// Listed strike of `right` nearest to `strike`.
    #[must_use]
    pub fn nearest_strike(&self, right: OptionRight, strike: Decimal) -> Option<&StrikeQuote> {
        self.strikes
            .iter()
            .filter(|q| q.right == right)
            .min_by_key(|q| (q.strike - strike).abs())
    }
}

/// Option chain for an underlying across expirations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionChain {
    /// Underlying symbol.
    pub symbol: Symbol,
    /// Underlying price at the time the chain was built.
    #[serde(default)]
    pub underlying_price: Option<Decimal>,
    /// Expirations, in any order.
    pub expirations: Vec<ChainExpiration>,
}

impl OptionChain {
    /// Whether the chain has no strikes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expirations.iter().all(|e| e.strikes.is_empty())
    }

    /// Ladder for a specific expiration.
    #[must_use]
    pub fn expiration(&self, date: NaiveDate) -> Option<&ChainExpiration> {
        self.expirations.iter().find(|e| e.expiration == date)
    }

    /// Expirations whose DTE lies within `[min_dte, max_dte]`, nearest first.
    #[must_use]
    pub fn within_dte(&self, today: NaiveDate, min_dte: i64, max_dte: i64) -> Vec<&ChainExpiration> {
        let mut matching: Vec<&ChainExpiration> = self
            .expirations
            .iter()
            .filter(|e| {
                let dte = e.dte(today);
                dte >= min_dte && dte <= max_dte && !e.strikes.is_empty()
            })
            .collect();
        matching.sort_by_key(|e| e.expiration);
        matching
    }

    /// Expiration whose DTE is closest to `target_dte` (ties go to the nearer date).
    #[must_use]
    pub fn closest_to_dte(&self, today: NaiveDate, target_dte: i64) -> Option<&ChainExpiration> {
        self.expirations
            .iter()
            .filter(|e| e.dte(today) >= 0 && !e.strikes.is_empty())
            .min_by_key(|e| ((e.dte(today) - target_dte).abs(), e.expiration))
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{chain, ladder};
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn find_by_delta_picks_closest_absolute_delta() {
        let exp = ladder(date(2026, 12, 18), dec!(400));
        // OTM delta = 0.50 - 0.04 * steps: 0.14 at 9 steps, 0.18 at 8 steps.
        // Equal distance from 0.16, first listed (lower) strike wins.
        let put = exp.find_by_delta(OptionRight::Put, dec!(0.16)).unwrap();
        assert_eq!(put.strike, dec!(355));
        let call = exp.find_by_delta(OptionRight::Call, dec!(0.22)).unwrap();
        assert_eq!(call.strike, dec!(435));
    }

    #[test]
    fn within_dte_filters_and_sorts() {
        let today = date(2026, 10, 19);
        let c = chain(
            "SPY",
            dec!(400),
            &[date(2026, 12, 18), date(2026, 11, 20), date(2027, 1, 15)],
        );
        let found = c.within_dte(today, 30, 60);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].expiration, date(2026, 11, 20));
        assert_eq!(found[1].expiration, date(2026, 12, 18));
    }

    #[test]
    fn closest_to_dte() {
        let today = date(2026, 10, 19);
        let c = chain("SPY", dec!(400), &[date(2026, 11, 20), date(2026, 12, 18)]);
        // 32 DTE vs 60 DTE; target 45 -> 32 is 13 away, 60 is 15 away
        assert_eq!(
            c.closest_to_dte(today, 45).unwrap().expiration,
            date(2026, 11, 20)
        );
    }

    #[test]
    fn empty_chain() {
        let c = OptionChain {
            symbol: Symbol::new("SPY"),
            underlying_price: None,
            expirations: vec![ChainExpiration {
                expiration: date(2026, 11, 20),
                strikes: vec![],
            }],
        };
        assert!(c.is_empty());
        assert!(c.within_dte(date(2026, 10, 19), 0, 100).is_empty());
    }
}

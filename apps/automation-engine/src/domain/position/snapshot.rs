//! Position snapshot and derived fields.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{OptionLeg, OptionRight, StrategyKind};
use crate::domain::shared::{DomainError, Symbol};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

fn default_multiplier() -> Decimal {
    HUNDRED
}

/// An open option position as reported by the position source.
///
/// The engine never stores positions between cycles; every decision is made
/// against the latest snapshot plus the fields derived here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Broker/position-source identifier.
    pub id: String,
    /// Underlying symbol.
    pub symbol: Symbol,
    /// Strategy tag.
    pub strategy: StrategyKind,
    /// Option legs.
    pub legs: Vec<OptionLeg>,
    /// Total credit received at open (currency). Zero for debit positions.
    #[serde(default)]
    pub credit_received: Decimal,
    /// Total cost paid at open (currency). Zero for credit positions.
    #[serde(default)]
    pub cost_basis: Decimal,
    /// Unrealized profit/loss (currency).
    pub unrealized_pnl: Decimal,
    /// Contract multiplier.
    #[serde(default = "default_multiplier")]
    pub multiplier: Decimal,
    /// Date the position was opened.
    pub entry_date: NaiveDate,
}

impl Position {
    /// Check the snapshot is usable for evaluation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::MalformedPosition` if there are no legs or a leg
    /// has a zero quantity, and `DomainError::InvalidValue` for a bad symbol.
    pub fn validate(&self) -> Result<(), DomainError> {
        self.symbol.validate()?;

        if self.legs.is_empty() {
            return Err(DomainError::MalformedPosition {
                symbol: self.symbol.to_string(),
                message: "position has no legs".to_string(),
            });
        }

        if self.legs.iter().any(|leg| leg.quantity == 0) {
            return Err(DomainError::MalformedPosition {
                symbol: self.symbol.to_string(),
                message: "leg with zero quantity".to_string(),
            });
        }

        Ok(())
    }

    /// Whether the position was opened for a net credit.
    #[must_use]
    pub fn is_credit(&self) -> bool {
        self.credit_received > Decimal::ZERO
    }

    /// Basis the P/L percentage is measured against.
    #[must_use]
    pub fn basis(&self) -> Decimal {
        if self.is_credit() {
            self.credit_received
        } else {
            self.cost_basis
        }
    }

    /// Unrealized P/L as a percentage of credit received (or cost basis).
    ///
    /// Returns zero when the basis is zero or the ratio does not fit a
    /// `Decimal`.
    #[must_use]
    pub fn pnl_pct(&self) -> Decimal {
        let basis = self.basis();
        if basis <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.unrealized_pnl
            .checked_div(basis)
            .and_then(|ratio| ratio.checked_mul(HUNDRED))
            .unwrap_or(Decimal::ZERO)
    }

    /// Nearest leg expiration.
    #[must_use]
    pub fn expiration(&self) -> Option<NaiveDate> {
        self.legs.iter().map(|leg| leg.expiration).min()
    }

    /// Days to the nearest expiration. Negative once expired.
    #[must_use]
    pub fn dte(&self, today: NaiveDate) -> i64 {
        self.expiration()
            .map_or(0, |expiration| (expiration - today).num_days())
    }

    /// Number of contracts (largest leg size).
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.legs.iter().map(OptionLeg::contracts).max().unwrap_or(0)
    }

    /// Strike used to identify the position in the action queue.
    ///
    /// First short-leg strike, falling back to the first leg.
    #[must_use]
    pub fn key_strike(&self) -> Decimal {
        self.short_legs()
            .next()
            .or_else(|| self.legs.first())
            .map_or(Decimal::ZERO, |leg| leg.strike)
    }

    /// Iterate the short legs.
    pub fn short_legs(&self) -> impl Iterator<Item = &OptionLeg> {
        self.legs.iter().filter(|leg| leg.is_short())
    }

    /// Current cost to close a credit position (credit received minus P/L).
    ///
    /// For debit positions this is the current market value instead.
    /// `None` if it overflows.
    #[must_use]
    pub fn closing_value(&self) -> Option<Decimal> {
        if self.is_credit() {
            self.credit_received.checked_sub(self.unrealized_pnl)
        } else {
            self.cost_basis.checked_add(self.unrealized_pnl)
        }
    }

    /// Widest distance between a short leg and a long leg of the same right.
    ///
    /// Zero for undefined-risk structures.
    #[must_use]
    pub fn width(&self) -> Decimal {
        spread_width(&self.legs)
    }

    /// Which short side, if any, the underlying has moved through or to
    /// within `buffer_pct` percent of.
    ///
    /// When both sides qualify the deeper breach wins.
    #[must_use]
    pub fn tested_side(&self, underlying_price: Decimal, buffer_pct: Decimal) -> Option<OptionRight> {
        if underlying_price <= Decimal::ZERO {
            return None;
        }

        let buffer = buffer_pct / HUNDRED;
        let mut tested: Option<(OptionRight, Decimal)> = None;

        for leg in self.short_legs() {
            let (threshold, depth) = match leg.right {
                OptionRight::Put => (
                    leg.strike * (Decimal::ONE + buffer),
                    leg.strike - underlying_price,
                ),
                OptionRight::Call => (
                    leg.strike * (Decimal::ONE - buffer),
                    underlying_price - leg.strike,
                ),
            };

            let breached = match leg.right {
                OptionRight::Put => underlying_price <= threshold,
                OptionRight::Call => underlying_price >= threshold,
            };

            if breached && tested.is_none_or(|(_, best)| depth > best) {
                tested = Some((leg.right, depth));
            }
        }

        tested.map(|(right, _)| right)
    }
}

/// Widest short/long distance among legs of the same right.
#[must_use]
pub fn spread_width(legs: &[OptionLeg]) -> Decimal {
    [OptionRight::Put, OptionRight::Call]
        .into_iter()
        .filter_map(|right| {
            let shorts = legs.iter().filter(|l| l.right == right && l.is_short());
            shorts
                .flat_map(|short| {
                    legs.iter()
                        .filter(move |l| l.right == right && l.is_long())
                        .map(move |long| (short.strike - long.strike).abs())
                })
                .max()
        })
        .max()
        .unwrap_or(Decimal::ZERO)
}

/// Average |strike − price| ÷ price × 100 over the given legs.
#[must_use]
pub fn strike_distance_pct<'a>(
    legs: impl Iterator<Item = &'a OptionLeg>,
    underlying_price: Decimal,
) -> Decimal {
    if underlying_price <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let (sum, count) = legs.fold((Decimal::ZERO, 0u32), |(sum, count), leg| {
        (sum + (leg.strike - underlying_price).abs(), count + 1)
    });

    if count == 0 {
        return Decimal::ZERO;
    }

    (sum / Decimal::from(count))
        .checked_div(underlying_price)
        .and_then(|ratio| ratio.checked_mul(HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use rust_decimal_macros::dec;

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// 1-lot short strangle: short put 380 / short call 420.
    pub fn strangle(expiration: NaiveDate, credit: Decimal, pnl: Decimal) -> Position {
        Position {
            id: "pos-strangle".to_string(),
            symbol: Symbol::new("SPY"),
            strategy: StrategyKind::Strangle,
            legs: vec![
                OptionLeg::short(OptionRight::Put, dec!(380), expiration, 1),
                OptionLeg::short(OptionRight::Call, dec!(420), expiration, 1),
            ],
            credit_received: credit,
            cost_basis: Decimal::ZERO,
            unrealized_pnl: pnl,
            multiplier: dec!(100),
            entry_date: date(2026, 9, 1),
        }
    }

    /// 1-lot iron condor: 370/380 puts, 420/430 calls.
    pub fn iron_condor(expiration: NaiveDate, credit: Decimal, pnl: Decimal) -> Position {
        Position {
            id: "pos-condor".to_string(),
            symbol: Symbol::new("QQQ"),
            strategy: StrategyKind::IronCondor,
            legs: vec![
                OptionLeg::long(OptionRight::Put, dec!(370), expiration, 1),
                OptionLeg::short(OptionRight::Put, dec!(380), expiration, 1),
                OptionLeg::short(OptionRight::Call, dec!(420), expiration, 1),
                OptionLeg::long(OptionRight::Call, dec!(430), expiration, 1),
            ],
            credit_received: credit,
            cost_basis: Decimal::ZERO,
            unrealized_pnl: pnl,
            multiplier: dec!(100),
            entry_date: date(2026, 9, 1),
        }
    }
}

//! Roll Analyzer
//!
//! Decides whether a position should be rolled or closed, searches the option
//! chain for replacement expirations in the roll-type DTE band, scores each
//! candidate and picks the best one.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::config::{DteBand, RollConfig};
use crate::domain::market::{ChainExpiration, OptionChain};
use crate::domain::position::{OptionLeg, OptionRight, Position, spread_width, strike_distance_pct};

/// Why a roll is happening; selects DTE band and delta target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RollType {
    /// A short strike is tested.
    Defensive,
    /// Inside the time-decay management window.
    Management,
    /// Anything else.
    Standard,
}

impl std::fmt::Display for RollType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Defensive => write!(f, "defensive"),
            Self::Management => write!(f, "management"),
            Self::Standard => write!(f, "standard"),
        }
    }
}

/// Result of the advisability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisability {
    /// Rolling makes no sense; close instead.
    Close {
        /// Why.
        reason: String,
    },
    /// Roll with the given type.
    Roll(RollType),
}

/// Added duration and premium efficiency of a roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostBenefit {
    /// Days added beyond the current expiration (negative if earlier).
    pub added_days: i64,
    /// Projected theta minus current theta, per day.
    pub incremental_theta: Decimal,
    /// Net credit per added day; zero when no days are added.
    pub credit_per_day: Decimal,
}

/// One scored replacement expiration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollCandidate {
    /// Replacement expiration.
    pub expiration: NaiveDate,
    /// DTE of the replacement.
    pub dte: i64,
    /// Replacement legs as they will be held.
    pub legs: Vec<OptionLeg>,
    /// Opening credit of the replacement at mid (currency).
    pub replacement_credit: Decimal,
    /// Cost to close the current legs (currency).
    pub closing_cost: Decimal,
    /// Replacement credit minus closing cost; negative is a debit.
    pub net_credit: Decimal,
    /// Position delta of the replacement.
    pub projected_delta: Decimal,
    /// Position theta of the replacement.
    pub projected_theta: Decimal,
    /// Spread width of the replacement minus the current width.
    pub width_change: Decimal,
    /// Duration/premium summary.
    pub cost_benefit: CostBenefit,
    /// Max profit over approximate max risk.
    pub risk_reward: Decimal,
    /// Composite score; higher is better.
    pub score: Decimal,
}

/// Final word on a ROLL action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollRecommendation {
    /// Roll into the chosen candidate.
    Roll {
        /// Roll type that chose the band.
        roll_type: RollType,
        /// Winning candidate.
        candidate: RollCandidate,
        /// Summary.
        reason: String,
    },
    /// Close the position instead.
    Close {
        /// Why.
        reason: String,
    },
}

/// Market inputs for one analysis.
#[derive(Debug, Clone, Copy)]
pub struct RollContext<'a> {
    /// Latest underlying price, if known.
    pub underlying_price: Option<Decimal>,
    /// Volatility index level, if known.
    pub volatility: Option<Decimal>,
    /// Chain for the underlying, if one could be fetched.
    pub chain: Option<&'a OptionChain>,
    /// Local trading date.
    pub today: NaiveDate,
}

/// Roll advisability, candidate search and scoring.
#[derive(Debug, Clone)]
pub struct RollAnalyzer {
    config: RollConfig,
    management_dte: i64,
    tested_buffer_pct: Decimal,
}

impl RollAnalyzer {
    /// Create an analyzer. `management_dte` and `tested_buffer_pct` are shared
    /// with the position evaluator so both agree on what is tested or late.
    #[must_use]
    pub const fn new(config: RollConfig, management_dte: i64, tested_buffer_pct: Decimal) -> Self {
        Self {
            config,
            management_dte,
            tested_buffer_pct,
        }
    }

    /// Tunables in use.
    #[must_use]
    pub const fn config(&self) -> &RollConfig {
        &self.config
    }

    /// Whether to roll, and which kind.
    #[must_use]
    pub fn advisability(
        &self,
        position: &Position,
        underlying_price: Option<Decimal>,
        today: NaiveDate,
    ) -> Advisability {
        let cfg = &self.config;
        let dte = position.dte(today);
        let pnl_pct = position.pnl_pct();
        let tested = underlying_price.and_then(|p| position.tested_side(p, self.tested_buffer_pct));

        if dte <= 0 {
            return Advisability::Close {
                reason: format!("{dte} DTE, expiring"),
            };
        }

        if dte <= cfg.late_dte && tested.is_none() && pnl_pct >= cfg.late_profit_pct {
            return Advisability::Close {
                reason: format!("{dte} DTE untested with P/L {pnl_pct:.1}%, take it"),
            };
        }

        if tested.is_some() {
            return Advisability::Roll(RollType::Defensive);
        }

        if dte <= self.management_dte {
            return Advisability::Roll(RollType::Management);
        }

        if pnl_pct >= cfg.profit_close_pct {
            return Advisability::Close {
                reason: format!("P/L {pnl_pct:.1}% already past {}%", cfg.profit_close_pct),
            };
        }

        Advisability::Roll(RollType::Standard)
    }

    /// DTE band searched for a roll type.
    #[must_use]
    pub const fn band(&self, roll_type: RollType) -> DteBand {
        match roll_type {
            RollType::Defensive => self.config.defensive_band,
            RollType::Management => self.config.management_band,
            RollType::Standard => self.config.standard_band,
        }
    }

    /// Short-strike |delta| target for a roll type.
    #[must_use]
    pub const fn target_delta(&self, roll_type: RollType) -> Decimal {
        match roll_type {
            RollType::Defensive => self.config.defensive_delta,
            RollType::Management | RollType::Standard => self.config.standard_delta,
        }
    }

    /// Every buildable candidate in the band, in expiration order.
    #[must_use]
    pub fn candidates(
        &self,
        position: &Position,
        roll_type: RollType,
        ctx: &RollContext<'_>,
    ) -> Vec<RollCandidate> {
        let Some(chain) = ctx.chain else {
            return Vec::new();
        };

        let band = self.band(roll_type);
        let current_theta = current_theta(position, chain);

        chain
            .within_dte(ctx.today, band.min, band.max)
            .into_iter()
            .filter_map(|expiration| {
                self.build_candidate(position, roll_type, expiration, current_theta, ctx)
            })
            .collect()
    }

    /// Highest-scoring candidate; the earliest wins ties.
    #[must_use]
    pub fn best_candidate(candidates: Vec<RollCandidate>) -> Option<RollCandidate> {
        candidates.into_iter().fold(None, |best, candidate| match best {
            Some(b) if candidate.score <= b.score => Some(b),
            _ => Some(candidate),
        })
    }

    /// Advisability, search, selection and debit guards in one call.
    #[must_use]
    pub fn analyze(&self, position: &Position, ctx: &RollContext<'_>) -> RollRecommendation {
        let roll_type = match self.advisability(position, ctx.underlying_price, ctx.today) {
            Advisability::Close { reason } => return RollRecommendation::Close { reason },
            Advisability::Roll(roll_type) => roll_type,
        };

        let candidates = self.candidates(position, roll_type, ctx);
        let considered = candidates.len();
        let Some(candidate) = Self::best_candidate(candidates) else {
            return RollRecommendation::Close {
                reason: format!("no {roll_type} roll candidate available"),
            };
        };

        tracing::debug!(
            symbol = %position.symbol,
            roll_type = %roll_type,
            considered,
            expiration = %candidate.expiration,
            score = %candidate.score,
            "Selected roll candidate"
        );

        let debit = -candidate.net_credit;
        let original = position.basis();
        let limit_pct = if roll_type == RollType::Defensive {
            self.config.defensive_max_debit_pct
        } else {
            self.config.max_debit_pct
        };

        if debit > Decimal::ZERO && debit > original * limit_pct / Decimal::ONE_HUNDRED {
            return RollRecommendation::Close {
                reason: format!(
                    "{roll_type} roll needs {debit} debit, above {limit_pct}% of {original}"
                ),
            };
        }

        let reason = format!(
            "{roll_type} roll to {} ({} DTE) for net {}",
            candidate.expiration, candidate.dte, candidate.net_credit
        );
        RollRecommendation::Roll {
            roll_type,
            candidate,
            reason,
        }
    }

    fn build_candidate(
        &self,
        position: &Position,
        roll_type: RollType,
        expiration: &ChainExpiration,
        current_theta: Decimal,
        ctx: &RollContext<'_>,
    ) -> Option<RollCandidate> {
        let delta = self.target_delta(roll_type);
        let mult = position.multiplier;

        let mut shorts: Vec<(OptionRight, Decimal, Decimal)> = Vec::new();
        let mut legs = Vec::with_capacity(position.legs.len());
        let mut replacement_credit = Decimal::ZERO;
        let mut projected_delta = Decimal::ZERO;
        let mut projected_theta = Decimal::ZERO;

        for leg in position.short_legs() {
            let quote = expiration.find_by_delta(leg.right, delta)?;
            shorts.push((leg.right, leg.strike, quote.strike));
            legs.push(OptionLeg::new(leg.right, quote.strike, expiration.expiration, leg.quantity));
            replacement_credit -= leg.signed_quantity() * quote.mid() * mult;
            projected_delta += quote.delta * leg.signed_quantity() * mult;
            projected_theta += quote.theta * leg.signed_quantity() * mult;
        }

        for leg in position.legs.iter().filter(|l| l.is_long()) {
            // Wings keep their distance from the short strike they protect.
            let target = shorts
                .iter()
                .find(|(right, _, _)| *right == leg.right)
                .map_or(leg.strike, |(_, old_short, new_short)| {
                    new_short + (leg.strike - old_short)
                });
            let quote = expiration
                .find_strike(leg.right, target)
                .or_else(|| expiration.nearest_strike(leg.right, target))?;
            legs.push(OptionLeg::new(leg.right, quote.strike, expiration.expiration, leg.quantity));
            replacement_credit -= leg.signed_quantity() * quote.mid() * mult;
            projected_delta += quote.delta * leg.signed_quantity() * mult;
            projected_theta += quote.theta * leg.signed_quantity() * mult;
        }

        if legs.is_empty() {
            return None;
        }

        let closing_cost = position.closing_value()?;
        let net_credit = replacement_credit.checked_sub(closing_cost)?;
        let new_width = spread_width(&legs);
        let width_change = new_width - position.width();

        let added_days = position
            .expiration()
            .map_or(0, |current| (expiration.expiration - current).num_days());
        let credit_per_day = if added_days > 0 {
            net_credit / Decimal::from(added_days)
        } else {
            Decimal::ZERO
        };

        let has_wings = legs.iter().any(OptionLeg::is_long);
        let max_risk = if position.strategy.is_undefined_risk() || !has_wings {
            replacement_credit * dec!(3)
        } else {
            new_width * mult * Decimal::from(position.quantity()) - replacement_credit
        };
        let risk_reward = if max_risk > Decimal::ZERO {
            replacement_credit.checked_div(max_risk).unwrap_or(Decimal::ZERO)
        } else {
            Decimal::ZERO
        };

        let distance_pct = ctx.underlying_price.map_or(Decimal::ZERO, |price| {
            strike_distance_pct(legs.iter().filter(|l| l.is_short()), price)
        });

        let dte = expiration.dte(ctx.today);
        let mut candidate = RollCandidate {
            expiration: expiration.expiration,
            dte,
            legs,
            replacement_credit,
            closing_cost,
            net_credit,
            projected_delta,
            projected_theta,
            width_change,
            cost_benefit: CostBenefit {
                added_days,
                incremental_theta: projected_theta - current_theta,
                credit_per_day,
            },
            risk_reward,
            score: Decimal::ZERO,
        };
        candidate.score = self.score(&candidate, position.basis(), distance_pct, ctx.volatility);
        Some(candidate)
    }

    /// Composite score of a candidate.
    #[must_use]
    pub fn score(
        &self,
        candidate: &RollCandidate,
        original_credit: Decimal,
        distance_pct: Decimal,
        volatility: Option<Decimal>,
    ) -> Decimal {
        let cfg = &self.config;
        let mut score = Decimal::ZERO;

        if original_credit > Decimal::ZERO {
            let ratio = candidate
                .net_credit
                .abs()
                .checked_div(original_credit)
                .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
                .unwrap_or(Decimal::MAX);
            if candidate.net_credit >= Decimal::ZERO {
                score += ratio.min(dec!(30));
            } else {
                score -= ratio.min(dec!(50));
            }
        }

        score -= Decimal::from((candidate.dte - cfg.ideal_dte).abs());

        if candidate.risk_reward > dec!(0.3) {
            let bonus = (candidate.risk_reward - dec!(0.3))
                .checked_mul(dec!(50))
                .unwrap_or(Decimal::MAX);
            score += bonus.min(dec!(20));
        }

        if candidate.projected_theta > Decimal::ZERO {
            score += candidate.projected_theta.min(dec!(20));
        }

        score += match volatility {
            Some(level) if level >= cfg.high_volatility => distance_pct.min(dec!(15)),
            Some(level) if level < cfg.low_volatility => dec!(5),
            _ => (distance_pct * dec!(0.5)).min(dec!(7.5)),
        };

        let added = Decimal::from(candidate.cost_benefit.added_days.max(0));
        score += (added * dec!(0.2)).min(dec!(10));

        score
    }
}

/// Theta of the current legs from the chain, zero where not quoted.
fn current_theta(position: &Position, chain: &OptionChain) -> Decimal {
    position
        .legs
        .iter()
        .filter_map(|leg| {
            chain
                .expiration(leg.expiration)
                .and_then(|e| e.find_strike(leg.right, leg.strike))
                .map(|q| q.theta * leg.signed_quantity() * position.multiplier)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::chain_fixtures::chain;
    use crate::domain::position::fixtures::{date, iron_condor, strangle};
    use chrono::Duration;
    use test_case::test_case;

    fn today() -> NaiveDate {
        date(2026, 10, 19)
    }

    fn analyzer() -> RollAnalyzer {
        RollAnalyzer::new(RollConfig::default(), 21, dec!(2))
    }

    fn in_days(days: i64) -> NaiveDate {
        today() + Duration::days(days)
    }

    fn ctx(chain: Option<&OptionChain>, price: Decimal) -> RollContext<'_> {
        RollContext {
            underlying_price: Some(price),
            volatility: None,
            chain,
            today: today(),
        }
    }

    #[test_case(0, dec!(0), dec!(400) => None ; "expiring closes")]
    #[test_case(5, dec!(120), dec!(400) => None ; "late untested profit closes")]
    #[test_case(30, dec!(-100), dec!(385) => Some(RollType::Defensive) ; "tested is defensive")]
    #[test_case(5, dec!(120), dec!(385) => Some(RollType::Defensive) ; "late but tested")]
    #[test_case(15, dec!(40), dec!(400) => Some(RollType::Management) ; "inside management window")]
    #[test_case(40, dec!(240), dec!(400) => None ; "profit already past half")]
    #[test_case(40, dec!(40), dec!(400) => Some(RollType::Standard) ; "standard")]
    fn advisability(dte: i64, pnl: Decimal, price: Decimal) -> Option<RollType> {
        let pos = strangle(in_days(dte), dec!(400), pnl);
        match analyzer().advisability(&pos, Some(price), today()) {
            Advisability::Roll(roll_type) => Some(roll_type),
            Advisability::Close { .. } => None,
        }
    }

    #[test]
    fn management_roll_prefers_dte_near_ideal() {
        let pos = strangle(in_days(15), dec!(400), dec!(40));
        let c = chain("SPY", dec!(400), &[in_days(35), in_days(50), in_days(58)]);

        let candidates = analyzer().candidates(&pos, RollType::Management, &ctx(Some(&c), dec!(400)));
        assert_eq!(candidates.len(), 2);

        let best = RollAnalyzer::best_candidate(candidates).unwrap();
        assert_eq!(best.expiration, in_days(50));
        assert_eq!(best.dte, 50);
        // 0.20 delta ties resolve to the first listed strike: 360 put, 435 call.
        assert_eq!(best.legs[0].strike, dec!(360));
        assert_eq!(best.legs[1].strike, dec!(435));
        assert_eq!(best.replacement_credit, dec!(525));
        assert_eq!(best.closing_cost, dec!(360));
        assert_eq!(best.net_credit, dec!(165));
        assert_eq!(best.cost_benefit.added_days, 35);
        assert!(best.projected_theta > Decimal::ZERO);
    }

    #[test]
    fn analyze_rolls_management_position() {
        let pos = strangle(in_days(15), dec!(400), dec!(40));
        let c = chain("SPY", dec!(400), &[in_days(50)]);
        match analyzer().analyze(&pos, &ctx(Some(&c), dec!(400))) {
            RollRecommendation::Roll {
                roll_type,
                candidate,
                ..
            } => {
                assert_eq!(roll_type, RollType::Management);
                assert_eq!(candidate.expiration, in_days(50));
            }
            RollRecommendation::Close { reason } => panic!("expected roll, got close: {reason}"),
        }
    }

    #[test]
    fn missing_or_empty_chain_closes() {
        let pos = strangle(in_days(15), dec!(400), dec!(40));
        assert!(matches!(
            analyzer().analyze(&pos, &ctx(None, dec!(400))),
            RollRecommendation::Close { .. }
        ));

        // Nothing inside the 45-60 band.
        let c = chain("SPY", dec!(400), &[in_days(30), in_days(90)]);
        assert!(matches!(
            analyzer().analyze(&pos, &ctx(Some(&c), dec!(400))),
            RollRecommendation::Close { .. }
        ));
    }

    #[test]
    fn large_debit_closes_non_defensive_roll() {
        let c = chain("SPY", dec!(400), &[in_days(50)]);

        // Closing 600 vs 525 replacement: 75 debit is 18.75% of 400.
        let modest = strangle(in_days(15), dec!(400), dec!(-200));
        assert!(matches!(
            analyzer().analyze(&modest, &ctx(Some(&c), dec!(400))),
            RollRecommendation::Roll { .. }
        ));

        // Closing 700: 175 debit is 43.75% of 400.
        let heavy = strangle(in_days(15), dec!(400), dec!(-300));
        assert!(matches!(
            analyzer().analyze(&heavy, &ctx(Some(&c), dec!(400))),
            RollRecommendation::Close { .. }
        ));
    }

    #[test]
    fn defensive_roll_allows_debit_up_to_ceiling() {
        let c = chain("SPY", dec!(400), &[in_days(40)]);

        // Defensive 0.16 delta: 355 put and 440 call, 435 credit.
        // Closing 800 -> 365 debit, 91.25% of credit.
        let tested = strangle(in_days(30), dec!(400), dec!(-400));
        match analyzer().analyze(&tested, &ctx(Some(&c), dec!(385))) {
            RollRecommendation::Roll {
                roll_type,
                candidate,
                ..
            } => {
                assert_eq!(roll_type, RollType::Defensive);
                assert_eq!(candidate.legs[0].strike, dec!(355));
                assert_eq!(candidate.legs[1].strike, dec!(440));
                assert_eq!(candidate.net_credit, dec!(-365));
            }
            RollRecommendation::Close { reason } => panic!("expected roll, got close: {reason}"),
        }

        // Closing 900 -> 465 debit, beyond 100% of credit.
        let blown = strangle(in_days(30), dec!(400), dec!(-500));
        assert!(matches!(
            analyzer().analyze(&blown, &ctx(Some(&c), dec!(385))),
            RollRecommendation::Close { .. }
        ));
    }

    #[test]
    fn condor_wings_keep_width() {
        let pos = iron_condor(in_days(40), dec!(250), dec!(25));
        let c = chain("QQQ", dec!(400), &[in_days(45)]);
        let candidates = analyzer().candidates(&pos, RollType::Standard, &ctx(Some(&c), dec!(400)));
        let best = RollAnalyzer::best_candidate(candidates).unwrap();

        let strikes: Vec<Decimal> = best.legs.iter().map(|l| l.strike).collect();
        assert_eq!(strikes, vec![dec!(360), dec!(435), dec!(350), dec!(445)]);
        assert_eq!(best.width_change, Decimal::ZERO);
        // (2.40 - 1.50) + (2.85 - 1.95) per share
        assert_eq!(best.replacement_credit, dec!(180));
        assert_eq!(best.risk_reward, dec!(180) / dec!(820));
    }

    #[test]
    fn ties_keep_first_candidate() {
        let pos = strangle(in_days(15), dec!(400), dec!(40));
        let c = chain("SPY", dec!(400), &[in_days(50)]);
        let mut candidates = analyzer().candidates(&pos, RollType::Management, &ctx(Some(&c), dec!(400)));
        let mut twin = candidates[0].clone();
        twin.dte = 99;
        candidates.push(twin);

        let best = RollAnalyzer::best_candidate(candidates).unwrap();
        assert_eq!(best.dte, 50);
    }

    #[test]
    fn volatility_regimes_score_distance_differently() {
        let pos = strangle(in_days(15), dec!(400), dec!(40));
        let c = chain("SPY", dec!(400), &[in_days(50)]);
        let candidate = analyzer()
            .candidates(&pos, RollType::Management, &ctx(Some(&c), dec!(400)))
            .remove(0);

        let a = analyzer();
        let high = a.score(&candidate, dec!(400), dec!(9.375), Some(dec!(30)));
        let normal = a.score(&candidate, dec!(400), dec!(9.375), Some(dec!(20)));
        let low = a.score(&candidate, dec!(400), dec!(9.375), Some(dec!(12)));
        let unknown = a.score(&candidate, dec!(400), dec!(9.375), None);

        assert_eq!(high - normal, dec!(9.375) - dec!(4.6875));
        assert_eq!(low - normal, dec!(5) - dec!(4.6875));
        assert_eq!(unknown, normal);
    }

    #[test]
    fn tiny_original_credit_caps_instead_of_overflowing() {
        let pos = strangle(in_days(15), dec!(400), dec!(40));
        let c = chain("SPY", dec!(400), &[in_days(50)]);
        let mut candidate = analyzer()
            .candidates(&pos, RollType::Management, &ctx(Some(&c), dec!(400)))
            .remove(0);
        candidate.net_credit = dec!(200);
        candidate.risk_reward = Decimal::MAX;

        let a = analyzer();
        let tiny = a.score(&candidate, Decimal::new(1, 28), dec!(5), None);
        let normal = a.score(&candidate, dec!(400), dec!(5), None);
        assert_eq!(tiny, normal);
    }
}

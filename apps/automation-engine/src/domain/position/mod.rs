//! Option Position Module
//!
//! Position snapshots as supplied by the position source, plus the derived
//! fields (DTE, P/L%, tested side, width) every evaluator works from.

mod leg;
mod snapshot;
mod strategy;

pub use leg::{OptionLeg, OptionRight};
pub use snapshot::{Position, spread_width, strike_distance_pct};
pub use strategy::StrategyKind;

#[cfg(test)]
pub(crate) use snapshot::fixtures;

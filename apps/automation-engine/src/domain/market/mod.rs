//! Market Data Module
//!
//! Account balances, quotes, option chains, and the per-cycle market
//! conditions snapshot built from them.

mod account;
mod chain;
mod conditions;
mod quote;

pub use account::AccountSnapshot;
pub use chain::{ChainExpiration, OptionChain, StrikeQuote};
pub use conditions::{CorrelationGroups, MarketConditions, RegimeThresholds, Trend, VolatilityRegime};
pub use quote::Quote;

#[cfg(test)]
pub(crate) use chain::fixtures as chain_fixtures;

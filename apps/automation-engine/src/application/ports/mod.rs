//! Application Ports (Driven)
//!
//! Interfaces the engine consumes. Every data port is async; the clock is
//! synchronous.

mod clock_port;
mod market_data_port;
mod order_preparation_port;
mod position_source_port;

pub use clock_port::Clock;
pub use market_data_port::{OptionChainError, OptionChainPort, QuoteError, QuoteSourcePort};
#[cfg(test)]
pub use order_preparation_port::MockOrderPreparationPort;
pub use order_preparation_port::{
    IntentPurpose, OrderIntent, OrderPreparationError, OrderPreparationPort, RollIntent,
    RollRequest, StrikeRequest, StrikeSelection, closing_legs,
};
pub use position_source_port::{
    AccountSourceError, AccountSourcePort, PositionSourceError, PositionSourcePort,
};

//! Domain Layer
//!
//! Business types and rules with no I/O. Everything here is synchronous and
//! takes explicit timestamps so it can be exercised deterministically.
//!
//! # Bounded Contexts
//!
//! - [`position`]: Option position snapshots and derived fields
//! - [`market`]: Account, quotes, option chains, market conditions
//! - [`action`]: Pending actions, priority queue, executed-action registry
//! - [`events`]: Events published to subscribers

pub mod action;
pub mod events;
pub mod market;
pub mod position;
pub mod shared;

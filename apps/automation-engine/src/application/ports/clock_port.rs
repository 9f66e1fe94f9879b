//! Clock Port
//!
//! Wall-clock source, injectable so cadence-independent logic (cool-downs,
//! day rollover, weekday gating) can be driven deterministically.

use chrono::{DateTime, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

//! Infrastructure Layer
//!
//! Adapters for the ports defined in the application layer:
//!
//! - `clock`: system and manual clocks
//! - `paper/`: in-memory portfolio, market data and intent-recording order desk
//! - `snapshot`: JSON portfolio snapshots that seed the paper venue

pub mod clock;
pub mod paper;
pub mod snapshot;

pub use clock::{ManualClock, SystemClock};
pub use paper::PaperVenue;
pub use snapshot::{PortfolioSnapshot, SnapshotError};

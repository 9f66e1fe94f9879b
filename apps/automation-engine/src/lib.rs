// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Automation Engine - Rust Core Library
//!
//! Automated management of an option portfolio: watches open positions,
//! raises prioritized management and protective actions, detects
//! portfolio-wide emergencies, scores rolls, and scans for new entries.
//!
//! # Architecture (Hexagonal)
//!
//! - **Domain**: positions, market snapshots, pending actions, the action
//!   queue and engine events. No I/O.
//! - **Application**: ports for the outside world (positions, account,
//!   quotes, option chains, order preparation, clock) and the services that
//!   evaluate, analyze, execute and schedule.
//! - **Infrastructure**: paper adapters, clocks and snapshot loading.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use automation_engine::{AutomationEngine, Config, PaperVenue, SystemClock};
//!
//! let venue = PaperVenue::new(positions, account, Arc::new(SystemClock));
//! let engine = AutomationEngine::new(Config::default(), venue.collaborators())?;
//! let mut events = engine.subscribe();
//! engine.start()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Layers
// =============================================================================

/// Domain layer - Positions, actions and events with no external dependencies.
pub mod domain;

/// Application layer - Ports and services.
pub mod application;

/// Infrastructure layer - Paper adapters and clocks.
pub mod infrastructure;

/// YAML configuration.
pub mod config;

/// Logging and metrics.
pub mod observability;

// =============================================================================
// Re-exports
// =============================================================================

pub use application::services::{
    AutomationEngine, Collaborators, EngineError, EngineStatus, TickError, TickReport,
};
pub use config::{Config, ConfigError, load_config, load_config_from_string};
pub use domain::action::{ActionType, PendingAction};
pub use domain::events::AutomationEvent;
pub use infrastructure::{ManualClock, PaperVenue, PortfolioSnapshot, SystemClock};

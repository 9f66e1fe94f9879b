//! Action Queue Module
//!
//! Pending remediation and entry actions, the de-duplicating priority queue
//! they wait in, and the registry of recent executions that keeps a position
//! from being acted on twice inside the cool-down window.

mod pending;
mod queue;
mod registry;

pub use pending::{
    ActionKey, ActionTarget, ActionType, ActionVerb, EntryIntent, ExecutionKey, PendingAction,
    execution_key_for,
};
pub use queue::{ActionQueue, EnqueueOutcome};
pub use registry::{DEFAULT_COOLDOWN_SECS, ExecutedRegistry};

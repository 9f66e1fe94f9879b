//! Priority action queue.
//!
//! Pending actions live in a map keyed by (symbol, strike, type) so inserts
//! de-duplicate in O(1). Ordering is applied on drain: the queue is
//! snapshotted, cleared, and the snapshot sorted by (priority, sequence).

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use super::{ActionKey, ExecutedRegistry, ExecutionKey, PendingAction};

/// Result of [`ActionQueue::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Added to the queue.
    Queued,
    /// An action with the same key is already queued.
    Duplicate,
    /// The target executed within the cool-down window.
    CoolingDown,
}

/// Pending actions plus the executed-action registry.
#[derive(Debug, Clone, Default)]
pub struct ActionQueue {
    pending: HashMap<ActionKey, PendingAction>,
    next_sequence: u64,
    executed: ExecutedRegistry,
}

impl ActionQueue {
    /// Create a queue with the given cool-down window.
    #[must_use]
    pub fn new(cooldown: Duration) -> Self {
        Self {
            pending: HashMap::new(),
            next_sequence: 0,
            executed: ExecutedRegistry::new(cooldown),
        }
    }

    /// Insert an action unless it duplicates a queued one or its target is
    /// cooling down for this action type.
    pub fn enqueue(&mut self, mut action: PendingAction, now: DateTime<Utc>) -> EnqueueOutcome {
        if self.executed.blocks(&action.execution_key(), action.action_type, now) {
            return EnqueueOutcome::CoolingDown;
        }

        let key = action.key();
        if self.pending.contains_key(&key) {
            return EnqueueOutcome::Duplicate;
        }

        action.sequence = self.next_sequence;
        self.next_sequence += 1;
        self.pending.insert(key, action);
        EnqueueOutcome::Queued
    }

    /// Put a failed action back, keeping its original sequence.
    ///
    /// Returns false if an action with the same key was queued meanwhile.
    pub fn requeue(&mut self, action: PendingAction) -> bool {
        let key = action.key();
        if self.pending.contains_key(&key) {
            return false;
        }
        self.pending.insert(key, action);
        true
    }

    /// Remove every pending action, most urgent first.
    ///
    /// Equal priorities keep insertion order.
    pub fn take_sorted(&mut self) -> Vec<PendingAction> {
        let mut snapshot: Vec<PendingAction> = self.pending.drain().map(|(_, a)| a).collect();
        snapshot.sort_by_key(|a| (a.priority, a.sequence));
        snapshot
    }

    /// Record a successful execution.
    pub fn mark_executed(&mut self, action: &PendingAction, now: DateTime<Utc>) {
        self.executed.mark(action.execution_key(), action.action_type, now);
    }

    /// Whether `key` is inside its cool-down window.
    #[must_use]
    pub fn is_cooling_down(&self, key: &ExecutionKey, now: DateTime<Utc>) -> bool {
        self.executed.is_cooling_down(key, now)
    }

    /// Number of executions still cooling down.
    #[must_use]
    pub fn cooling_down_count(&self, now: DateTime<Utc>) -> usize {
        self.executed.active_count(now)
    }

    /// Drop expired executed marks.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        self.executed.prune(now)
    }

    /// Number of queued actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

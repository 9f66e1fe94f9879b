//! Executed-action registry with self-expiring cool-down marks.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use super::{ActionType, ExecutionKey};

/// Default cool-down after an execution (seconds).
pub const DEFAULT_COOLDOWN_SECS: i64 = 3600;

#[derive(Debug, Clone, Copy)]
struct Mark {
    at: DateTime<Utc>,
    emergency: bool,
}

/// Remembers when each (symbol, strike, expiration) last executed.
///
/// A mark left by a regular action blocks further regular actions on the
/// key but not an emergency close. A mark left by an emergency close blocks
/// everything.
#[derive(Debug, Clone)]
pub struct ExecutedRegistry {
    executed: HashMap<ExecutionKey, Mark>,
    cooldown: Duration,
}

impl Default for ExecutedRegistry {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_COOLDOWN_SECS))
    }
}

impl ExecutedRegistry {
    /// Create a registry with the given cool-down window.
    #[must_use]
    pub fn new(cooldown: Duration) -> Self {
        Self {
            executed: HashMap::new(),
            cooldown,
        }
    }

    /// Record an execution of `action_type` at `now`.
    pub fn mark(&mut self, key: ExecutionKey, action_type: ActionType, now: DateTime<Utc>) {
        let emergency = action_type.is_emergency()
            || self
                .executed
                .get(&key)
                .is_some_and(|m| m.emergency && now - m.at < self.cooldown);
        self.executed.insert(key, Mark { at: now, emergency });
    }

    /// Whether `key` executed less than one cool-down ago.
    #[must_use]
    pub fn is_cooling_down(&self, key: &ExecutionKey, now: DateTime<Utc>) -> bool {
        self.active(key, now).is_some()
    }

    /// Whether a new action of `action_type` on `key` is still suppressed.
    #[must_use]
    pub fn blocks(&self, key: &ExecutionKey, action_type: ActionType, now: DateTime<Utc>) -> bool {
        self.active(key, now)
            .is_some_and(|m| m.emergency || !action_type.is_emergency())
    }

    fn active(&self, key: &ExecutionKey, now: DateTime<Utc>) -> Option<&Mark> {
        self.executed.get(key).filter(|m| now - m.at < self.cooldown)
    }

    /// Number of marks still inside the window.
    #[must_use]
    pub fn active_count(&self, now: DateTime<Utc>) -> usize {
        self.executed
            .values()
            .filter(|m| now - m.at < self.cooldown)
            .count()
    }

    /// Drop expired marks, returning how many were removed.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.executed.len();
        let cooldown = self.cooldown;
        self.executed.retain(|_, m| now - m.at < cooldown);
        before - self.executed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::Symbol;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn key() -> ExecutionKey {
        ExecutionKey {
            symbol: Symbol::new("SPY"),
            strike: dec!(380),
            expiration: chrono::NaiveDate::from_ymd_opt(2026, 11, 20),
        }
    }

    #[test]
    fn mark_expires_after_cooldown() {
        let t0 = Utc.with_ymd_and_hms(2026, 10, 19, 14, 0, 0).unwrap();
        let mut registry = ExecutedRegistry::default();
        registry.mark(key(), ActionType::StopLoss, t0);

        assert!(registry.is_cooling_down(&key(), t0 + Duration::minutes(59)));
        assert_eq!(registry.active_count(t0 + Duration::minutes(59)), 1);
        assert!(!registry.is_cooling_down(&key(), t0 + Duration::minutes(60)));
        assert_eq!(registry.active_count(t0 + Duration::minutes(60)), 0);
    }

    #[test]
    fn prune_removes_only_expired() {
        let t0 = Utc.with_ymd_and_hms(2026, 10, 19, 14, 0, 0).unwrap();
        let mut registry = ExecutedRegistry::new(Duration::seconds(60));
        registry.mark(key(), ActionType::CloseProfit, t0);
        let mut other = key();
        other.strike = dec!(420);
        registry.mark(other.clone(), ActionType::CloseProfit, t0 + Duration::seconds(45));

        assert_eq!(registry.prune(t0 + Duration::seconds(90)), 1);
        assert!(registry.is_cooling_down(&other, t0 + Duration::seconds(90)));
    }

    #[test]
    fn regular_mark_lets_emergency_close_through() {
        let t0 = Utc.with_ymd_and_hms(2026, 10, 19, 14, 0, 0).unwrap();
        let mut registry = ExecutedRegistry::default();
        registry.mark(key(), ActionType::ManageTested, t0);

        let later = t0 + Duration::minutes(10);
        assert!(registry.blocks(&key(), ActionType::StopLoss, later));
        assert!(!registry.blocks(&key(), ActionType::EmergencyClose, later));
    }

    #[test]
    fn emergency_mark_blocks_everything_and_survives_later_marks() {
        let t0 = Utc.with_ymd_and_hms(2026, 10, 19, 14, 0, 0).unwrap();
        let mut registry = ExecutedRegistry::default();
        registry.mark(key(), ActionType::EmergencyClose, t0);
        registry.mark(key(), ActionType::CloseProfit, t0 + Duration::minutes(1));

        let later = t0 + Duration::minutes(10);
        assert!(registry.blocks(&key(), ActionType::EmergencyClose, later));
        assert!(registry.blocks(&key(), ActionType::Manage21Dte, later));
        assert!(!registry.blocks(&key(), ActionType::EmergencyClose, t0 + Duration::minutes(62)));
    }
}

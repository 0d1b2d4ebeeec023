//! Accrual task scheduler
//!
//! Deferred interest accruals are explicit state, not side effects. Each
//! open position holds at most one task, keyed by owner and collateral,
//! and the driver asks for everything due at a given time.

use std::collections::BTreeMap;

use borsh::{BorshDeserialize, BorshSerialize};

use crate::asset::{AccountId, SymbolCode};

/// Identity of one scheduled accrual
#[derive(
    BorshDeserialize, BorshSerialize, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd,
)]
pub struct TaskKey {
    pub user: AccountId,
    pub collateral: SymbolCode,
}

impl TaskKey {
    pub fn new(user: AccountId, collateral: SymbolCode) -> Self {
        TaskKey { user, collateral }
    }
}

/// Pending accruals, one per position
#[derive(BorshDeserialize, BorshSerialize, Clone, Debug, Default)]
pub struct AccrualScheduler {
    /// Due time per task key
    tasks: BTreeMap<TaskKey, i64>,
}

impl AccrualScheduler {
    pub fn new() -> Self {
        AccrualScheduler::default()
    }

    /// Schedule a task, replacing any earlier one for the same key
    pub fn schedule(&mut self, key: TaskKey, due: i64) {
        self.tasks.insert(key, due);
    }

    /// Drop the task for a key, if any. Returns whether one existed.
    pub fn cancel(&mut self, key: &TaskKey) -> bool {
        self.tasks.remove(key).is_some()
    }

    pub fn contains(&self, key: &TaskKey) -> bool {
        self.tasks.contains_key(key)
    }

    /// Due time of the pending task for a key
    pub fn pending(&self, key: &TaskKey) -> Option<i64> {
        self.tasks.get(key).copied()
    }

    /// Every task due at or before `now`, earliest first
    pub fn due_tasks(&self, now: i64) -> Vec<TaskKey> {
        let mut due: Vec<(i64, &TaskKey)> = self
            .tasks
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(key, at)| (*at, key))
            .collect();
        due.sort();
        due.into_iter().map(|(_, key)| key.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(user: &str, code: &str) -> TaskKey {
        TaskKey::new(
            AccountId::new(user),
            SymbolCode::new(code).unwrap(),
        )
    }

    #[test]
    fn schedule_replaces_existing_task() {
        let mut scheduler = AccrualScheduler::new();
        scheduler.schedule(key("alice", "ZIG"), 100);
        scheduler.schedule(key("alice", "ZIG"), 200);

        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.pending(&key("alice", "ZIG")), Some(200));
    }

    #[test]
    fn due_tasks_sorted_by_due_time() {
        let mut scheduler = AccrualScheduler::new();
        scheduler.schedule(key("carol", "ZIG"), 300);
        scheduler.schedule(key("alice", "ZIG"), 200);
        scheduler.schedule(key("bob", "BTC"), 100);

        assert_eq!(scheduler.due_tasks(50), Vec::<TaskKey>::new());
        assert_eq!(
            scheduler.due_tasks(200),
            vec![key("bob", "BTC"), key("alice", "ZIG")]
        );
        assert_eq!(scheduler.due_tasks(1_000).len(), 3);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut scheduler = AccrualScheduler::new();
        scheduler.schedule(key("alice", "ZIG"), 100);

        assert!(scheduler.cancel(&key("alice", "ZIG")));
        assert!(!scheduler.cancel(&key("alice", "ZIG")));
        assert!(scheduler.is_empty());
    }
}

//! Per-task async locks.
//!
//! A mutation holds the locks of every task it writes from its optimistic
//! patch until the remote answers, so two mutations touching the same task
//! resolve one after the other while unrelated tasks proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::OwnedMutexGuard;

use taskboard_proto::task::TaskId;

type Slots = parking_lot::Mutex<HashMap<TaskId, Arc<tokio::sync::Mutex<()>>>>;

/// Table of per-task locks. Entries exist only while someone holds or
/// waits for them.
#[derive(Debug, Default)]
pub struct LockTable {
    slots: Arc<Slots>,
}

impl LockTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the locks of every id in `ids`.
    ///
    /// Locks are taken in sorted id order, so two callers with overlapping
    /// sets never deadlock.
    pub async fn acquire(&self, ids: &[TaskId]) -> LockSet {
        let mut sorted = ids.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut guards = Vec::with_capacity(sorted.len());
        for id in &sorted {
            let slot = Arc::clone(self.slots.lock().entry(*id).or_default());
            guards.push(slot.lock_owned().await);
        }

        LockSet {
            ids: sorted,
            guards,
            slots: Arc::clone(&self.slots),
        }
    }

    /// Number of ids with a live lock entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Returns `true` if no lock is held or awaited.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

/// Held locks. Released on drop.
#[derive(Debug)]
pub struct LockSet {
    ids: Vec<TaskId>,
    guards: Vec<OwnedMutexGuard<()>>,
    slots: Arc<Slots>,
}

impl LockSet {
    /// Returns `true` if every id in `ids` is covered by this set.
    #[must_use]
    pub fn covers(&self, ids: &[TaskId]) -> bool {
        ids.iter().all(|id| self.ids.binary_search(id).is_ok())
    }

    /// The locked ids, sorted.
    #[must_use]
    pub fn ids(&self) -> &[TaskId] {
        &self.ids
    }
}

impl Drop for LockSet {
    fn drop(&mut self) {
        self.guards.clear();
        let mut slots = self.slots.lock();
        for id in &self.ids {
            if slots.get(id).is_some_and(|slot| Arc::strong_count(slot) == 1) {
                slots.remove(id);
            }
        }
    }
}

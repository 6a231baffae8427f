//! Lifecycle of a single mutation attempt.

use std::collections::VecDeque;
use std::fmt;

use taskboard_proto::task::TaskId;

use super::MutationError;

/// State of one mutation attempt.
///
/// Transitions: `Idle -> Pending -> Committed` or `Idle -> Pending ->
/// RolledBack`. Terminal states never change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    /// Created, nothing applied yet.
    Idle,
    /// Applied locally, waiting for the remote.
    Pending,
    /// Confirmed by the remote.
    Committed,
    /// Refused or failed; local state was restored.
    RolledBack,
}

impl MutationState {
    /// Whether moving from `self` to `next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Pending) | (Self::Pending, Self::Committed | Self::RolledBack)
        )
    }

    /// Returns `true` for `Committed` and `RolledBack`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack)
    }
}

/// The user action behind a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// New task.
    Create,
    /// Edit-save.
    Update,
    /// Task removal.
    Delete,
    /// Done checkbox.
    ToggleDone,
    /// Kanban drop.
    Move,
    /// Calendar drop.
    Reschedule,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::ToggleDone => "toggle",
            Self::Move => "move",
            Self::Reschedule => "reschedule",
        };
        f.write_str(label)
    }
}

/// One entry in the mutation log.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord {
    /// Monotonic attempt number.
    pub seq: u64,
    /// What the user did.
    pub kind: MutationKind,
    /// Every task the attempt wrote.
    pub task_ids: Vec<TaskId>,
    /// Current state.
    pub state: MutationState,
    /// Failure that caused a rollback.
    pub error: Option<MutationError>,
}

impl MutationRecord {
    /// A fresh record in [`MutationState::Idle`].
    #[must_use]
    pub const fn new(seq: u64, kind: MutationKind, task_ids: Vec<TaskId>) -> Self {
        Self {
            seq,
            kind,
            task_ids,
            state: MutationState::Idle,
            error: None,
        }
    }

    /// Moves to `next` if the transition is legal. Returns whether it was.
    pub fn advance(&mut self, next: MutationState) -> bool {
        if !self.state.can_transition_to(next) {
            tracing::warn!(
                seq = self.seq,
                from = ?self.state,
                to = ?next,
                "illegal mutation transition"
            );
            return false;
        }
        self.state = next;
        true
    }
}

/// Bounded log of recent mutation attempts, oldest first.
#[derive(Debug)]
pub struct MutationLog {
    records: VecDeque<MutationRecord>,
    capacity: usize,
}

impl MutationLog {
    /// Creates a log keeping at most `capacity` records.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a record, evicting the oldest when full.
    pub fn push(&mut self, record: MutationRecord) {
        if self.capacity == 0 {
            return;
        }
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Runs `f` on the record with `seq`, if it is still in the log.
    pub fn update(&mut self, seq: u64, f: impl FnOnce(&mut MutationRecord)) {
        if let Some(record) = self.records.iter_mut().find(|r| r.seq == seq) {
            f(record);
        }
    }

    /// Copy of every record, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<MutationRecord> {
        self.records.iter().cloned().collect()
    }

    /// Number of records whose state is [`MutationState::Pending`].
    #[must_use]
    pub fn pending(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.state == MutationState::Pending)
            .count()
    }
}

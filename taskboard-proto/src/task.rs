//! Task model types for Taskboard.
//!
//! Defines the task record held by the client-side store, the partial
//! [`TaskPatch`] used by optimistic updates, and the [`NewTask`] payload
//! sent to the remote authority on create.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::project::ProjectId;

/// Maximum allowed task title length in characters.
pub const MAX_TASK_TITLE_LENGTH: usize = 256;

/// Unique identifier for a task, based on UUID v7 for time-ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new time-ordered task identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `TaskId` from a plain integer. Handy for fixtures.
    #[must_use]
    pub const fn from_u128(n: u128) -> Self {
        Self(Uuid::from_u128(n))
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier of a user (assignee, current session user).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Create a new user identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the string representation of this user ID.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Workflow status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Parked, not yet planned.
    Backlog,
    /// Planned but not started.
    Todo,
    /// Actively being worked on.
    InProgress,
    /// Waiting for review.
    InReview,
    /// Being verified.
    Testing,
    /// Finished.
    Done,
    /// Abandoned.
    Cancelled,
    /// Cannot progress until something else happens.
    Blocked,
}

impl TaskStatus {
    /// Every status, in workflow order.
    pub const ALL: [Self; 8] = [
        Self::Backlog,
        Self::Todo,
        Self::InProgress,
        Self::InReview,
        Self::Testing,
        Self::Done,
        Self::Cancelled,
        Self::Blocked,
    ];

    /// Canonical upper-case name used by the remote API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Backlog => "BACKLOG",
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::InReview => "IN_REVIEW",
            Self::Testing => "TESTING",
            Self::Done => "DONE",
            Self::Cancelled => "CANCELLED",
            Self::Blocked => "BLOCKED",
        }
    }

    /// Whether the task counts as completed in reports.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status string did not name any known [`TaskStatus`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown task status: {0:?}")]
pub struct ParseStatusError(pub String);

impl FromStr for TaskStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

/// Task priority.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    /// Low priority.
    Low,
    /// Default priority.
    #[default]
    Medium,
    /// High priority.
    High,
    /// Drop everything.
    Urgent,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Urgent => write!(f, "urgent"),
        }
    }
}

/// A task record as held by the client-side store.
///
/// `order` positions the task inside its status group. Values need not be
/// contiguous; views break ties by `id` so rendering stays deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier.
    pub id: TaskId,
    /// Task title.
    pub title: String,
    /// Workflow status.
    pub status: TaskStatus,
    /// Priority.
    #[serde(default)]
    pub priority: Priority,
    /// Due date and time, if scheduled.
    #[serde(default)]
    pub due_date: Option<NaiveDateTime>,
    /// Owning project, if any.
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    /// Assigned user, if any.
    #[serde(default)]
    pub assignee_id: Option<UserId>,
    /// Position within the status group.
    #[serde(default)]
    pub order: i64,
    /// Hours logged against the task.
    #[serde(default)]
    pub hours: Option<f64>,
}

impl Task {
    /// Builds a task from a create payload and the identity handed out by
    /// the remote authority.
    #[must_use]
    pub fn from_new(id: TaskId, new: NewTask) -> Self {
        Self {
            id,
            title: new.title,
            status: new.status,
            priority: new.priority,
            due_date: new.due_date,
            project_id: new.project_id,
            assignee_id: new.assignee_id,
            order: new.order,
            hours: new.hours,
        }
    }

    /// Merges every field present in `patch` into this task.
    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(project_id) = patch.project_id {
            self.project_id = project_id;
        }
        if let Some(assignee_id) = &patch.assignee_id {
            self.assignee_id.clone_from(assignee_id);
        }
        if let Some(order) = patch.order {
            self.order = order;
        }
        if let Some(hours) = patch.hours {
            self.hours = hours;
        }
    }

    /// Returns a patch that would turn `self` back into `before` for every
    /// field `patch` touches.
    #[must_use]
    pub fn inverse_of(before: &Self, patch: &TaskPatch) -> TaskPatch {
        TaskPatch {
            title: patch.title.as_ref().map(|_| before.title.clone()),
            status: patch.status.map(|_| before.status),
            priority: patch.priority.map(|_| before.priority),
            due_date: patch.due_date.map(|_| before.due_date),
            project_id: patch.project_id.map(|_| before.project_id),
            assignee_id: patch.assignee_id.as_ref().map(|_| before.assignee_id.clone()),
            order: patch.order.map(|_| before.order),
            hours: patch.hours.map(|_| before.hours),
        }
    }
}

/// Fields for a task create call. The remote authority assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    /// Task title.
    pub title: String,
    /// Initial status.
    pub status: TaskStatus,
    /// Priority.
    #[serde(default)]
    pub priority: Priority,
    /// Due date and time.
    #[serde(default)]
    pub due_date: Option<NaiveDateTime>,
    /// Owning project.
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    /// Assigned user.
    #[serde(default)]
    pub assignee_id: Option<UserId>,
    /// Position within the status group.
    #[serde(default)]
    pub order: i64,
    /// Hours logged.
    #[serde(default)]
    pub hours: Option<f64>,
}

impl NewTask {
    /// A minimal create payload with the given title and status.
    pub fn new(title: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            title: title.into(),
            status,
            priority: Priority::default(),
            due_date: None,
            project_id: None,
            assignee_id: None,
            order: 0,
            hours: None,
        }
    }
}

/// A partial update to a task.
///
/// `None` leaves a field alone. Nullable fields nest a second `Option`, so
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    /// New title.
    pub title: Option<String>,
    /// New status.
    pub status: Option<TaskStatus>,
    /// New priority.
    pub priority: Option<Priority>,
    /// New due date (`Some(None)` clears).
    pub due_date: Option<Option<NaiveDateTime>>,
    /// New project (`Some(None)` clears).
    pub project_id: Option<Option<ProjectId>>,
    /// New assignee (`Some(None)` clears).
    pub assignee_id: Option<Option<UserId>>,
    /// New position within the status group.
    pub order: Option<i64>,
    /// New logged hours (`Some(None)` clears).
    pub hours: Option<Option<f64>>,
}

impl TaskPatch {
    /// Sets the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the status.
    #[must_use]
    pub const fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets or clears the due date.
    #[must_use]
    pub const fn due_date(mut self, due_date: Option<NaiveDateTime>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Sets or clears the assignee.
    #[must_use]
    pub fn assignee(mut self, assignee: Option<UserId>) -> Self {
        self.assignee_id = Some(assignee);
        self
    }

    /// Sets the order.
    #[must_use]
    pub const fn order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    /// Returns `true` if the patch touches no field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

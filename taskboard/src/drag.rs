//! Drag gesture state.
//!
//! A [`DragSession`] exists only between picking a card up and dropping or
//! cancelling it. It never touches the store; dropping hands the active drag
//! to the coordinator, which ends the session whatever the outcome.

use chrono::NaiveDate;

use taskboard_proto::task::TaskId;

use crate::projector::kanban::Column;

/// Errors returned by drag operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DragError {
    /// A drag is already in progress.
    #[error("a drag is already active for task {0}")]
    AlreadyActive(TaskId),
}

/// Where the dragged card was picked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOrigin {
    /// A kanban column, at this index.
    Column {
        /// Source column.
        column: Column,
        /// Index within the projected column.
        index: usize,
    },
    /// A calendar day.
    Day(NaiveDate),
}

/// Where a card would land if dropped now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// A kanban column, before the card currently at `index` (counted
    /// without the dragged card).
    Column {
        /// Destination column.
        column: Column,
        /// Insertion index.
        index: usize,
    },
    /// A calendar day.
    Day(NaiveDate),
}

/// The drag in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveDrag {
    /// Dragged task.
    pub task_id: TaskId,
    /// Pick-up location.
    pub origin: DragOrigin,
    /// Current hover target, for feedback only.
    pub target: Option<DropTarget>,
}

/// Transient state of a drag gesture.
#[derive(Debug, Default)]
pub struct DragSession {
    active: Option<ActiveDrag>,
}

impl DragSession {
    /// Creates an idle session.
    #[must_use]
    pub const fn new() -> Self {
        Self { active: None }
    }

    /// Starts dragging `task_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DragError::AlreadyActive`] if a drag is in progress; the
    /// existing drag is kept.
    pub fn begin(&mut self, task_id: TaskId, origin: DragOrigin) -> Result<(), DragError> {
        if let Some(active) = &self.active {
            return Err(DragError::AlreadyActive(active.task_id));
        }
        tracing::trace!(task_id = %task_id, ?origin, "drag started");
        self.active = Some(ActiveDrag {
            task_id,
            origin,
            target: None,
        });
        Ok(())
    }

    /// Records the hover target. Ignored when idle.
    pub const fn update_target(&mut self, target: DropTarget) {
        if let Some(active) = &mut self.active {
            active.target = Some(target);
        }
    }

    /// Ends the drag and returns it, if any.
    pub const fn end(&mut self) -> Option<ActiveDrag> {
        self.active.take()
    }

    /// Abandons the drag. Nothing is sent anywhere.
    pub fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            tracing::trace!(task_id = %active.task_id, "drag cancelled");
        }
    }

    /// Hands the active drag and `target` to `f`, then ends the session.
    /// Returns `None` without calling `f` when idle.
    pub fn commit<T>(
        &mut self,
        target: DropTarget,
        f: impl FnOnce(ActiveDrag, DropTarget) -> T,
    ) -> Option<T> {
        let active = self.active.take()?;
        Some(f(active, target))
    }

    /// The drag in progress.
    #[must_use]
    pub const fn active(&self) -> Option<&ActiveDrag> {
        self.active.as_ref()
    }

    /// Returns `true` while a drag is in progress.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

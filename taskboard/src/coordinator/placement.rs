//! Placement math for kanban drops and calendar reschedules.
//!
//! Everything here is pure: a plan is computed from a task slice and then
//! applied by the coordinator, both optimistically and against the remote.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use taskboard_proto::task::{Task, TaskId, TaskPatch};

use crate::projector::kanban::{Column, column_tasks};
use crate::store::StoreError;

/// Gap between consecutive `order` values after a renumber, and the offset
/// used when dropping before the first or after the last card.
pub const ORDER_STEP: i64 = 10;

/// The writes a kanban drop needs, in the order they are sent.
///
/// Renumbered siblings come first; the moved task is always last.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovePlan {
    /// Per-task patches.
    pub ops: Vec<(TaskId, TaskPatch)>,
}

impl MovePlan {
    /// Returns `true` if the drop changes nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.ops.is_empty()
    }

    /// Returns `true` if the plan rewrites more than the moved task.
    #[must_use]
    pub fn is_renumber(&self) -> bool {
        self.ops.len() > 1
    }

    /// Every task the plan writes, sorted.
    #[must_use]
    pub fn task_ids(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self.ops.iter().map(|(id, _)| *id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Plans dropping task `id` into `column` at `index`.
///
/// `index` counts the cards of the destination column with the moved task
/// left out, and is clamped to the column length. The moved task takes the
/// column's drop status unless it already belongs to that column.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] if `id` is not in `tasks`.
pub fn plan_move(
    tasks: &[Task],
    id: &TaskId,
    column: Column,
    index: usize,
) -> Result<MovePlan, StoreError> {
    let task = tasks
        .iter()
        .find(|t| t.id == *id)
        .ok_or(StoreError::NotFound(*id))?;

    let same_column = Column::of(task.status) == column;
    let members = column_tasks(tasks, column);
    let siblings: Vec<&Task> = members.iter().copied().filter(|t| t.id != *id).collect();
    let index = index.min(siblings.len());

    if same_column && members.iter().position(|t| t.id == *id) == Some(index) {
        return Ok(MovePlan::default());
    }

    let status = (!same_column).then(|| column.drop_status());
    let moved_patch = |order: i64| {
        let patch = TaskPatch::default().order(order);
        match status {
            Some(status) => patch.status(status),
            None => patch,
        }
    };

    let before = index.checked_sub(1).and_then(|i| siblings.get(i));
    let after = siblings.get(index);
    if let Some(order) = order_between(before.map(|t| t.order), after.map(|t| t.order)) {
        return Ok(MovePlan {
            ops: vec![(*id, moved_patch(order))],
        });
    }

    let mut ops = Vec::with_capacity(siblings.len() + 1);
    let mut moved_order = 0;
    let mut slot: i64 = 0;
    for position in 0..=siblings.len() {
        let order = slot * ORDER_STEP;
        slot += 1;
        if position == index {
            moved_order = order;
        }
        let sibling_position = if position < index {
            Some(position)
        } else if position > index {
            Some(position - 1)
        } else {
            None
        };
        if let Some(sibling) = sibling_position.and_then(|p| siblings.get(p))
            && sibling.order != order
        {
            ops.push((sibling.id, TaskPatch::default().order(order)));
        }
    }
    ops.push((*id, moved_patch(moved_order)));

    tracing::debug!(task_id = %id, %column, renumbered = ops.len() - 1, "column renumbered");
    Ok(MovePlan { ops })
}

/// An `order` strictly between the neighbours, or `None` when they leave
/// no integer gap.
fn order_between(before: Option<i64>, after: Option<i64>) -> Option<i64> {
    match (before, after) {
        (None, None) => Some(0),
        (Some(prev), None) => prev.checked_add(ORDER_STEP),
        (None, Some(next)) => next.checked_sub(ORDER_STEP),
        (Some(prev), Some(next)) => {
            let mid = i64::try_from((i128::from(prev) + i128::from(next)).div_euclid(2)).ok()?;
            (prev < mid && mid < next).then_some(mid)
        }
    }
}

/// The due date after dropping a task on `date`.
///
/// Keeps the time of day of `current`; an undated task lands at midnight.
#[must_use]
pub fn reschedule_due(current: Option<NaiveDateTime>, date: NaiveDate) -> NaiveDateTime {
    date.and_time(current.map_or(NaiveTime::MIN, |due| due.time()))
}

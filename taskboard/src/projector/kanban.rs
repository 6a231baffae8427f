//! Kanban projection: tasks partitioned into status columns.

use std::fmt;

use taskboard_proto::project::Project;
use taskboard_proto::task::{Task, TaskId, TaskStatus};

use super::{ProjectLabel, TaskFilter};
use crate::coordinator::placement::ORDER_STEP;

/// A column on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    /// Not started.
    Backlog,
    /// Being worked on.
    InProgress,
    /// Under review or test.
    Testing,
    /// Finished.
    Done,
}

impl Column {
    /// Columns in board order, left to right.
    pub const ALL: [Self; 4] = [Self::Backlog, Self::InProgress, Self::Testing, Self::Done];

    /// The column a task with `status` is shown in.
    ///
    /// Cancelled and blocked tasks sit in Backlog.
    #[must_use]
    pub const fn of(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Backlog
            | TaskStatus::Todo
            | TaskStatus::Cancelled
            | TaskStatus::Blocked => Self::Backlog,
            TaskStatus::InProgress => Self::InProgress,
            TaskStatus::InReview | TaskStatus::Testing => Self::Testing,
            TaskStatus::Done => Self::Done,
        }
    }

    /// The status a task takes when dropped into this column from another
    /// column.
    #[must_use]
    pub const fn drop_status(self) -> TaskStatus {
        match self {
            Self::Backlog => TaskStatus::Todo,
            Self::InProgress => TaskStatus::InProgress,
            Self::Testing => TaskStatus::Testing,
            Self::Done => TaskStatus::Done,
        }
    }

    /// Position of the column on the board.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Backlog => 0,
            Self::InProgress => 1,
            Self::Testing => 2,
            Self::Done => 3,
        }
    }

    /// The column to the left, if any.
    #[must_use]
    pub const fn prev(self) -> Option<Self> {
        match self {
            Self::Backlog => None,
            Self::InProgress => Some(Self::Backlog),
            Self::Testing => Some(Self::InProgress),
            Self::Done => Some(Self::Testing),
        }
    }

    /// The column to the right, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Backlog => Some(Self::InProgress),
            Self::InProgress => Some(Self::Testing),
            Self::Testing => Some(Self::Done),
            Self::Done => None,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backlog => write!(f, "Backlog"),
            Self::InProgress => write!(f, "In Progress"),
            Self::Testing => write!(f, "Testing"),
            Self::Done => write!(f, "Done"),
        }
    }
}

/// A task as shown on a kanban card.
#[derive(Debug, Clone, PartialEq)]
pub struct KanbanCard {
    /// The task.
    pub task: Task,
    /// Project label, `None` when the task has no project.
    pub project: Option<ProjectLabel>,
}

/// One projected column.
#[derive(Debug, Clone, PartialEq)]
pub struct KanbanColumn {
    /// Which column.
    pub column: Column,
    /// Cards sorted by `(order, id)`.
    pub cards: Vec<KanbanCard>,
}

/// The full projected board.
#[derive(Debug, Clone, PartialEq)]
pub struct KanbanBoard {
    /// Columns in [`Column::ALL`] order.
    pub columns: Vec<KanbanColumn>,
}

impl KanbanBoard {
    /// Cards of one column.
    #[must_use]
    pub fn cards(&self, column: Column) -> &[KanbanCard] {
        self.columns
            .get(column.index())
            .map(|c| c.cards.as_slice())
            .unwrap_or(&[])
    }

    /// Column and index of a task on the board.
    #[must_use]
    pub fn position_of(&self, id: &TaskId) -> Option<(Column, usize)> {
        self.columns.iter().find_map(|col| {
            col.cards
                .iter()
                .position(|card| card.task.id == *id)
                .map(|index| (col.column, index))
        })
    }
}

/// Sort key that totally orders tasks inside a column.
#[must_use]
pub const fn sort_key(task: &Task) -> (i64, TaskId) {
    (task.order, task.id)
}

/// Partitions `tasks` into board columns.
#[must_use]
pub fn group(tasks: &[Task], projects: &[Project], filter: &TaskFilter) -> KanbanBoard {
    let mut columns: Vec<KanbanColumn> = Column::ALL
        .iter()
        .map(|&column| KanbanColumn {
            column,
            cards: Vec::new(),
        })
        .collect();

    for task in tasks.iter().filter(|t| filter.matches(t)) {
        columns[Column::of(task.status).index()].cards.push(KanbanCard {
            task: task.clone(),
            project: ProjectLabel::for_task(task, projects),
        });
    }
    for column in &mut columns {
        column.cards.sort_by_key(|card| sort_key(&card.task));
    }

    KanbanBoard { columns }
}

/// Every task in `column`, unfiltered, sorted by `(order, id)`.
#[must_use]
pub fn column_tasks(tasks: &[Task], column: Column) -> Vec<&Task> {
    let mut members: Vec<&Task> = tasks
        .iter()
        .filter(|t| Column::of(t.status) == column)
        .collect();
    members.sort_by_key(|t| sort_key(t));
    members
}

/// Order value that places a new task at the bottom of `column`.
#[must_use]
pub fn next_order(tasks: &[Task], column: Column) -> i64 {
    column_tasks(tasks, column)
        .last()
        .map_or(0, |t| t.order.saturating_add(ORDER_STEP))
}

/// Translates a drop index among the visible cards of a (possibly
/// filtered) column into an index in the full column, both excluding the
/// task being moved.
#[must_use]
pub fn unfiltered_index(
    tasks: &[Task],
    column: Column,
    visible: &[KanbanCard],
    visible_index: usize,
    moving: &TaskId,
) -> usize {
    let full: Vec<&Task> = column_tasks(tasks, column)
        .into_iter()
        .filter(|t| t.id != *moving)
        .collect();
    let shown: Vec<&TaskId> = visible
        .iter()
        .map(|card| &card.task.id)
        .filter(|id| *id != moving)
        .collect();
    let position = |id: &TaskId| full.iter().position(|t| t.id == *id);

    let clamped = visible_index.min(shown.len());
    match clamped.checked_sub(1).and_then(|i| shown.get(i)) {
        Some(anchor) => position(*anchor).map_or(full.len(), |p| p + 1),
        None => shown
            .first()
            .and_then(|first| position(*first))
            .unwrap_or(full.len()),
    }
}

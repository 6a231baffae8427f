//! Calendar projection: tasks and project kickoffs bucketed by day.
//!
//! Tasks land on the date component of their due date; undated tasks are
//! left out. Projects contribute read-only pseudo-events on their start
//! date. Within a day, project events come first, then tasks in store
//! order.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};

use taskboard_proto::project::{Project, ProjectId};
use taskboard_proto::task::{Task, TaskId, TaskStatus};

use super::{ProjectLabel, TaskFilter};

/// One entry in a calendar day.
#[derive(Debug, Clone, PartialEq)]
pub enum CalendarEvent {
    /// A project kickoff. Never draggable.
    Project {
        /// The project.
        project_id: ProjectId,
        /// Display name.
        name: String,
        /// Display color.
        color: String,
    },
    /// A task due on this day.
    Task {
        /// The task.
        task_id: TaskId,
        /// Title.
        title: String,
        /// Status at projection time.
        status: TaskStatus,
        /// Time-of-day component of the due date.
        time: NaiveTime,
        /// Project label, `None` when the task has no project.
        project: Option<ProjectLabel>,
    },
}

impl CalendarEvent {
    /// Whether the event can be dragged to another day.
    #[must_use]
    pub const fn is_draggable(&self) -> bool {
        matches!(self, Self::Task { .. })
    }

    /// The task behind a task event.
    #[must_use]
    pub const fn task_id(&self) -> Option<&TaskId> {
        match self {
            Self::Task { task_id, .. } => Some(task_id),
            Self::Project { .. } => None,
        }
    }
}

/// Events keyed by day, in date order.
pub type CalendarBuckets = BTreeMap<NaiveDate, Vec<CalendarEvent>>;

/// Inclusive range of days a calendar view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    /// First day shown.
    pub start: NaiveDate,
    /// Last day shown.
    pub end: NaiveDate,
}

impl DateWindow {
    /// The days of one calendar month. `None` for an invalid month.
    #[must_use]
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some(Self {
            start,
            end: next.pred_opt()?,
        })
    }

    /// Whether `date` falls inside the window.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Buckets tasks and project kickoffs by day.
///
/// With a `window`, days outside it are dropped.
#[must_use]
pub fn group(
    tasks: &[Task],
    projects: &[Project],
    filter: &TaskFilter,
    window: Option<DateWindow>,
) -> CalendarBuckets {
    let in_window = |date: NaiveDate| window.is_none_or(|w| w.contains(date));
    let mut buckets = CalendarBuckets::new();

    for project in projects {
        let Some(start) = project.start_date else {
            continue;
        };
        if !in_window(start) || !filter.includes_project(&project.id) {
            continue;
        }
        buckets
            .entry(start)
            .or_default()
            .push(CalendarEvent::Project {
                project_id: project.id,
                name: project.name.clone(),
                color: project.color.clone(),
            });
    }

    for task in tasks.iter().filter(|t| filter.matches(t)) {
        let Some(due) = task.due_date else {
            continue;
        };
        if !in_window(due.date()) {
            continue;
        }
        buckets
            .entry(due.date())
            .or_default()
            .push(CalendarEvent::Task {
                task_id: task.id,
                title: task.title.clone(),
                status: task.status,
                time: due.time(),
                project: ProjectLabel::for_task(task, projects),
            });
    }

    buckets
}

/// Weeks covering one month, Monday first. Leading and trailing days from
/// the neighbouring months fill the first and last week.
#[must_use]
pub fn month_weeks(window: DateWindow) -> Vec<[NaiveDate; 7]> {
    let offset = i64::from(window.start.weekday().num_days_from_monday());
    let mut cursor = window.start - Duration::days(offset);
    let mut weeks = Vec::new();

    while cursor <= window.end {
        let mut week = [cursor; 7];
        for (i, day) in week.iter_mut().enumerate() {
            *day = cursor + Duration::days(i64::try_from(i).unwrap_or(0));
        }
        weeks.push(week);
        cursor += Duration::days(7);
    }
    debug_assert!(weeks.first().is_none_or(|w| w[0].weekday() == Weekday::Mon));
    weeks
}

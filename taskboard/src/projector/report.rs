//! Report projection: counts and logged hours for a filter tuple.

use std::collections::HashMap;

use chrono::NaiveDate;

use taskboard_proto::project::{ClientId, Project, ProjectId};
use taskboard_proto::task::{Task, UserId};

use super::ProjectLabel;

/// Label used for the row collecting tasks without a project.
pub const NO_PROJECT_NAME: &str = "No project";

/// Filter tuple for a report. Every field is optional; `None` keeps all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    /// Only tasks whose project belongs to this client.
    pub client_id: Option<ClientId>,
    /// Only tasks of this project.
    pub project_id: Option<ProjectId>,
    /// Only tasks assigned to this user.
    pub assignee_id: Option<UserId>,
    /// Earliest due date, inclusive.
    pub from: Option<NaiveDate>,
    /// Latest due date, inclusive.
    pub to: Option<NaiveDate>,
}

impl ReportFilter {
    fn matches(&self, task: &Task, projects: &[Project]) -> bool {
        if let Some(project_id) = &self.project_id
            && task.project_id.as_ref() != Some(project_id)
        {
            return false;
        }
        if let Some(assignee) = &self.assignee_id
            && task.assignee_id.as_ref() != Some(assignee)
        {
            return false;
        }
        if let Some(client) = &self.client_id {
            let owner = task
                .project_id
                .and_then(|id| projects.iter().find(|p| p.id == id))
                .and_then(|p| p.client_id.as_ref());
            if owner != Some(client) {
                return false;
            }
        }
        if self.from.is_some() || self.to.is_some() {
            let Some(due) = task.due_date.map(|d| d.date()) else {
                return false;
            };
            if self.from.is_some_and(|from| due < from) || self.to.is_some_and(|to| due > to) {
                return false;
            }
        }
        true
    }
}

/// One per-project breakdown row.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRow {
    /// The project, `None` for tasks without one.
    pub project_id: Option<ProjectId>,
    /// Display label; a placeholder when the project is not loaded.
    pub label: ProjectLabel,
    /// Tasks counted in this row.
    pub total_tasks: usize,
    /// Tasks in this row whose status is `Done`.
    pub completed_tasks: usize,
    /// Sum of logged hours.
    pub total_hours: f64,
}

/// Aggregates for one report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportSummary {
    /// Tasks matching the filter.
    pub total_tasks: usize,
    /// Matching tasks whose status is `Done`.
    pub completed_tasks: usize,
    /// Sum of logged hours over matching tasks.
    pub total_hours: f64,
    /// Breakdown by project, sorted by label name.
    pub by_project: Vec<ProjectRow>,
}

impl ReportSummary {
    /// Completed over total, `0.0` for an empty report.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn completion_rate(&self) -> f64 {
        if self.total_tasks == 0 {
            0.0
        } else {
            self.completed_tasks as f64 / self.total_tasks as f64
        }
    }
}

/// Computes report aggregates over every task matching `filter`.
#[must_use]
pub fn summarize(tasks: &[Task], projects: &[Project], filter: &ReportFilter) -> ReportSummary {
    let mut summary = ReportSummary::default();
    let mut rows: HashMap<Option<ProjectId>, ProjectRow> = HashMap::new();

    for task in tasks.iter().filter(|t| filter.matches(t, projects)) {
        let done = task.status.is_done();
        let hours = task.hours.unwrap_or(0.0);

        summary.total_tasks += 1;
        summary.completed_tasks += usize::from(done);
        summary.total_hours += hours;

        let row = rows.entry(task.project_id).or_insert_with(|| ProjectRow {
            project_id: task.project_id,
            label: task.project_id.map_or_else(
                || ProjectLabel {
                    name: NO_PROJECT_NAME.to_string(),
                    color: super::UNKNOWN_PROJECT_COLOR.to_string(),
                    known: true,
                },
                |id| ProjectLabel::for_project(&id, projects),
            ),
            total_tasks: 0,
            completed_tasks: 0,
            total_hours: 0.0,
        });
        row.total_tasks += 1;
        row.completed_tasks += usize::from(done);
        row.total_hours += hours;
    }

    summary.by_project = rows.into_values().collect();
    summary
        .by_project
        .sort_by(|a, b| a.label.name.cmp(&b.label.name).then(a.project_id.cmp(&b.project_id)));

    tracing::trace!(
        total = summary.total_tasks,
        completed = summary.completed_tasks,
        rows = summary.by_project.len(),
        "report summarized"
    );
    summary
}

//! Pure view projections over the task store.
//!
//! Every projection takes the current task slice, the loaded projects and
//! an explicit filter, and returns a fresh value. Nothing here mutates the
//! store or keeps state between calls, so re-running a projection on the
//! same input yields the same output.
//!
//! - [`kanban`]: columns by status
//! - [`calendar`]: events bucketed by day
//! - [`report`]: counts and hours for a filter tuple

pub mod calendar;
pub mod kanban;
pub mod report;

use taskboard_proto::project::{Project, ProjectId};
use taskboard_proto::task::{Task, TaskStatus, UserId};

/// Label shown for a task whose project is not in the loaded project list.
pub const UNKNOWN_PROJECT_NAME: &str = "Unknown project";

/// Color used for [`UNKNOWN_PROJECT_NAME`] labels.
pub const UNKNOWN_PROJECT_COLOR: &str = "#808080";

/// Project name and color attached to a projected task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLabel {
    /// Display name, or [`UNKNOWN_PROJECT_NAME`].
    pub name: String,
    /// Display color.
    pub color: String,
    /// `false` when the project is referenced but not loaded.
    pub known: bool,
}

impl ProjectLabel {
    /// Resolves the label for `task`.
    ///
    /// Returns `None` for tasks without a project. A task pointing at a
    /// project that is not loaded still gets a placeholder label.
    #[must_use]
    pub fn for_task(task: &Task, projects: &[Project]) -> Option<Self> {
        task.project_id.map(|id| Self::for_project(&id, projects))
    }

    /// Resolves the label for a project ID.
    #[must_use]
    pub fn for_project(id: &ProjectId, projects: &[Project]) -> Self {
        projects.iter().find(|p| p.id == *id).map_or_else(
            || Self {
                name: UNKNOWN_PROJECT_NAME.to_string(),
                color: UNKNOWN_PROJECT_COLOR.to_string(),
                known: false,
            },
            |project| Self {
                name: project.name.clone(),
                color: project.color.clone(),
                known: true,
            },
        )
    }
}

/// Page-level filter state, passed explicitly into every projection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Case-insensitive substring matched against titles.
    pub search: Option<String>,
    /// Only these projects (empty means all).
    pub projects: Vec<ProjectId>,
    /// Only these statuses (empty means all).
    pub statuses: Vec<TaskStatus>,
    /// Only tasks assigned to this user.
    pub assignee: Option<UserId>,
}

impl TaskFilter {
    /// Filter that keeps only tasks assigned to `me`.
    #[must_use]
    pub fn assigned_to(me: UserId) -> Self {
        Self {
            assignee: Some(me),
            ..Self::default()
        }
    }

    /// Returns `true` if the filter keeps everything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether `task` passes every predicate.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty())
            && !task.title.to_lowercase().contains(&search.to_lowercase())
        {
            return false;
        }
        if !self.projects.is_empty()
            && !task
                .project_id
                .is_some_and(|id| self.projects.contains(&id))
        {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&task.status) {
            return false;
        }
        if let Some(assignee) = &self.assignee
            && task.assignee_id.as_ref() != Some(assignee)
        {
            return false;
        }
        true
    }

    /// Whether project-level entries for `id` should be shown.
    #[must_use]
    pub fn includes_project(&self, id: &ProjectId) -> bool {
        self.projects.is_empty() || self.projects.contains(id)
    }
}

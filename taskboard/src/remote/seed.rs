//! Seed data for the in-memory remote.
//!
//! A seed file is JSON with two arrays:
//!
//! ```json
//! {
//!   "projects": [{ "id": "...", "name": "Website", "start_date": "2024-03-01" }],
//!   "tasks": [{ "id": "...", "title": "Draft copy", "status": "TODO", "order": 10 }]
//! }
//! ```
//!
//! Without a seed file the demo board from [`Seed::demo`] is used.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use taskboard_proto::project::{ClientId, Project, ProjectId};
use taskboard_proto::task::{Priority, Task, TaskId, TaskStatus, UserId};

/// Errors that can occur when loading a seed file.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    /// Failed to read the seed file.
    #[error("failed to read seed file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the seed JSON.
    #[error("failed to parse seed file: {0}")]
    ParseJson(#[from] serde_json::Error),
}

/// Initial contents of a remote authority.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Seed {
    /// Projects.
    pub projects: Vec<Project>,
    /// Tasks.
    pub tasks: Vec<Task>,
}

impl Seed {
    /// Load a seed from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, SeedError> {
        let contents = std::fs::read_to_string(path).map_err(|e| SeedError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&contents)
    }

    /// Parse a seed from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError::ParseJson`] on malformed input.
    pub fn from_json(json: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(json)?)
    }

    /// A small demo board anchored on `today`.
    #[must_use]
    pub fn demo(today: NaiveDate) -> Self {
        let website = ProjectId::from_u128(0x100);
        let mobile = ProjectId::from_u128(0x200);
        let month_start = today.with_day(1).unwrap_or(today);

        let projects = vec![
            Project {
                id: website,
                name: "Website relaunch".to_string(),
                color: "#3b82f6".to_string(),
                client_id: Some(ClientId::new("acme")),
                start_date: Some(month_start),
                due_date: Some(month_start + Duration::days(27)),
            },
            Project {
                id: mobile,
                name: "Mobile app".to_string(),
                color: "#10b981".to_string(),
                client_id: Some(ClientId::new("globex")),
                start_date: Some(month_start + Duration::days(7)),
                due_date: None,
            },
        ];

        let at = |days: i64, hour: u32, minute: u32| {
            NaiveTime::from_hms_opt(hour, minute, 0)
                .map(|time| (today + Duration::days(days)).and_time(time))
        };

        let task = |n: u128, title: &str, status: TaskStatus, order: i64| Task {
            id: TaskId::from_u128(n),
            title: title.to_string(),
            status,
            priority: Priority::Medium,
            due_date: None,
            project_id: Some(website),
            assignee_id: None,
            order,
            hours: None,
        };

        let tasks = vec![
            Task {
                due_date: at(1, 10, 0),
                assignee_id: Some(UserId::new("me")),
                priority: Priority::High,
                ..task(1, "Draft landing page copy", TaskStatus::Todo, 10)
            },
            Task {
                due_date: at(3, 14, 30),
                ..task(2, "Pick hero imagery", TaskStatus::Todo, 20)
            },
            Task {
                assignee_id: Some(UserId::new("me")),
                hours: Some(3.5),
                due_date: at(0, 16, 0),
                ..task(3, "Build pricing table", TaskStatus::InProgress, 10)
            },
            Task {
                hours: Some(2.0),
                ..task(4, "Accessibility pass", TaskStatus::InReview, 10)
            },
            Task {
                hours: Some(5.0),
                assignee_id: Some(UserId::new("me")),
                ..task(5, "Set up analytics", TaskStatus::Done, 10)
            },
            Task {
                project_id: Some(mobile),
                due_date: at(7, 9, 0),
                priority: Priority::Urgent,
                ..task(6, "Push notification spike", TaskStatus::Blocked, 30)
            },
            Task {
                project_id: Some(mobile),
                hours: Some(1.0),
                ..task(7, "App store screenshots", TaskStatus::Testing, 20)
            },
            Task {
                project_id: None,
                due_date: at(-2, 11, 15),
                ..task(8, "Quarterly planning notes", TaskStatus::Done, 20)
            },
        ];

        Self { projects, tasks }
    }
}

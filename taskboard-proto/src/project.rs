//! Project and client model types.
//!
//! Projects are read-only from the board's point of view: they label
//! task cards, scope filters and reports, and contribute pseudo-events to
//! the calendar.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectId(Uuid);

impl ProjectId {
    /// Creates a `ProjectId` from a plain integer. Handy for fixtures.
    #[must_use]
    pub const fn from_u128(n: u128) -> Self {
        Self(Uuid::from_u128(n))
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier of a client (the customer a project is billed to).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(String);

impl ClientId {
    /// Create a new client identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the string representation of this client ID.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A project, as listed by the remote authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Unique project identifier.
    pub id: ProjectId,
    /// Display name.
    pub name: String,
    /// Display color (`#rrggbb`).
    #[serde(default = "default_color")]
    pub color: String,
    /// Client the project belongs to.
    #[serde(default)]
    pub client_id: Option<ClientId>,
    /// Kickoff date; rendered on the calendar.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Deadline.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

fn default_color() -> String {
    "#808080".to_string()
}

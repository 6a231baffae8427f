//! Remote authority abstraction for Taskboard.
//!
//! Defines the [`TaskRemote`] and [`ProjectRemote`] traits the
//! [`Coordinator`](crate::coordinator::Coordinator) talks to. Concrete
//! implementations include:
//! - [`memory::InMemoryRemote`]: in-process authority for demo mode and tests
//!
//! Transport encoding is the implementation's concern; the core only sees
//! model types.

pub mod memory;
pub mod seed;

use taskboard_proto::project::Project;
use taskboard_proto::task::{NewTask, Task, TaskId, TaskPatch};

/// Errors reported by a remote authority.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The remote refused the change (validation failure or conflict).
    #[error("rejected: {0}")]
    Rejected(String),

    /// The remote could not be reached.
    #[error("unreachable: {0}")]
    Unreachable(String),

    /// The remote has no task with this ID.
    #[error("task {0} not found on remote")]
    NotFound(TaskId),
}

/// Async access to the remote task collection.
///
/// Each write is safe to retry at the caller's discretion; the core never
/// retries on its own.
pub trait TaskRemote: Send + Sync {
    /// Fetch the full task collection.
    fn list(&self) -> impl std::future::Future<Output = Result<Vec<Task>, RemoteError>> + Send;

    /// Create a task. The remote assigns the identity.
    fn create(
        &self,
        fields: &NewTask,
    ) -> impl std::future::Future<Output = Result<Task, RemoteError>> + Send;

    /// Merge `patch` into an existing task and return the stored record.
    fn update(
        &self,
        id: &TaskId,
        patch: &TaskPatch,
    ) -> impl std::future::Future<Output = Result<Task, RemoteError>> + Send;

    /// Delete a task.
    fn delete(&self, id: &TaskId)
    -> impl std::future::Future<Output = Result<(), RemoteError>> + Send;
}

/// Read-only access to the remote project list.
pub trait ProjectRemote: Send + Sync {
    /// Fetch every project.
    fn list(&self) -> impl std::future::Future<Output = Result<Vec<Project>, RemoteError>> + Send;
}

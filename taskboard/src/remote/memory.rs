//! In-process remote authority.
//!
//! [`InMemoryRemote`] keeps the authoritative task and project lists in
//! memory and answers the [`TaskRemote`] / [`ProjectRemote`] calls the way a
//! real backend would: it validates writes, hands out identities on create
//! and returns the stored record. It also lets tests and the offline demo
//! script failures ([`fail_next`](InMemoryRemote::fail_next)), go offline
//! and add latency.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;

use taskboard_proto::project::Project;
use taskboard_proto::task::{MAX_TASK_TITLE_LENGTH, NewTask, Task, TaskId, TaskPatch};

use super::seed::Seed;
use super::{ProjectRemote, RemoteError, TaskRemote};

/// A write call observed by the remote, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    /// A create call.
    Create(NewTask),
    /// An update call.
    Update(TaskId, TaskPatch),
    /// A delete call.
    Delete(TaskId),
}

#[derive(Debug, Default)]
struct RemoteState {
    tasks: Vec<Task>,
    projects: Vec<Project>,
    script: VecDeque<Option<RemoteError>>,
    calls: Vec<RemoteCall>,
    offline: bool,
}

impl RemoteState {
    /// Decides the outcome of a write before any latency elapses, so
    /// scripted failures are consumed in call order.
    fn admit(&mut self, call: RemoteCall) -> Result<(), RemoteError> {
        self.calls.push(call);
        if self.offline {
            return Err(RemoteError::Unreachable("remote is offline".to_string()));
        }
        self.script.pop_front().flatten().map_or(Ok(()), Err)
    }
}

/// In-memory remote authority with scripted failures.
#[derive(Debug, Default)]
pub struct InMemoryRemote {
    state: Mutex<RemoteState>,
    latency: Mutex<Duration>,
}

impl InMemoryRemote {
    /// Creates an empty remote.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a remote preloaded with `seed`.
    #[must_use]
    pub fn from_seed(seed: Seed) -> Self {
        Self {
            state: Mutex::new(RemoteState {
                tasks: seed.tasks,
                projects: seed.projects,
                ..RemoteState::default()
            }),
            latency: Mutex::new(Duration::ZERO),
        }
    }

    /// Delays every call by `latency`.
    #[must_use]
    pub fn with_latency(self, latency: Duration) -> Self {
        self.set_latency(latency);
        self
    }

    /// Changes the per-call delay.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    /// Queues a failing write outcome. Queued outcomes are consumed one per
    /// write, in call order; once the queue is empty writes succeed.
    pub fn fail_next(&self, error: RemoteError) {
        self.state.lock().script.push_back(Some(error));
    }

    /// Queues a succeeding write outcome, pushing later queued failures
    /// back by one write.
    pub fn allow_next(&self) {
        self.state.lock().script.push_back(None);
    }

    /// Makes every call fail with [`RemoteError::Unreachable`] until
    /// switched back.
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// Write calls received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state.lock().calls.clone()
    }

    /// The authoritative task list.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock().tasks.clone()
    }

    /// Looks up one authoritative task.
    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<Task> {
        self.state.lock().tasks.iter().find(|t| t.id == *id).cloned()
    }

    async fn delay(&self) {
        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

fn validate_title(title: &str) -> Result<(), RemoteError> {
    if title.trim().is_empty() {
        return Err(RemoteError::Rejected("title cannot be empty".to_string()));
    }
    if title.chars().count() > MAX_TASK_TITLE_LENGTH {
        return Err(RemoteError::Rejected(format!(
            "title too long (max {MAX_TASK_TITLE_LENGTH} characters)"
        )));
    }
    Ok(())
}

impl TaskRemote for InMemoryRemote {
    async fn list(&self) -> Result<Vec<Task>, RemoteError> {
        let offline = self.state.lock().offline;
        self.delay().await;
        if offline {
            return Err(RemoteError::Unreachable("remote is offline".to_string()));
        }
        Ok(self.tasks())
    }

    async fn create(&self, fields: &NewTask) -> Result<Task, RemoteError> {
        let admitted = self.state.lock().admit(RemoteCall::Create(fields.clone()));
        self.delay().await;
        admitted?;
        validate_title(&fields.title)?;

        let task = Task::from_new(TaskId::new(), fields.clone());
        self.state.lock().tasks.push(task.clone());
        tracing::debug!(task_id = %task.id, "remote created task");
        Ok(task)
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, RemoteError> {
        let admitted = self
            .state
            .lock()
            .admit(RemoteCall::Update(*id, patch.clone()));
        self.delay().await;
        admitted?;
        if let Some(title) = &patch.title {
            validate_title(title)?;
        }

        let mut state = self.state.lock();
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.id == *id)
            .ok_or(RemoteError::NotFound(*id))?;
        task.apply(patch);
        Ok(task.clone())
    }

    async fn delete(&self, id: &TaskId) -> Result<(), RemoteError> {
        let admitted = self.state.lock().admit(RemoteCall::Delete(*id));
        self.delay().await;
        admitted?;

        let mut state = self.state.lock();
        let index = state
            .tasks
            .iter()
            .position(|t| t.id == *id)
            .ok_or(RemoteError::NotFound(*id))?;
        state.tasks.remove(index);
        Ok(())
    }
}

impl ProjectRemote for InMemoryRemote {
    async fn list(&self) -> Result<Vec<Project>, RemoteError> {
        let (offline, projects) = {
            let state = self.state.lock();
            (state.offline, state.projects.clone())
        };
        self.delay().await;
        if offline {
            return Err(RemoteError::Unreachable("remote is offline".to_string()));
        }
        Ok(projects)
    }
}

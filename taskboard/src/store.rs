//! Client-side task store.
//!
//! [`TaskStore`] is the in-memory cache of task records for one session.
//! Views never mutate it directly: every change goes through the
//! [`Coordinator`](crate::coordinator::Coordinator), which snapshots the
//! store before an optimistic write and restores from that snapshot when
//! the remote authority refuses the change.
//!
//! [`SharedStore`] wraps the store for use from both the UI thread and the
//! mutation tasks, and publishes the store version on a watch channel so
//! views know when to re-project.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use taskboard_proto::project::Project;
use taskboard_proto::task::{Task, TaskId, TaskPatch};

/// Errors returned by store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No task with the given ID is loaded.
    #[error("task not found: {0}")]
    NotFound(TaskId),
}

/// Immutable, versioned copy of the full task collection.
///
/// Cloning a snapshot is cheap; the task list is shared.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    version: u64,
    tasks: Arc<[Task]>,
}

impl Snapshot {
    /// Store version at the time the snapshot was taken.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// The captured tasks, in store order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Looks up a captured task and its position.
    #[must_use]
    pub fn find(&self, id: &TaskId) -> Option<(usize, &Task)> {
        self.tasks.iter().enumerate().find(|(_, t)| t.id == *id)
    }
}

/// In-memory cache of task records, in arrival order.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    projects: Vec<Project>,
    version: u64,
}

impl TaskStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store preloaded with `tasks`.
    #[must_use]
    pub const fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            projects: Vec::new(),
            version: 0,
        }
    }

    /// Returns a copy of every task. Callers own the result.
    #[must_use]
    pub fn list(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    /// Borrowed view of the tasks, for projections.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Loaded projects.
    #[must_use]
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Number of loaded tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` if no tasks are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Monotonic change counter. Bumped by every mutation.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Looks up a task by ID.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == *id)
    }

    /// Captures the current collection for later rollback.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: self.version,
            tasks: Arc::from(self.tasks.as_slice()),
        }
    }

    /// Swaps the entire collection in one step.
    pub fn replace(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.bump();
    }

    /// Replaces the project list. Projects are not part of snapshots.
    pub fn set_projects(&mut self, projects: Vec<Project>) {
        self.projects = projects;
        self.bump();
    }

    /// Merges `patch` into one task, leaving every other record untouched
    /// and in place. Returns the updated task.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no task has `id`; the store is
    /// left unchanged.
    pub fn apply_patch(&mut self, id: &TaskId, patch: &TaskPatch) -> Result<Task, StoreError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == *id)
            .ok_or(StoreError::NotFound(*id))?;
        task.apply(patch);
        let updated = task.clone();
        self.bump();
        Ok(updated)
    }

    /// Appends a task.
    pub fn insert(&mut self, task: Task) {
        self.tasks.push(task);
        self.bump();
    }

    /// Inserts a task at `index`, clamped to the current length.
    pub fn insert_at(&mut self, index: usize, task: Task) {
        let index = index.min(self.tasks.len());
        self.tasks.insert(index, task);
        self.bump();
    }

    /// Replaces the record with the same ID in place, or appends it.
    pub fn upsert(&mut self, task: Task) {
        if let Some(existing) = self.tasks.iter_mut().find(|t| t.id == task.id) {
            *existing = task;
        } else {
            self.tasks.push(task);
        }
        self.bump();
    }

    /// Swaps the record stored under `old` for `task`, keeping its position.
    /// Appends `task` if `old` is gone.
    pub fn swap_record(&mut self, old: &TaskId, task: Task) {
        if let Some(existing) = self.tasks.iter_mut().find(|t| t.id == *old) {
            *existing = task;
        } else {
            self.tasks.push(task);
        }
        self.bump();
    }

    /// Removes a task, returning its former position and value.
    pub fn remove(&mut self, id: &TaskId) -> Option<(usize, Task)> {
        let index = self.tasks.iter().position(|t| t.id == *id)?;
        let task = self.tasks.remove(index);
        self.bump();
        Some((index, task))
    }

    /// Puts one record back to the value it had in `snapshot`.
    ///
    /// A task absent from the snapshot is removed; a task absent from the
    /// store is reinserted at its captured position (clamped to the current
    /// length). Other records are not touched.
    pub fn restore(&mut self, id: &TaskId, snapshot: &Snapshot) {
        let current = self.tasks.iter().position(|t| t.id == *id);
        match (snapshot.find(id), current) {
            (Some((_, before)), Some(index)) => self.tasks[index] = before.clone(),
            (Some((position, before)), None) => {
                let index = position.min(self.tasks.len());
                self.tasks.insert(index, before.clone());
            }
            (None, Some(index)) => {
                self.tasks.remove(index);
            }
            (None, None) => return,
        }
        self.bump();
    }

    const fn bump(&mut self) {
        self.version += 1;
    }
}

/// A [`TaskStore`] shared between the UI thread and mutation tasks.
///
/// The lock is synchronous and is never held across an await point.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<Mutex<TaskStore>>,
    changes: Arc<watch::Sender<u64>>,
}

impl SharedStore {
    /// Wraps `store` for shared use.
    #[must_use]
    pub fn new(store: TaskStore) -> Self {
        let (changes, _) = watch::channel(store.version());
        Self {
            inner: Arc::new(Mutex::new(store)),
            changes: Arc::new(changes),
        }
    }

    /// Receiver that observes the store version after every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Runs `f` with read access to the store.
    pub fn read<R>(&self, f: impl FnOnce(&TaskStore) -> R) -> R {
        f(&*self.inner.lock())
    }

    /// Runs `f` with write access to the store, then publishes the new
    /// version if it changed.
    pub fn write<R>(&self, f: impl FnOnce(&mut TaskStore) -> R) -> R {
        let (result, before, after) = {
            let mut store = self.inner.lock();
            let before = store.version();
            let result = f(&mut *store);
            (result, before, store.version())
        };
        if after != before {
            self.changes.send_replace(after);
        }
        result
    }

    /// Copy of every task.
    #[must_use]
    pub fn list(&self) -> Vec<Task> {
        self.read(TaskStore::list)
    }

    /// Copy of every project.
    #[must_use]
    pub fn projects(&self) -> Vec<Project> {
        self.read(|store| store.projects().to_vec())
    }

    /// Current store version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.read(TaskStore::version)
    }

    /// Captures a snapshot for rollback.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.read(TaskStore::snapshot)
    }
}

impl Default for SharedStore {
    fn default() -> Self {
        Self::new(TaskStore::new())
    }
}

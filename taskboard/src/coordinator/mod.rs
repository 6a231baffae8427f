//! Optimistic mutation coordinator.
//!
//! Every user-initiated change goes through [`Coordinator`], which:
//!
//! 1. Locks every task the change writes (see [`locks`]).
//! 2. Snapshots the store and applies the change locally, in one step.
//! 3. Sends the write to the remote under [`CoordinatorConfig::mutation_timeout`].
//! 4. On success, stores the record the remote returned.
//! 5. On failure, restores every touched record from the snapshot and
//!    publishes exactly one [`Notice`].
//!
//! Rollback is record-level: records the failed mutation did not touch keep
//! whatever state they have, including writes confirmed in the meantime.

pub mod locks;
pub mod placement;
pub mod state;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use taskboard_proto::task::{NewTask, Task, TaskId, TaskPatch, TaskStatus};

use crate::drag::{DragSession, DropTarget};
use crate::projector::kanban::Column;
use crate::remote::{ProjectRemote, RemoteError, TaskRemote};
use crate::store::{SharedStore, Snapshot, StoreError};

use locks::LockTable;
use placement::MovePlan;
use state::{MutationKind, MutationLog, MutationRecord, MutationState};

/// Default deadline for one remote write.
pub const DEFAULT_MUTATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of mutation records kept.
const DEFAULT_LOG_CAPACITY: usize = 64;

/// Default capacity of the notice channel.
const DEFAULT_NOTICE_BUFFER: usize = 32;

/// Why a mutation did not commit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    /// The target task is not in the store. Nothing was sent.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The remote refused the change.
    #[error("remote rejected the change: {0}")]
    RemoteRejected(String),

    /// The remote could not be reached.
    #[error("remote unreachable: {0}")]
    RemoteUnreachable(String),

    /// The remote did not answer in time.
    #[error("remote did not answer within {0:?}")]
    TimedOut(Duration),
}

impl From<RemoteError> for MutationError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Rejected(reason) => Self::RemoteRejected(reason),
            RemoteError::Unreachable(reason) => Self::RemoteUnreachable(reason),
            RemoteError::NotFound(id) => {
                Self::RemoteRejected(format!("task {id} not found on remote"))
            }
        }
    }
}

/// User-facing message published once per rolled-back mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Attempt number, matching the mutation log.
    pub seq: u64,
    /// What the user did.
    pub kind: MutationKind,
    /// The task the user acted on.
    pub task_id: TaskId,
    /// Why it failed.
    pub error: MutationError,
}

impl Notice {
    /// One-line text for the status bar.
    #[must_use]
    pub fn message(&self) -> String {
        format!("{} failed and was undone: {}", self.kind, self.error)
    }
}

/// Tunables for the coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Deadline for each remote write.
    pub mutation_timeout: Duration,
    /// Number of records kept in the mutation log.
    pub log_capacity: usize,
    /// Capacity of the notice channel.
    pub notice_buffer: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            mutation_timeout: DEFAULT_MUTATION_TIMEOUT,
            log_capacity: DEFAULT_LOG_CAPACITY,
            notice_buffer: DEFAULT_NOTICE_BUFFER,
        }
    }
}

enum MoveStep {
    Widen(Vec<TaskId>),
    Noop(Task),
    Apply(Snapshot, MovePlan),
}

/// Wraps every change in an optimistic local update followed by a remote
/// commit, with rollback on failure.
pub struct Coordinator<R> {
    store: SharedStore,
    remote: Arc<R>,
    config: CoordinatorConfig,
    locks: LockTable,
    log: Mutex<MutationLog>,
    next_seq: AtomicU64,
    notices: mpsc::Sender<Notice>,
}

impl<R> Coordinator<R> {
    /// Creates a coordinator over `store` and returns the notice receiver
    /// the UI should drain.
    #[must_use]
    pub fn new(
        store: SharedStore,
        remote: Arc<R>,
        config: CoordinatorConfig,
    ) -> (Self, mpsc::Receiver<Notice>) {
        let (notices, notice_rx) = mpsc::channel(config.notice_buffer.max(1));
        let log = Mutex::new(MutationLog::new(config.log_capacity));
        let coordinator = Self {
            store,
            remote,
            config,
            locks: LockTable::new(),
            log,
            next_seq: AtomicU64::new(0),
            notices,
        };
        (coordinator, notice_rx)
    }

    /// The store this coordinator writes to.
    #[must_use]
    pub const fn store(&self) -> &SharedStore {
        &self.store
    }

    /// The remote authority.
    #[must_use]
    pub const fn remote(&self) -> &Arc<R> {
        &self.remote
    }

    /// Recent mutation attempts, oldest first.
    #[must_use]
    pub fn log(&self) -> Vec<MutationRecord> {
        self.log.lock().records()
    }

    /// Number of attempts still waiting for the remote.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.log.lock().pending()
    }

    async fn call<T>(
        &self,
        request: impl Future<Output = Result<T, RemoteError>>,
    ) -> Result<T, MutationError> {
        let deadline = self.config.mutation_timeout;
        match tokio::time::timeout(deadline, request).await {
            Ok(result) => result.map_err(MutationError::from),
            Err(_) => Err(MutationError::TimedOut(deadline)),
        }
    }

    fn begin(&self, kind: MutationKind, task_ids: Vec<TaskId>) -> u64 {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let mut record = MutationRecord::new(seq, kind, task_ids);
        record.advance(MutationState::Pending);
        tracing::debug!(seq, %kind, tasks = record.task_ids.len(), "mutation pending");
        self.log.lock().push(record);
        seq
    }

    fn commit(&self, seq: u64) {
        self.log.lock().update(seq, |record| {
            record.advance(MutationState::Committed);
        });
        tracing::debug!(seq, "mutation committed");
    }

    async fn roll_back(
        &self,
        seq: u64,
        kind: MutationKind,
        task_id: TaskId,
        restore: &[TaskId],
        snapshot: &Snapshot,
        error: &MutationError,
    ) {
        self.store.write(|store| {
            for id in restore {
                store.restore(id, snapshot);
            }
        });
        self.log.lock().update(seq, |record| {
            record.advance(MutationState::RolledBack);
            record.error = Some(error.clone());
        });
        tracing::warn!(seq, %kind, task_id = %task_id, error = %error, "mutation rolled back");

        let notice = Notice {
            seq,
            kind,
            task_id,
            error: error.clone(),
        };
        if self.notices.send(notice).await.is_err() {
            tracing::warn!(seq, "notice receiver closed; rollback not reported");
        }
    }

    fn not_found(kind: MutationKind, id: TaskId) -> MutationError {
        tracing::warn!(task_id = %id, %kind, "mutation target not loaded; ignored");
        MutationError::NotFound(id)
    }
}

impl<R: TaskRemote> Coordinator<R> {
    /// Creates a task.
    ///
    /// A provisional record appears in the store immediately and is swapped
    /// for the remote's record on success, or removed on failure.
    ///
    /// # Errors
    ///
    /// Returns the [`MutationError`] that caused the rollback.
    pub async fn create(&self, fields: NewTask) -> Result<Task, MutationError> {
        let provisional = Task::from_new(TaskId::new(), fields.clone());
        let provisional_id = provisional.id;
        // Held until the provisional id is swapped out or rolled back.
        let _locks = self.locks.acquire(&[provisional_id]).await;
        let snapshot = self.store.write(|store| {
            let snapshot = store.snapshot();
            store.insert(provisional);
            snapshot
        });
        let seq = self.begin(MutationKind::Create, vec![provisional_id]);

        match self.call(self.remote.create(&fields)).await {
            Ok(server) => {
                self.store
                    .write(|store| store.swap_record(&provisional_id, server.clone()));
                self.commit(seq);
                Ok(server)
            }
            Err(error) => {
                self.roll_back(
                    seq,
                    MutationKind::Create,
                    provisional_id,
                    &[provisional_id],
                    &snapshot,
                    &error,
                )
                .await;
                Err(error)
            }
        }
    }

    /// Merges `patch` into a task (edit-save).
    ///
    /// An empty patch is a no-op and is not sent.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::NotFound`] if the task is not loaded, or the
    /// error that caused the rollback.
    pub async fn update(&self, id: TaskId, patch: TaskPatch) -> Result<Task, MutationError> {
        if patch.is_empty() {
            return self
                .store
                .read(|store| store.get(&id).cloned())
                .ok_or_else(|| Self::not_found(MutationKind::Update, id));
        }
        self.patch_one(MutationKind::Update, id, move |_| patch)
            .await
    }

    /// Flips a task between `Done` and `Todo`.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::NotFound`] if the task is not loaded, or the
    /// error that caused the rollback.
    pub async fn toggle_done(&self, id: TaskId) -> Result<Task, MutationError> {
        self.patch_one(MutationKind::ToggleDone, id, |task| {
            let status = if task.status.is_done() {
                TaskStatus::Todo
            } else {
                TaskStatus::Done
            };
            TaskPatch::default().status(status)
        })
        .await
    }

    /// Moves a task's due date to `date`, keeping its time of day.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::NotFound`] if the task is not loaded, or the
    /// error that caused the rollback.
    pub async fn reschedule(
        &self,
        id: TaskId,
        date: chrono::NaiveDate,
    ) -> Result<Task, MutationError> {
        self.patch_one(MutationKind::Reschedule, id, |task| {
            TaskPatch::default().due_date(Some(placement::reschedule_due(task.due_date, date)))
        })
        .await
    }

    /// Removes a task. On failure it reappears at its original position.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::NotFound`] if the task is not loaded, or the
    /// error that caused the rollback.
    pub async fn delete(&self, id: TaskId) -> Result<Task, MutationError> {
        let _locks = self.locks.acquire(&[id]).await;
        let removed = self.store.write(|store| {
            let snapshot = store.snapshot();
            store.remove(&id).map(|(_, task)| (snapshot, task))
        });
        let Some((snapshot, task)) = removed else {
            return Err(Self::not_found(MutationKind::Delete, id));
        };
        let seq = self.begin(MutationKind::Delete, vec![id]);

        match self.call(self.remote.delete(&id)).await {
            Ok(()) => {
                self.commit(seq);
                Ok(task)
            }
            Err(error) => {
                self.roll_back(seq, MutationKind::Delete, id, &[id], &snapshot, &error)
                    .await;
                Err(error)
            }
        }
    }

    /// Drops a task into `column` at `index` (kanban drop).
    ///
    /// `index` counts the destination column's cards without the moved
    /// task. When the neighbours leave no room, the whole column is
    /// renumbered and every renumbered task is part of this mutation. A
    /// drop on the task's current position sends nothing.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::NotFound`] if the task is not loaded, or the
    /// error that caused the rollback.
    pub async fn move_task(
        &self,
        id: TaskId,
        column: Column,
        index: usize,
    ) -> Result<Task, MutationError> {
        let mut wanted = vec![id];
        let (_locks, snapshot, plan) = loop {
            let locks = self.locks.acquire(&wanted).await;
            let step = self.store.write(|store| {
                let plan = placement::plan_move(store.tasks(), &id, column, index)?;
                let ids = plan.task_ids();
                if !locks.covers(&ids) {
                    return Ok(MoveStep::Widen(ids));
                }
                if plan.is_noop() {
                    return store
                        .get(&id)
                        .cloned()
                        .map(MoveStep::Noop)
                        .ok_or(StoreError::NotFound(id));
                }
                let snapshot = store.snapshot();
                for (task_id, patch) in &plan.ops {
                    store.apply_patch(task_id, patch)?;
                }
                Ok(MoveStep::Apply(snapshot, plan))
            });
            match step {
                Ok(MoveStep::Apply(snapshot, plan)) => break (locks, snapshot, plan),
                Ok(MoveStep::Noop(task)) => {
                    tracing::debug!(task_id = %id, %column, index, "drop on current position");
                    return Ok(task);
                }
                Ok(MoveStep::Widen(ids)) => {
                    drop(locks);
                    wanted.extend(ids);
                    wanted.sort_unstable();
                    wanted.dedup();
                }
                Err(StoreError::NotFound(_)) => {
                    return Err(Self::not_found(MutationKind::Move, id));
                }
            }
        };

        let touched = plan.task_ids();
        if plan.is_renumber() {
            tracing::debug!(
                task_id = %id,
                %column,
                writes = plan.ops.len(),
                "no gap; renumbering column"
            );
        }
        let seq = self.begin(MutationKind::Move, touched.clone());
        let outcome = self.send_plan(&plan, &snapshot).await;

        match outcome {
            Ok(confirmed) => {
                let moved = confirmed.iter().find(|t| t.id == id).cloned();
                self.store.write(|store| {
                    for task in confirmed {
                        store.upsert(task);
                    }
                });
                self.commit(seq);
                moved.ok_or(MutationError::NotFound(id))
            }
            Err((error, stuck)) => {
                let restore: Vec<TaskId> = touched
                    .into_iter()
                    .filter(|t| !stuck.iter().any(|s| s.id == *t))
                    .collect();
                if !stuck.is_empty() {
                    self.store.write(|store| {
                        for task in stuck {
                            store.upsert(task);
                        }
                    });
                }
                self.roll_back(seq, MutationKind::Move, id, &restore, &snapshot, &error)
                    .await;
                Err(error)
            }
        }
    }

    /// Completes a drag: delegates to [`move_task`](Self::move_task) or
    /// [`reschedule`](Self::reschedule) and ends the session whatever the
    /// outcome. Returns `None` when no drag is active.
    pub async fn commit_drop(
        &self,
        session: &mut DragSession,
        target: DropTarget,
    ) -> Option<Result<Task, MutationError>> {
        let active = session.end()?;
        let result = match target {
            DropTarget::Column { column, index } => {
                self.move_task(active.task_id, column, index).await
            }
            DropTarget::Day(date) => self.reschedule(active.task_id, date).await,
        };
        Some(result)
    }

    async fn patch_one(
        &self,
        kind: MutationKind,
        id: TaskId,
        make_patch: impl FnOnce(&Task) -> TaskPatch,
    ) -> Result<Task, MutationError> {
        let _locks = self.locks.acquire(&[id]).await;
        let prepared = self.store.write(|store| {
            let patch = make_patch(store.get(&id)?);
            let snapshot = store.snapshot();
            store.apply_patch(&id, &patch).ok()?;
            Some((snapshot, patch))
        });
        let Some((snapshot, patch)) = prepared else {
            return Err(Self::not_found(kind, id));
        };
        let seq = self.begin(kind, vec![id]);

        match self.call(self.remote.update(&id, &patch)).await {
            Ok(server) => {
                self.store.write(|store| store.upsert(server.clone()));
                self.commit(seq);
                Ok(server)
            }
            Err(error) => {
                self.roll_back(seq, kind, id, &[id], &snapshot, &error).await;
                Err(error)
            }
        }
    }

    /// Sends each op of `plan` in order. On the first failure, confirmed
    /// ops are compensated with inverse patches; records whose
    /// compensation also fails are returned with the error so the caller
    /// keeps the remote's state for them.
    async fn send_plan(
        &self,
        plan: &MovePlan,
        snapshot: &Snapshot,
    ) -> Result<Vec<Task>, (MutationError, Vec<Task>)> {
        let mut confirmed: Vec<(Task, &TaskPatch)> = Vec::with_capacity(plan.ops.len());
        for (task_id, patch) in &plan.ops {
            match self.call(self.remote.update(task_id, patch)).await {
                Ok(server) => confirmed.push((server, patch)),
                Err(error) => {
                    let stuck = self.compensate(&confirmed, snapshot).await;
                    return Err((error, stuck));
                }
            }
        }
        Ok(confirmed.into_iter().map(|(task, _)| task).collect())
    }

    async fn compensate(
        &self,
        confirmed: &[(Task, &TaskPatch)],
        snapshot: &Snapshot,
    ) -> Vec<Task> {
        let mut stuck = Vec::new();
        for (server, patch) in confirmed.iter().rev() {
            let Some((_, before)) = snapshot.find(&server.id) else {
                continue;
            };
            let inverse = Task::inverse_of(before, patch);
            if let Err(error) = self.call(self.remote.update(&server.id, &inverse)).await {
                tracing::warn!(
                    task_id = %server.id,
                    error = %error,
                    "compensating write failed; keeping remote state"
                );
                stuck.push(server.clone());
            }
        }
        stuck
    }
}

impl<R: TaskRemote + ProjectRemote> Coordinator<R> {
    /// Replaces the store with the remote's full task and project lists.
    /// Returns the number of tasks loaded.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::RemoteUnreachable`] or
    /// [`MutationError::TimedOut`] if either list call fails; the store is
    /// left unchanged.
    pub async fn reload(&self) -> Result<usize, MutationError> {
        let tasks = self.call(TaskRemote::list(&*self.remote)).await?;
        let projects = self.call(ProjectRemote::list(&*self.remote)).await?;
        let count = tasks.len();
        self.store.write(|store| {
            store.replace(tasks);
            store.set_projects(projects);
        });
        tracing::info!(tasks = count, "store reloaded");
        Ok(count)
    }
}

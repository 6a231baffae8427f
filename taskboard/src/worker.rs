//! Board worker: wires the TUI to the async coordinator.
//!
//! This module bridges the synchronous TUI event loop (crossterm poll-based)
//! with the async [`Coordinator`]. It spawns background tokio tasks and
//! communicates with the main thread via [`BoardCommand`] / [`BoardEvent`]
//! channels.
//!
//! # Architecture
//!
//! ```text
//! TUI (main thread)  ←── BoardEvent ───  tokio background tasks
//!                     ─── BoardCommand →
//! ```
//!
//! Each mutation command runs on its own tokio task, so mutations on
//! different tasks overlap. Optimistic changes show up through the store's
//! version channel; the events here only report outcomes.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::mpsc;

use taskboard_proto::task::{NewTask, TaskId, TaskPatch};

use crate::coordinator::state::MutationKind;
use crate::coordinator::{Coordinator, MutationError, Notice};
use crate::projector::kanban::Column;
use crate::remote::{ProjectRemote, TaskRemote};

/// Commands sent from the TUI main loop to the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardCommand {
    /// Create a task.
    Create(NewTask),
    /// Save edits to a task.
    Update {
        /// Target task.
        id: TaskId,
        /// Fields to change.
        patch: TaskPatch,
    },
    /// Delete a task.
    Delete(TaskId),
    /// Flip a task between done and to-do.
    ToggleDone(TaskId),
    /// Kanban drop.
    Move {
        /// Dragged task.
        id: TaskId,
        /// Destination column.
        column: Column,
        /// Insertion index, counted without the dragged task.
        index: usize,
    },
    /// Calendar drop.
    Reschedule {
        /// Dragged task.
        id: TaskId,
        /// Destination day.
        date: NaiveDate,
    },
    /// Reload everything from the remote.
    Reload,
    /// Stop the worker.
    Shutdown,
}

/// Events sent from the worker to the TUI main loop.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    /// A mutation was confirmed by the remote.
    Committed {
        /// What the user did.
        kind: MutationKind,
        /// The task acted on.
        task_id: TaskId,
    },
    /// A mutation failed and was rolled back.
    RolledBack(Notice),
    /// A mutation targeted a task that is not loaded; nothing happened.
    Ignored {
        /// What the user tried.
        kind: MutationKind,
        /// The missing task.
        task_id: TaskId,
    },
    /// A reload finished.
    Reloaded {
        /// Number of tasks loaded.
        tasks: usize,
    },
    /// A non-mutation failure (e.g. reload).
    Error(String),
}

/// Configuration for the worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Channel capacity for command/event mpsc channels.
    pub channel_capacity: usize,
}

/// Default channel capacity for commands and events.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Spawn the worker tasks and return channel handles.
///
/// Spawns:
///
/// 1. A **command handler** that runs each [`BoardCommand`] on its own task.
/// 2. A **notice forwarder** that maps rollback [`Notice`]s to
///    [`BoardEvent::RolledBack`].
///
/// Must be called from within a tokio runtime.
pub fn spawn_worker<R>(
    coordinator: Arc<Coordinator<R>>,
    notices: mpsc::Receiver<Notice>,
    config: &WorkerConfig,
) -> (mpsc::Sender<BoardCommand>, mpsc::Receiver<BoardEvent>)
where
    R: TaskRemote + ProjectRemote + 'static,
{
    let capacity = config.channel_capacity.max(1);
    let (cmd_tx, cmd_rx) = mpsc::channel::<BoardCommand>(capacity);
    let (evt_tx, evt_rx) = mpsc::channel::<BoardEvent>(capacity);

    let cmd_evt_tx = evt_tx.clone();
    tokio::spawn(async move {
        command_handler(coordinator, cmd_rx, cmd_evt_tx).await;
    });

    tokio::spawn(async move {
        notice_forwarder(notices, evt_tx).await;
    });

    (cmd_tx, evt_rx)
}

/// Background task: handle commands from the TUI main loop.
async fn command_handler<R>(
    coordinator: Arc<Coordinator<R>>,
    mut cmd_rx: mpsc::Receiver<BoardCommand>,
    evt_tx: mpsc::Sender<BoardEvent>,
) where
    R: TaskRemote + ProjectRemote + 'static,
{
    while let Some(cmd) = cmd_rx.recv().await {
        if cmd == BoardCommand::Shutdown {
            tracing::info!("board worker shutting down");
            break;
        }
        let coordinator = Arc::clone(&coordinator);
        let evt_tx = evt_tx.clone();
        tokio::spawn(async move {
            if let Some(event) = run_command(&coordinator, cmd).await
                && evt_tx.send(event).await.is_err()
            {
                tracing::debug!("TUI dropped; event discarded");
            }
        });
    }
}

/// Runs one command and maps its outcome to an event.
///
/// Rollbacks return `None`: they reach the TUI through the notice channel.
async fn run_command<R>(coordinator: &Coordinator<R>, cmd: BoardCommand) -> Option<BoardEvent>
where
    R: TaskRemote + ProjectRemote,
{
    let (kind, task_id, result) = match cmd {
        BoardCommand::Create(fields) => {
            let result = coordinator.create(fields).await;
            let task_id = result.as_ref().map(|t| t.id).unwrap_or_default();
            (MutationKind::Create, task_id, result.map(|_| ()))
        }
        BoardCommand::Update { id, patch } => (
            MutationKind::Update,
            id,
            coordinator.update(id, patch).await.map(|_| ()),
        ),
        BoardCommand::Delete(id) => (
            MutationKind::Delete,
            id,
            coordinator.delete(id).await.map(|_| ()),
        ),
        BoardCommand::ToggleDone(id) => (
            MutationKind::ToggleDone,
            id,
            coordinator.toggle_done(id).await.map(|_| ()),
        ),
        BoardCommand::Move { id, column, index } => (
            MutationKind::Move,
            id,
            coordinator.move_task(id, column, index).await.map(|_| ()),
        ),
        BoardCommand::Reschedule { id, date } => (
            MutationKind::Reschedule,
            id,
            coordinator.reschedule(id, date).await.map(|_| ()),
        ),
        BoardCommand::Reload => {
            return Some(match coordinator.reload().await {
                Ok(tasks) => BoardEvent::Reloaded { tasks },
                Err(e) => BoardEvent::Error(format!("Reload failed: {e}")),
            });
        }
        BoardCommand::Shutdown => return None,
    };

    match result {
        Ok(()) => Some(BoardEvent::Committed { kind, task_id }),
        Err(MutationError::NotFound(_)) => Some(BoardEvent::Ignored { kind, task_id }),
        Err(_) => None,
    }
}

/// Background task: forward rollback notices to the TUI.
async fn notice_forwarder(mut notices: mpsc::Receiver<Notice>, evt_tx: mpsc::Sender<BoardEvent>) {
    while let Some(notice) = notices.recv().await {
        if evt_tx.send(BoardEvent::RolledBack(notice)).await.is_err() {
            // TUI dropped; exit.
            break;
        }
    }
}

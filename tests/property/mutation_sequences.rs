//! Property-based tests for sequences of optimistic mutations.
//!
//! Uses proptest to run arbitrary mixes of create, rename, toggle, move and
//! delete against the in-memory remote, and verifies after every step:
//! 1. The store holds exactly one record per task id.
//! 2. The store's ids are the ids present before the step, plus the created
//!    id or minus the deleted id.
//! 3. The store's records equal the remote's, field for field, including
//!    after a rejected write.
//! 4. An edit aimed at a task whose create is still in flight never leaves
//!    a record behind that the remote does not know.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use taskboard::coordinator::{Coordinator, CoordinatorConfig, MutationError};
use taskboard::projector::kanban::Column;
use taskboard::remote::RemoteError;
use taskboard::remote::memory::InMemoryRemote;
use taskboard::remote::seed::Seed;
use taskboard::store::{SharedStore, TaskStore};
use taskboard_proto::task::{NewTask, Task, TaskId, TaskPatch, TaskStatus};

#[derive(Debug, Clone)]
enum Op {
    Create(String),
    Rename(usize, String),
    Toggle(usize),
    Move(usize, Column, usize),
    Delete(usize),
    RejectedToggle(usize),
    ToggleWhileCreating(String),
    DeleteWhileCreating(String),
}

// --- Strategies ---

fn arb_title() -> impl Strategy<Value = String> {
    "[a-z]{1,12}"
}

fn arb_column() -> impl Strategy<Value = Column> {
    prop::sample::select(Column::ALL.to_vec())
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => arb_title().prop_map(Op::Create),
        2 => (any::<usize>(), arb_title()).prop_map(|(pick, title)| Op::Rename(pick, title)),
        3 => any::<usize>().prop_map(Op::Toggle),
        3 => (any::<usize>(), arb_column(), 0_usize..6)
            .prop_map(|(pick, column, index)| Op::Move(pick, column, index)),
        2 => any::<usize>().prop_map(Op::Delete),
        1 => any::<usize>().prop_map(Op::RejectedToggle),
        1 => arb_title().prop_map(Op::ToggleWhileCreating),
        1 => arb_title().prop_map(Op::DeleteWhileCreating),
    ]
}

/// Starting boards of up to 6 tasks spread over the statuses.
fn arb_seed() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec(prop::sample::select(TaskStatus::ALL.to_vec()), 0..6).prop_map(
        |statuses| {
            statuses
                .into_iter()
                .enumerate()
                .map(|(n, status)| {
                    let id = TaskId::from_u128(u128::try_from(n).unwrap() + 1);
                    let mut task = Task::from_new(id, NewTask::new(format!("t{n}"), status));
                    task.order = i64::try_from(n).unwrap() * 10;
                    task
                })
                .collect()
        },
    )
}

// --- Helpers ---

fn by_id(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by_key(|t| t.id);
    tasks
}

fn pick(store: &SharedStore, pick: usize) -> Option<TaskId> {
    store.read(|s| {
        let tasks = s.tasks();
        (!tasks.is_empty()).then(|| tasks[pick % tasks.len()].id)
    })
}

/// The id in the store that no committed step has produced yet.
fn provisional(store: &SharedStore, known: &BTreeSet<TaskId>) -> Option<TaskId> {
    store.read(|s| s.tasks().iter().map(|t| t.id).find(|id| !known.contains(id)))
}

fn check_in_sync(
    store: &SharedStore,
    remote: &InMemoryRemote,
    expected: &BTreeSet<TaskId>,
) -> Result<(), TestCaseError> {
    let local = by_id(store.list());
    let ids: Vec<TaskId> = local.iter().map(|t| t.id).collect();
    let unique: BTreeSet<TaskId> = ids.iter().copied().collect();

    prop_assert_eq!(unique.len(), ids.len(), "duplicate ids in store");
    prop_assert_eq!(&unique, expected);
    prop_assert_eq!(local, by_id(remote.tasks()));
    Ok(())
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

/// Creates a task and, while the remote is still answering, toggles or
/// deletes the provisional card the way a quick key press would.
async fn edit_while_creating(
    coordinator: &Coordinator<InMemoryRemote>,
    store: &SharedStore,
    expected: &mut BTreeSet<TaskId>,
    title: String,
    delete: bool,
) -> Result<(), TestCaseError> {
    let known = expected.clone();
    let follow_up = async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        let id = provisional(store, &known)?;
        Some(if delete {
            coordinator.delete(id).await
        } else {
            coordinator.toggle_done(id).await
        })
    };
    let (created, follow_up) = tokio::join!(
        coordinator.create(NewTask::new(title, TaskStatus::Backlog)),
        follow_up,
    );
    prop_assert!(created.is_ok(), "create failed: {created:?}");
    expected.insert(created.unwrap().id);
    if let Some(result) = follow_up {
        prop_assert!(
            matches!(result, Err(MutationError::NotFound(_))),
            "edit of a provisional id: {result:?}"
        );
    }
    Ok(())
}

async fn run_sequence(seed: Vec<Task>, ops: Vec<Op>) -> Result<(), TestCaseError> {
    let remote = Arc::new(InMemoryRemote::from_seed(Seed {
        projects: Vec::new(),
        tasks: seed.clone(),
    }));
    remote.set_latency(Duration::from_millis(20));
    let store = SharedStore::new(TaskStore::with_tasks(seed.clone()));
    let (coordinator, _) =
        Coordinator::new(store.clone(), Arc::clone(&remote), CoordinatorConfig::default());
    let mut expected: BTreeSet<TaskId> = seed.iter().map(|t| t.id).collect();

    for op in ops {
        match op {
            Op::Create(title) => {
                let created = coordinator
                    .create(NewTask::new(title, TaskStatus::Todo))
                    .await;
                prop_assert!(created.is_ok(), "create failed: {created:?}");
                expected.insert(created.unwrap().id);
            }
            Op::Rename(n, title) => {
                if let Some(id) = pick(&store, n) {
                    let renamed = coordinator
                        .update(id, TaskPatch::default().title(title))
                        .await;
                    prop_assert!(renamed.is_ok(), "rename failed: {renamed:?}");
                }
            }
            Op::Toggle(n) => {
                if let Some(id) = pick(&store, n) {
                    prop_assert!(coordinator.toggle_done(id).await.is_ok());
                }
            }
            Op::Move(n, column, index) => {
                if let Some(id) = pick(&store, n) {
                    let moved = coordinator.move_task(id, column, index).await;
                    prop_assert!(moved.is_ok(), "move failed: {moved:?}");
                }
            }
            Op::Delete(n) => {
                if let Some(id) = pick(&store, n) {
                    prop_assert!(coordinator.delete(id).await.is_ok());
                    expected.remove(&id);
                }
            }
            Op::RejectedToggle(n) => {
                if let Some(id) = pick(&store, n) {
                    remote.fail_next(RemoteError::Rejected("conflict".to_string()));
                    let result = coordinator.toggle_done(id).await;
                    prop_assert_eq!(
                        result.unwrap_err(),
                        MutationError::RemoteRejected("conflict".to_string())
                    );
                }
            }
            Op::ToggleWhileCreating(title) => {
                edit_while_creating(&coordinator, &store, &mut expected, title, false).await?;
            }
            Op::DeleteWhileCreating(title) => {
                edit_while_creating(&coordinator, &store, &mut expected, title, true).await?;
            }
        }
        check_in_sync(&store, &remote, &expected)?;
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn store_tracks_remote_through_any_sequence(
        seed in arb_seed(),
        ops in prop::collection::vec(arb_op(), 1..16),
    ) {
        runtime().block_on(run_sequence(seed, ops))?;
    }
}

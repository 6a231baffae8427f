//! Integration tests for optimistic mutations against a remote authority.
//!
//! Covers apply-before-confirm, rollback on rejection and timeouts,
//! interleaved mutations on different tasks, and queuing of mutations on
//! the same task.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::similar_names)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use taskboard::coordinator::state::{MutationKind, MutationState};
use taskboard::coordinator::{Coordinator, CoordinatorConfig, MutationError, Notice};
use taskboard::projector::kanban::Column;
use taskboard::remote::RemoteError;
use taskboard::remote::memory::{InMemoryRemote, RemoteCall};
use taskboard::remote::seed::Seed;
use taskboard::store::{SharedStore, TaskStore};
use taskboard_proto::task::{NewTask, Priority, Task, TaskId, TaskPatch, TaskStatus};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

struct Fixture {
    coordinator: Coordinator<InMemoryRemote>,
    notices: mpsc::Receiver<Notice>,
    remote: Arc<InMemoryRemote>,
    store: SharedStore,
}

fn fixture_with(tasks: Vec<Task>, config: CoordinatorConfig) -> Fixture {
    let remote = Arc::new(InMemoryRemote::from_seed(Seed {
        projects: Vec::new(),
        tasks: tasks.clone(),
    }));
    let store = SharedStore::new(TaskStore::with_tasks(tasks));
    let (coordinator, notices) = Coordinator::new(store.clone(), Arc::clone(&remote), config);
    Fixture {
        coordinator,
        notices,
        remote,
        store,
    }
}

fn fixture(tasks: Vec<Task>) -> Fixture {
    fixture_with(tasks, CoordinatorConfig::default())
}

fn make_task(n: u128, status: TaskStatus, order: i64) -> Task {
    let mut task = Task::from_new(TaskId::from_u128(n), NewTask::new(format!("Task {n}"), status));
    task.order = order;
    task
}

fn id(n: u128) -> TaskId {
    TaskId::from_u128(n)
}

fn stored(store: &SharedStore, n: u128) -> Option<Task> {
    store.read(|s| s.get(&id(n)).cloned())
}

// ===========================================================================
// Commit and rollback
// ===========================================================================

#[tokio::test]
async fn rejected_toggle_restores_status_and_notifies_once() {
    let mut fx = fixture(vec![make_task(5, TaskStatus::Todo, 0)]);
    fx.remote
        .fail_next(RemoteError::Rejected("workflow locked".to_string()));

    let err = fx.coordinator.toggle_done(id(5)).await.unwrap_err();

    assert_eq!(
        err,
        MutationError::RemoteRejected("workflow locked".to_string())
    );
    assert_eq!(stored(&fx.store, 5).unwrap().status, TaskStatus::Todo);

    let notice = fx.notices.try_recv().unwrap();
    assert_eq!(notice.kind, MutationKind::ToggleDone);
    assert_eq!(notice.task_id, id(5));
    assert!(notice.message().contains("workflow locked"));
    assert!(fx.notices.try_recv().is_err(), "exactly one notice");
}

#[tokio::test]
async fn drop_after_last_card_takes_next_order() {
    let fx = fixture(vec![
        make_task(1, TaskStatus::Todo, 10),
        make_task(2, TaskStatus::Todo, 20),
    ]);

    let moved = fx
        .coordinator
        .move_task(id(1), Column::Backlog, 1)
        .await
        .unwrap();

    assert_eq!(moved.order, 30);
    assert_eq!(moved.status, TaskStatus::Todo);
    assert_eq!(stored(&fx.store, 2).unwrap().order, 20);
    assert_eq!(
        fx.remote.calls(),
        vec![RemoteCall::Update(id(1), TaskPatch::default().order(30))]
    );
}

#[tokio::test(start_paused = true)]
async fn patch_is_visible_while_remote_call_is_pending() {
    let fx = fixture(vec![make_task(1, TaskStatus::Todo, 0)]);
    fx.remote.set_latency(Duration::from_millis(500));

    let mut changes = fx.store.subscribe();
    let store = fx.store.clone();
    let observe = async move {
        changes.changed().await.unwrap();
        store.read(|s| s.get(&id(1)).map(|t| t.status))
    };

    let (result, seen) = tokio::join!(fx.coordinator.toggle_done(id(1)), observe);

    assert_eq!(seen, Some(TaskStatus::Done));
    assert_eq!(result.unwrap().status, TaskStatus::Done);
    assert_eq!(fx.coordinator.pending(), 0);
}

#[tokio::test]
async fn offline_remote_rolls_back_as_unreachable() {
    let mut fx = fixture(vec![make_task(1, TaskStatus::InProgress, 0)]);
    fx.remote.set_offline(true);

    let err = fx
        .coordinator
        .update(id(1), TaskPatch::default().title("Renamed"))
        .await
        .unwrap_err();

    assert!(matches!(err, MutationError::RemoteUnreachable(_)));
    assert_eq!(stored(&fx.store, 1).unwrap().title, "Task 1");
    assert!(fx.notices.try_recv().is_ok());
}

#[tokio::test(start_paused = true)]
async fn slow_remote_times_out_and_rolls_back() {
    let config = CoordinatorConfig {
        mutation_timeout: Duration::from_secs(2),
        ..CoordinatorConfig::default()
    };
    let mut fx = fixture_with(vec![make_task(1, TaskStatus::Todo, 0)], config);
    fx.remote.set_latency(Duration::from_secs(30));

    let err = fx.coordinator.toggle_done(id(1)).await.unwrap_err();

    assert_eq!(err, MutationError::TimedOut(Duration::from_secs(2)));
    assert_eq!(stored(&fx.store, 1).unwrap().status, TaskStatus::Todo);
    let notice = fx.notices.try_recv().unwrap();
    assert_eq!(notice.error, err);
}

#[tokio::test]
async fn every_rollback_is_reported_with_small_notice_buffer() {
    let config = CoordinatorConfig {
        notice_buffer: 1,
        ..CoordinatorConfig::default()
    };
    let Fixture {
        coordinator,
        mut notices,
        remote,
        ..
    } = fixture_with(
        vec![
            make_task(1, TaskStatus::Todo, 0),
            make_task(2, TaskStatus::Todo, 10),
            make_task(3, TaskStatus::Todo, 20),
        ],
        config,
    );
    remote.set_offline(true);

    let mutations = async {
        for n in 1..=3 {
            coordinator.toggle_done(id(n)).await.unwrap_err();
        }
    };
    let drain = async {
        let mut seen = Vec::new();
        while seen.len() < 3 {
            seen.push(notices.recv().await.unwrap().task_id);
        }
        seen
    };
    let ((), seen) = tokio::join!(mutations, drain);

    assert_eq!(seen, vec![id(1), id(2), id(3)]);
}

#[tokio::test]
async fn failed_delete_reappears_in_place() {
    let fx = fixture(vec![
        make_task(1, TaskStatus::Todo, 0),
        make_task(2, TaskStatus::Todo, 10),
        make_task(3, TaskStatus::Todo, 20),
    ]);
    fx.remote
        .fail_next(RemoteError::Unreachable("connection reset".to_string()));

    fx.coordinator.delete(id(2)).await.unwrap_err();

    let ids: Vec<TaskId> = fx.store.list().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![id(1), id(2), id(3)]);
}

#[tokio::test]
async fn create_takes_remote_identity() {
    let fx = fixture(Vec::new());

    let created = fx
        .coordinator
        .create(NewTask::new("Write release notes", TaskStatus::Backlog))
        .await
        .unwrap();

    let tasks = fx.store.list();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, created.id);
    assert_eq!(fx.remote.task(&created.id).unwrap().title, "Write release notes");
}

#[tokio::test]
async fn rejected_create_leaves_no_trace() {
    let mut fx = fixture(vec![make_task(1, TaskStatus::Todo, 0)]);

    let err = fx
        .coordinator
        .create(NewTask::new("   ", TaskStatus::Todo))
        .await
        .unwrap_err();

    assert!(matches!(err, MutationError::RemoteRejected(_)));
    assert_eq!(fx.store.list(), vec![make_task(1, TaskStatus::Todo, 0)]);
    assert_eq!(fx.notices.try_recv().unwrap().kind, MutationKind::Create);
}

#[tokio::test]
async fn missing_task_sends_nothing() {
    let mut fx = fixture(Vec::new());

    let err = fx.coordinator.toggle_done(id(404)).await.unwrap_err();

    assert_eq!(err, MutationError::NotFound(id(404)));
    assert!(fx.remote.calls().is_empty());
    assert!(fx.coordinator.log().is_empty());
    assert!(fx.notices.try_recv().is_err());
}

// ===========================================================================
// Interleaving
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn edit_of_provisional_task_waits_for_create() {
    let mut fx = fixture(Vec::new());
    fx.remote.set_latency(Duration::from_millis(100));

    let quick_toggle = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let provisional = fx.store.list()[0].id;
        (provisional, fx.coordinator.toggle_done(provisional).await)
    };
    let (created, (provisional, toggled)) = tokio::join!(
        fx.coordinator
            .create(NewTask::new("Fresh", TaskStatus::Todo)),
        quick_toggle,
    );

    let created = created.unwrap();
    assert_ne!(created.id, provisional);
    assert_eq!(toggled.unwrap_err(), MutationError::NotFound(provisional));
    assert_eq!(fx.store.list(), fx.remote.tasks());
    assert!(fx.notices.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn delete_of_provisional_task_leaves_created_record() {
    let fx = fixture(Vec::new());
    fx.remote.set_latency(Duration::from_millis(100));

    let quick_delete = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let provisional = fx.store.list()[0].id;
        fx.coordinator.delete(provisional).await
    };
    let (created, deleted) = tokio::join!(
        fx.coordinator
            .create(NewTask::new("Fresh", TaskStatus::Todo)),
        quick_delete,
    );

    assert!(matches!(deleted, Err(MutationError::NotFound(_))));
    assert_eq!(fx.store.list(), vec![created.unwrap()]);
    assert_eq!(fx.store.list(), fx.remote.tasks());
}

#[tokio::test(start_paused = true)]
async fn rollback_of_one_task_keeps_concurrent_edit_of_another() {
    let fx = fixture(vec![
        make_task(1, TaskStatus::Todo, 0),
        make_task(2, TaskStatus::Todo, 10),
    ]);
    fx.remote.set_latency(Duration::from_millis(200));
    fx.remote
        .fail_next(RemoteError::Rejected("stale".to_string()));

    let (first, second) = tokio::join!(
        fx.coordinator.toggle_done(id(1)),
        fx.coordinator
            .update(id(2), TaskPatch::default().title("Edited meanwhile")),
    );

    assert!(first.is_err());
    assert!(second.is_ok());
    assert_eq!(stored(&fx.store, 1).unwrap().status, TaskStatus::Todo);
    assert_eq!(stored(&fx.store, 2).unwrap().title, "Edited meanwhile");

    let states: Vec<MutationState> = fx.coordinator.log().iter().map(|r| r.state).collect();
    assert_eq!(states, vec![MutationState::RolledBack, MutationState::Committed]);
}

#[tokio::test(start_paused = true)]
async fn second_edit_of_same_task_waits_for_first() {
    let fx = fixture(vec![make_task(1, TaskStatus::Todo, 0)]);
    fx.remote.set_latency(Duration::from_millis(200));
    fx.remote
        .fail_next(RemoteError::Rejected("title taken".to_string()));

    let (first, second) = tokio::join!(
        fx.coordinator
            .update(id(1), TaskPatch::default().title("Duplicate")),
        fx.coordinator
            .update(id(1), TaskPatch::default().priority(Priority::High)),
    );

    assert!(first.is_err());
    let confirmed = second.unwrap();
    assert_eq!(confirmed.title, "Task 1");
    assert_eq!(confirmed.priority, Priority::High);

    let local = stored(&fx.store, 1).unwrap();
    assert_eq!(local, fx.remote.task(&id(1)).unwrap());
}

#[tokio::test(start_paused = true)]
async fn pending_count_tracks_in_flight_mutations() {
    let fx = fixture(vec![
        make_task(1, TaskStatus::Todo, 0),
        make_task(2, TaskStatus::Todo, 10),
    ]);
    fx.remote.set_latency(Duration::from_millis(300));

    let probe = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        fx.coordinator.pending()
    };
    let (a, b, in_flight) = tokio::join!(
        fx.coordinator.toggle_done(id(1)),
        fx.coordinator.toggle_done(id(2)),
        probe,
    );

    assert!(a.is_ok() && b.is_ok());
    assert_eq!(in_flight, 2);
    assert_eq!(fx.coordinator.pending(), 0);
}

// ===========================================================================
// Reload
// ===========================================================================

#[tokio::test]
async fn reload_replaces_local_state_with_remote() {
    let fx = fixture(vec![make_task(1, TaskStatus::Todo, 0)]);
    fx.store.write(|s| s.replace(Vec::new()));

    let count = fx.coordinator.reload().await.unwrap();

    assert_eq!(count, 1);
    assert_eq!(fx.store.list(), fx.remote.tasks());
}

#[tokio::test]
async fn failed_reload_keeps_store() {
    let mut fx = fixture(vec![make_task(1, TaskStatus::Todo, 0)]);
    fx.store.write(|s| s.replace(vec![make_task(9, TaskStatus::Done, 0)]));
    fx.remote.set_offline(true);

    let err = fx.coordinator.reload().await.unwrap_err();

    assert!(matches!(err, MutationError::RemoteUnreachable(_)));
    assert_eq!(fx.store.list(), vec![make_task(9, TaskStatus::Done, 0)]);
    assert!(fx.notices.try_recv().is_err());
}

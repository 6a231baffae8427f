//! Property-based tests for kanban drop placement.
//!
//! Uses proptest to verify, for arbitrary columns and drops:
//! 1. After applying a plan, the moved task sits at the requested index of
//!    its destination column.
//! 2. Every other task keeps its relative order.
//! 3. Planning is deterministic.
//! 4. With no filter, a visible drop index maps to itself.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use taskboard::coordinator::placement::plan_move;
use taskboard::projector::TaskFilter;
use taskboard::projector::kanban::{self, Column};
use taskboard_proto::task::{NewTask, Task, TaskId, TaskStatus};

// --- Strategies ---

/// Strategy for a status from each column, including the folded ones.
fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop::sample::select(TaskStatus::ALL.to_vec())
}

fn arb_column() -> impl Strategy<Value = Column> {
    prop::sample::select(Column::ALL.to_vec())
}

/// Boards of up to 12 tasks with tightly packed, often colliding orders so
/// both the midpoint and the renumber paths are exercised. Extreme orders
/// cover overflow at the ends.
fn arb_board() -> impl Strategy<Value = Vec<Task>> {
    let order = prop_oneof![
        8 => -20_i64..20,
        1 => Just(i64::MAX),
        1 => Just(i64::MIN),
    ];
    prop::collection::vec((arb_status(), order), 1..12).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(n, (status, order))| {
                let id = TaskId::from_u128(u128::try_from(n).unwrap() + 1);
                let mut task = Task::from_new(id, NewTask::new(format!("t{n}"), status));
                task.order = order;
                task
            })
            .collect()
    })
}

fn apply_plan(tasks: &[Task], moved: &TaskId, column: Column, index: usize) -> Vec<Task> {
    let plan = plan_move(tasks, moved, column, index).unwrap();
    let mut after = tasks.to_vec();
    for (id, patch) in &plan.ops {
        after.iter_mut().find(|t| t.id == *id).unwrap().apply(patch);
    }
    after
}

fn column_ids(tasks: &[Task], column: Column) -> Vec<TaskId> {
    kanban::column_tasks(tasks, column)
        .into_iter()
        .map(|t| t.id)
        .collect()
}

proptest! {
    #[test]
    fn moved_task_lands_at_requested_index(
        tasks in arb_board(),
        pick in any::<prop::sample::Index>(),
        column in arb_column(),
        index in 0_usize..16,
    ) {
        let moved = tasks[pick.index(tasks.len())].id;
        let siblings: Vec<TaskId> = column_ids(&tasks, column)
            .into_iter()
            .filter(|id| *id != moved)
            .collect();
        let expected_index = index.min(siblings.len());

        let after = apply_plan(&tasks, &moved, column, index);
        let landed = column_ids(&after, column);

        prop_assert_eq!(landed.iter().position(|id| *id == moved), Some(expected_index));
        let others: Vec<TaskId> = landed.into_iter().filter(|id| *id != moved).collect();
        prop_assert_eq!(others, siblings);
        prop_assert_eq!(after.len(), tasks.len());
    }

    #[test]
    fn source_column_keeps_relative_order(
        tasks in arb_board(),
        pick in any::<prop::sample::Index>(),
        column in arb_column(),
        index in 0_usize..16,
    ) {
        let moved_task = &tasks[pick.index(tasks.len())];
        let moved = moved_task.id;
        let source = Column::of(moved_task.status);
        prop_assume!(source != column);

        let before: Vec<TaskId> = column_ids(&tasks, source)
            .into_iter()
            .filter(|id| *id != moved)
            .collect();
        let after = apply_plan(&tasks, &moved, column, index);

        prop_assert_eq!(column_ids(&after, source), before);
        let status = after.iter().find(|t| t.id == moved).unwrap().status;
        prop_assert_eq!(status, column.drop_status());
    }

    #[test]
    fn planning_is_deterministic(
        tasks in arb_board(),
        pick in any::<prop::sample::Index>(),
        column in arb_column(),
        index in 0_usize..16,
    ) {
        let moved = tasks[pick.index(tasks.len())].id;
        prop_assert_eq!(
            plan_move(&tasks, &moved, column, index).unwrap(),
            plan_move(&tasks, &moved, column, index).unwrap()
        );
    }

    #[test]
    fn unfiltered_index_is_identity_without_filter(
        tasks in arb_board(),
        pick in any::<prop::sample::Index>(),
        column in arb_column(),
        index in 0_usize..16,
    ) {
        let moved = tasks[pick.index(tasks.len())].id;
        let board = kanban::group(&tasks, &[], &TaskFilter::default());
        let visible = board.cards(column);
        let slots = visible.iter().filter(|c| c.task.id != moved).count();

        let mapped = kanban::unfiltered_index(&tasks, column, visible, index, &moved);
        prop_assert_eq!(mapped, index.min(slots));
    }
}

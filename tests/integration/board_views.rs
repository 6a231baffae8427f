//! Integration tests for the board, calendar and report projections.
//!
//! Every projection reads the same task list; these tests check that the
//! views agree with each other and follow the store through a mutation.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use taskboard::coordinator::{Coordinator, CoordinatorConfig};
use taskboard::projector::calendar::{self, CalendarEvent, DateWindow};
use taskboard::projector::kanban::{self, Column};
use taskboard::projector::report::{self, NO_PROJECT_NAME, ReportFilter};
use taskboard::projector::{TaskFilter, UNKNOWN_PROJECT_NAME};
use taskboard::remote::memory::InMemoryRemote;
use taskboard::remote::seed::Seed;
use taskboard::store::SharedStore;
use taskboard_proto::project::{ClientId, Project, ProjectId};
use taskboard_proto::task::{NewTask, Task, TaskId, TaskStatus, UserId};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, 0, 0).unwrap()
}

fn project(n: u128, name: &str, client: &str, start: Option<NaiveDate>) -> Project {
    Project {
        id: ProjectId::from_u128(n),
        name: name.to_string(),
        color: "#112233".to_string(),
        client_id: Some(ClientId::new(client)),
        start_date: start,
        due_date: None,
    }
}

fn make_task(n: u128, status: TaskStatus, project: Option<u128>) -> Task {
    let mut task = Task::from_new(TaskId::from_u128(n), NewTask::new(format!("Task {n}"), status));
    task.project_id = project.map(ProjectId::from_u128);
    task.order = i64::try_from(n).unwrap() * 10;
    task
}

/// Two projects for two clients, and tasks across every column.
fn board() -> (Vec<Task>, Vec<Project>) {
    let projects = vec![
        project(100, "Website", "acme", Some(date(2024, 3, 1))),
        project(200, "Mobile", "globex", Some(date(2024, 3, 18))),
    ];

    let mut tasks = vec![
        make_task(1, TaskStatus::Todo, Some(100)),
        make_task(2, TaskStatus::InProgress, Some(100)),
        make_task(3, TaskStatus::Testing, Some(200)),
        make_task(4, TaskStatus::Done, Some(200)),
        make_task(5, TaskStatus::Blocked, None),
        make_task(6, TaskStatus::Done, Some(999)),
    ];
    tasks[0].due_date = Some(at(2024, 3, 1, 9));
    tasks[1].due_date = Some(at(2024, 3, 18, 15));
    tasks[2].due_date = Some(at(2024, 3, 18, 11));
    tasks[3].due_date = Some(at(2024, 4, 2, 10));
    tasks[0].assignee_id = Some(UserId::new("me"));
    tasks[3].assignee_id = Some(UserId::new("me"));
    tasks[1].hours = Some(4.0);
    tasks[3].hours = Some(2.5);
    tasks[5].hours = Some(1.0);
    (tasks, projects)
}

fn card_ids(board: &kanban::KanbanBoard, column: Column) -> Vec<TaskId> {
    board.cards(column).iter().map(|c| c.task.id).collect()
}

// ===========================================================================
// Kanban
// ===========================================================================

#[test]
fn every_task_lands_in_exactly_one_column() {
    let (tasks, projects) = board();
    let projected = kanban::group(&tasks, &projects, &TaskFilter::default());

    let total: usize = Column::ALL.iter().map(|c| projected.cards(*c).len()).sum();
    assert_eq!(total, tasks.len());
    assert_eq!(
        card_ids(&projected, Column::Backlog),
        vec![TaskId::from_u128(1), TaskId::from_u128(5)]
    );
    assert_eq!(
        card_ids(&projected, Column::Done),
        vec![TaskId::from_u128(4), TaskId::from_u128(6)]
    );
}

#[test]
fn card_for_unloaded_project_gets_placeholder() {
    let (tasks, projects) = board();
    let projected = kanban::group(&tasks, &projects, &TaskFilter::default());

    let orphan = projected
        .cards(Column::Done)
        .iter()
        .find(|c| c.task.id == TaskId::from_u128(6))
        .unwrap();
    let label = orphan.project.as_ref().unwrap();
    assert_eq!(label.name, UNKNOWN_PROJECT_NAME);
    assert!(!label.known);
}

#[test]
fn projection_is_repeatable() {
    let (tasks, projects) = board();
    let filter = TaskFilter::assigned_to(UserId::new("me"));
    assert_eq!(
        kanban::group(&tasks, &projects, &filter),
        kanban::group(&tasks, &projects, &filter)
    );
    assert_eq!(
        calendar::group(&tasks, &projects, &filter, None),
        calendar::group(&tasks, &projects, &filter, None)
    );
}

// ===========================================================================
// Calendar
// ===========================================================================

#[test]
fn calendar_puts_kickoff_before_tasks_on_shared_day() {
    let (tasks, projects) = board();
    let window = DateWindow::month(2024, 3).unwrap();
    let days = calendar::group(&tasks, &projects, &TaskFilter::default(), Some(window));

    let mid_month = &days[&date(2024, 3, 18)];
    assert_eq!(mid_month.len(), 3);
    assert!(matches!(mid_month[0], CalendarEvent::Project { .. }));
    assert!(!mid_month[0].is_draggable());
    assert_eq!(mid_month[1].task_id(), Some(&TaskId::from_u128(2)));
    assert_eq!(mid_month[2].task_id(), Some(&TaskId::from_u128(3)));

    assert!(!days.contains_key(&date(2024, 4, 2)), "outside window");
}

#[test]
fn calendar_project_filter_hides_other_kickoffs() {
    let (tasks, projects) = board();
    let filter = TaskFilter {
        projects: vec![ProjectId::from_u128(100)],
        ..TaskFilter::default()
    };
    let days = calendar::group(&tasks, &projects, &filter, None);

    let mid_month = &days[&date(2024, 3, 18)];
    assert_eq!(mid_month.len(), 1);
    assert_eq!(mid_month[0].task_id(), Some(&TaskId::from_u128(2)));
    assert_eq!(days[&date(2024, 3, 1)].len(), 2);
}

#[test]
fn month_grid_covers_whole_weeks() {
    let weeks = calendar::month_weeks(DateWindow::month(2024, 3).unwrap());
    assert_eq!(weeks.len(), 5);
    assert_eq!(weeks[0][0], date(2024, 2, 26));
    assert_eq!(weeks[4][6], date(2024, 3, 31));
}

// ===========================================================================
// Report
// ===========================================================================

#[test]
fn report_totals_and_rows() {
    let (tasks, projects) = board();
    let summary = report::summarize(&tasks, &projects, &ReportFilter::default());

    assert_eq!(summary.total_tasks, 6);
    assert_eq!(summary.completed_tasks, 2);
    assert!((summary.total_hours - 7.5).abs() < f64::EPSILON);

    let names: Vec<&str> = summary
        .by_project
        .iter()
        .map(|r| r.label.name.as_str())
        .collect();
    assert_eq!(names, vec!["Mobile", NO_PROJECT_NAME, UNKNOWN_PROJECT_NAME, "Website"]);
}

#[test]
fn report_filters_by_client_and_due_range() {
    let (tasks, projects) = board();
    let filter = ReportFilter {
        client_id: Some(ClientId::new("globex")),
        from: Some(date(2024, 3, 1)),
        to: Some(date(2024, 3, 31)),
        ..ReportFilter::default()
    };
    let summary = report::summarize(&tasks, &projects, &filter);

    assert_eq!(summary.total_tasks, 1);
    assert_eq!(summary.by_project.len(), 1);
    assert_eq!(summary.by_project[0].project_id, Some(ProjectId::from_u128(200)));
}

#[test]
fn report_for_assignee() {
    let (tasks, projects) = board();
    let filter = ReportFilter {
        assignee_id: Some(UserId::new("me")),
        ..ReportFilter::default()
    };
    let summary = report::summarize(&tasks, &projects, &filter);
    assert_eq!(summary.total_tasks, 2);
    assert!((summary.completion_rate() - 0.5).abs() < f64::EPSILON);
}

// ===========================================================================
// Views follow the store
// ===========================================================================

#[tokio::test]
async fn all_views_agree_after_toggle() {
    let (tasks, projects) = board();
    let remote = Arc::new(InMemoryRemote::from_seed(Seed {
        projects,
        tasks,
    }));
    let store = SharedStore::default();
    let (coordinator, _notices) =
        Coordinator::new(store.clone(), Arc::clone(&remote), CoordinatorConfig::default());
    coordinator.reload().await.unwrap();

    coordinator.toggle_done(TaskId::from_u128(1)).await.unwrap();

    let (tasks, projects) = store.read(|s| (s.list(), s.projects().to_vec()));
    let filter = TaskFilter::default();
    let board = kanban::group(&tasks, &projects, &filter);
    let days = calendar::group(&tasks, &projects, &filter, None);
    let summary = report::summarize(&tasks, &projects, &ReportFilter::default());

    assert!(card_ids(&board, Column::Done).contains(&TaskId::from_u128(1)));
    let on_first = days[&date(2024, 3, 1)]
        .iter()
        .find(|e| e.task_id() == Some(&TaskId::from_u128(1)))
        .unwrap();
    assert!(matches!(
        on_first,
        CalendarEvent::Task {
            status: TaskStatus::Done,
            ..
        }
    ));
    assert_eq!(summary.completed_tasks, 3);
}

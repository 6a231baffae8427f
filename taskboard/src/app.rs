//! Application state and event handling.
//!
//! [`App`] holds the UI state (view, selection, filter, drag) and the latest
//! projections of the store. Key handling never touches the store: it
//! returns a [`BoardCommand`] for the worker, and optimistic changes come
//! back through [`App::sync`].

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use taskboard_proto::project::Project;
use taskboard_proto::task::{NewTask, Task, TaskId, UserId};

use crate::drag::{DragOrigin, DragSession, DropTarget};
use crate::projector::TaskFilter;
use crate::projector::calendar::{self, CalendarBuckets, CalendarEvent, DateWindow};
use crate::projector::kanban::{self, Column, KanbanBoard};
use crate::projector::report::{self, ReportFilter, ReportSummary};
use crate::store::SharedStore;
use crate::worker::{BoardCommand, BoardEvent};

/// Title given to tasks created with `n`.
pub const NEW_TASK_TITLE: &str = "New task";

/// Which view is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Kanban columns.
    Board,
    /// Month grid.
    Calendar,
    /// Counts and hours.
    Report,
}

impl View {
    /// The view `Tab` switches to.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Board => Self::Calendar,
            Self::Calendar => Self::Report,
            Self::Report => Self::Board,
        }
    }

    /// Display title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Board => "Board",
            Self::Calendar => "Calendar",
            Self::Report => "Report",
        }
    }
}

/// Text shown in the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Message text.
    pub text: String,
    /// Rendered as an error when `true`.
    pub is_error: bool,
}

/// Main application state.
pub struct App {
    /// Current view.
    pub view: View,
    /// Current user, for the "assigned to me" filter.
    pub me: UserId,
    /// Page-level filter applied to every projection.
    pub filter: TaskFilter,
    /// Selected kanban column.
    pub selected_column: Column,
    /// Selected card within the column.
    pub selected_card: usize,
    /// Selected calendar day.
    pub selected_day: NaiveDate,
    /// Selected event within the day.
    pub selected_event: usize,
    /// Keyboard drag in progress.
    pub drag: DragSession,
    /// Latest outcome or notice.
    pub status: Option<StatusLine>,
    /// Mutations waiting for the remote.
    pub pending: usize,
    /// Whether the app should quit.
    pub should_quit: bool,
    /// Date display format (chrono).
    pub date_format: String,
    /// Time display format (chrono).
    pub time_format: String,
    tasks: Vec<Task>,
    projects: Vec<Project>,
    version: Option<u64>,
    board: KanbanBoard,
    calendar: CalendarBuckets,
    report: ReportSummary,
}

impl App {
    /// Create an empty application for user `me`, with the calendar on
    /// `today`.
    #[must_use]
    pub fn new(me: UserId, today: NaiveDate) -> Self {
        let filter = TaskFilter::default();
        let board = kanban::group(&[], &[], &filter);
        Self {
            view: View::Board,
            me,
            filter,
            selected_column: Column::Backlog,
            selected_card: 0,
            selected_day: today,
            selected_event: 0,
            drag: DragSession::new(),
            status: None,
            pending: 0,
            should_quit: false,
            date_format: "%Y-%m-%d".to_string(),
            time_format: "%H:%M".to_string(),
            tasks: Vec::new(),
            projects: Vec::new(),
            version: None,
            board,
            calendar: CalendarBuckets::new(),
            report: ReportSummary::default(),
        }
    }

    /// Set the date and time display formats.
    #[must_use]
    pub fn with_formats(mut self, date_format: &str, time_format: &str) -> Self {
        self.date_format = date_format.to_string();
        self.time_format = time_format.to_string();
        self
    }

    /// Re-projects if the store changed since the last call. Returns
    /// whether it did.
    pub fn sync(&mut self, store: &SharedStore) -> bool {
        let current = store.version();
        if self.version == Some(current) {
            return false;
        }
        let (version, tasks, projects) =
            store.read(|s| (s.version(), s.list(), s.projects().to_vec()));
        self.version = Some(version);
        self.set_data(tasks, projects);
        true
    }

    /// Replaces the displayed data and re-projects every view.
    pub fn set_data(&mut self, tasks: Vec<Task>, projects: Vec<Project>) {
        self.tasks = tasks;
        self.projects = projects;
        self.reproject();
    }

    /// Loaded tasks.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Loaded projects.
    #[must_use]
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Current kanban projection.
    #[must_use]
    pub const fn board(&self) -> &KanbanBoard {
        &self.board
    }

    /// Current calendar projection for the grid.
    #[must_use]
    pub const fn calendar(&self) -> &CalendarBuckets {
        &self.calendar
    }

    /// Current report.
    #[must_use]
    pub const fn report(&self) -> &ReportSummary {
        &self.report
    }

    /// The month containing the selected day.
    #[must_use]
    pub fn month(&self) -> DateWindow {
        DateWindow::month(self.selected_day.year(), self.selected_day.month()).unwrap_or(
            DateWindow {
                start: self.selected_day,
                end: self.selected_day,
            },
        )
    }

    /// Filter tuple used for the report view.
    #[must_use]
    pub fn report_filter(&self) -> ReportFilter {
        ReportFilter {
            assignee_id: self.filter.assignee.clone(),
            ..ReportFilter::default()
        }
    }

    /// Events on the selected day.
    #[must_use]
    pub fn day_events(&self) -> &[CalendarEvent] {
        self.calendar
            .get(&self.selected_day)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The task under the cursor in the current view.
    #[must_use]
    pub fn selected_task_id(&self) -> Option<TaskId> {
        match self.view {
            View::Board => self
                .board
                .cards(self.selected_column)
                .get(self.selected_card)
                .map(|card| card.task.id),
            View::Calendar => self
                .day_events()
                .get(self.selected_event)
                .and_then(CalendarEvent::task_id)
                .copied(),
            View::Report => None,
        }
    }

    /// Kanban hover target of the drag in progress.
    #[must_use]
    pub fn board_drop_target(&self) -> Option<(Column, usize)> {
        match self.drag.active()?.target? {
            DropTarget::Column { column, index } => Some((column, index)),
            DropTarget::Day(_) => None,
        }
    }

    /// Apply an outcome reported by the worker.
    pub fn apply_event(&mut self, event: BoardEvent) {
        let (text, is_error) = match event {
            BoardEvent::Committed { kind, .. } => (format!("{kind} saved"), false),
            BoardEvent::RolledBack(notice) => (notice.message(), true),
            BoardEvent::Ignored { kind, .. } => {
                (format!("{kind} skipped: task is no longer loaded"), false)
            }
            BoardEvent::Reloaded { tasks } => (format!("Loaded {tasks} tasks"), false),
            BoardEvent::Error(message) => (message, true),
        };
        self.status = Some(StatusLine { text, is_error });
    }

    /// Handle a key event. Returns a command when the key asks for a
    /// change to the board.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<BoardCommand> {
        // Global shortcuts
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Char('q'), _) => {
                self.should_quit = true;
                return None;
            }
            (KeyCode::Tab, _) => {
                self.drag.cancel();
                self.view = self.view.next();
                return None;
            }
            (KeyCode::Esc, _) => {
                self.drag.cancel();
                return None;
            }
            (KeyCode::Char('m'), _) => {
                self.toggle_assigned_to_me();
                return None;
            }
            (KeyCode::Char('r'), _) => return Some(BoardCommand::Reload),
            _ => {}
        }

        match self.view {
            View::Board => self.handle_board_key(key),
            View::Calendar => self.handle_calendar_key(key),
            View::Report => None,
        }
    }

    fn handle_board_key(&mut self, key: KeyEvent) -> Option<BoardCommand> {
        if self.drag.is_active() {
            match key.code {
                KeyCode::Left | KeyCode::Char('h') => self.shift_board_target(Column::prev, 0),
                KeyCode::Right | KeyCode::Char('l') => self.shift_board_target(Column::next, 0),
                KeyCode::Up | KeyCode::Char('k') => self.shift_board_target(Some, -1),
                KeyCode::Down | KeyCode::Char('j') => self.shift_board_target(Some, 1),
                KeyCode::Enter => return self.drop_on_board(),
                _ => {}
            }
            return None;
        }

        match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                if let Some(column) = self.selected_column.prev() {
                    self.select_column(column);
                }
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if let Some(column) = self.selected_column.next() {
                    self.select_column(column);
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_card = self.selected_card.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let last = self.board.cards(self.selected_column).len().saturating_sub(1);
                self.selected_card = (self.selected_card + 1).min(last);
            }
            KeyCode::Char(' ') => self.pick_up_card(),
            KeyCode::Char('x') => return self.selected_task_id().map(BoardCommand::ToggleDone),
            KeyCode::Char('d') => return self.selected_task_id().map(BoardCommand::Delete),
            KeyCode::Char('n') => {
                let column = self.selected_column;
                let mut fields = NewTask::new(NEW_TASK_TITLE, column.drop_status());
                fields.order = kanban::next_order(&self.tasks, column);
                return Some(BoardCommand::Create(fields));
            }
            _ => {}
        }
        None
    }

    fn handle_calendar_key(&mut self, key: KeyEvent) -> Option<BoardCommand> {
        let dragging = self.drag.is_active();
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.shift_day(-1),
            KeyCode::Right | KeyCode::Char('l') => self.shift_day(1),
            KeyCode::Up => self.shift_day(-7),
            KeyCode::Down => self.shift_day(7),
            KeyCode::Char('k') if !dragging => {
                self.selected_event = self.selected_event.saturating_sub(1);
            }
            KeyCode::Char('j') if !dragging => {
                let last = self.day_events().len().saturating_sub(1);
                self.selected_event = (self.selected_event + 1).min(last);
            }
            KeyCode::Char(' ') if !dragging => {
                if let Some(id) = self.selected_task_id() {
                    self.begin_drag(id, DragOrigin::Day(self.selected_day));
                    self.drag.update_target(DropTarget::Day(self.selected_day));
                }
            }
            KeyCode::Enter if dragging => {
                let date = self.selected_day;
                return self.drag.commit(DropTarget::Day(date), |active, _| {
                    BoardCommand::Reschedule {
                        id: active.task_id,
                        date,
                    }
                });
            }
            KeyCode::Char('x') if !dragging => {
                return self.selected_task_id().map(BoardCommand::ToggleDone);
            }
            KeyCode::Char('d') if !dragging => {
                return self.selected_task_id().map(BoardCommand::Delete);
            }
            KeyCode::Char('n') if !dragging => {
                let mut fields = NewTask::new(NEW_TASK_TITLE, Column::Backlog.drop_status());
                fields.due_date = Some(self.selected_day.and_time(NaiveTime::MIN));
                fields.order = kanban::next_order(&self.tasks, Column::Backlog);
                return Some(BoardCommand::Create(fields));
            }
            _ => {}
        }
        None
    }

    fn toggle_assigned_to_me(&mut self) {
        self.filter.assignee = match self.filter.assignee {
            Some(_) => None,
            None => Some(self.me.clone()),
        };
        self.drag.cancel();
        self.reproject();
    }

    fn select_column(&mut self, column: Column) {
        self.selected_column = column;
        let last = self.board.cards(column).len().saturating_sub(1);
        self.selected_card = self.selected_card.min(last);
    }

    fn begin_drag(&mut self, id: TaskId, origin: DragOrigin) {
        if let Err(e) = self.drag.begin(id, origin) {
            tracing::debug!(error = %e, "drag not started");
        }
    }

    fn pick_up_card(&mut self) {
        let Some(id) = self.selected_task_id() else {
            return;
        };
        let column = self.selected_column;
        let index = self.selected_card;
        self.begin_drag(id, DragOrigin::Column { column, index });
        self.drag.update_target(DropTarget::Column { column, index });
    }

    /// Number of cards shown in `column` without the dragged one.
    fn drop_slots(&self, column: Column) -> usize {
        let dragged = self.drag.active().map(|a| a.task_id);
        self.board
            .cards(column)
            .iter()
            .filter(|card| Some(card.task.id) != dragged)
            .count()
    }

    fn shift_board_target(&mut self, to_column: fn(Column) -> Option<Column>, step: isize) {
        let Some((column, index)) = self.board_drop_target() else {
            return;
        };
        let Some(column) = to_column(column) else {
            return;
        };
        let index = index.saturating_add_signed(step).min(self.drop_slots(column));
        self.drag.update_target(DropTarget::Column { column, index });
    }

    fn drop_on_board(&mut self) -> Option<BoardCommand> {
        let (column, index) = self.board_drop_target()?;
        let tasks = &self.tasks;
        let board = &self.board;
        let command = self.drag.commit(DropTarget::Column { column, index }, |active, _| {
            let visible = board.cards(column);
            let index = kanban::unfiltered_index(tasks, column, visible, index, &active.task_id);
            BoardCommand::Move {
                id: active.task_id,
                column,
                index,
            }
        });
        self.selected_column = column;
        self.selected_card = index;
        command
    }

    fn shift_day(&mut self, days: i64) {
        let Some(day) = self.selected_day.checked_add_signed(Duration::days(days)) else {
            return;
        };
        let month_changed =
            day.month() != self.selected_day.month() || day.year() != self.selected_day.year();
        self.selected_day = day;
        self.selected_event = 0;
        if self.drag.is_active() {
            self.drag.update_target(DropTarget::Day(day));
        }
        if month_changed {
            self.reproject_calendar();
        }
    }

    fn reproject(&mut self) {
        self.board = kanban::group(&self.tasks, &self.projects, &self.filter);
        self.report = report::summarize(&self.tasks, &self.projects, &self.report_filter());
        self.reproject_calendar();

        let last_card = self.board.cards(self.selected_column).len().saturating_sub(1);
        self.selected_card = self.selected_card.min(last_card);
    }

    fn reproject_calendar(&mut self) {
        let weeks = calendar::month_weeks(self.month());
        let window = match (weeks.first(), weeks.last()) {
            (Some(first), Some(last)) => DateWindow {
                start: first[0],
                end: last[6],
            },
            _ => self.month(),
        };
        self.calendar = calendar::group(&self.tasks, &self.projects, &self.filter, Some(window));
        let last_event = self.day_events().len().saturating_sub(1);
        self.selected_event = self.selected_event.min(last_event);
    }
}

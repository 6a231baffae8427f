//! Terminal UI rendering.

pub mod board;
pub mod calendar;
pub mod report;
pub mod status_bar;
pub mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::Line,
    widgets::Tabs,
};

use crate::app::{App, View};

const VIEWS: [View; 3] = [View::Board, View::Calendar, View::Report];

/// Main draw function for the entire UI.
pub fn draw(frame: &mut Frame, app: &App) {
    // Tabs on top, status bar at bottom
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_tabs(frame, main_chunks[0], app);

    match app.view {
        View::Board => board::render(frame, main_chunks[1], app),
        View::Calendar => calendar::render(frame, main_chunks[1], app),
        View::Report => report::render(frame, main_chunks[1], app),
    }

    status_bar::render(frame, main_chunks[2], app);
}

fn render_tabs(frame: &mut Frame, area: Rect, app: &App) {
    let titles: Vec<Line> = VIEWS.iter().map(|v| Line::from(v.title())).collect();
    let selected = VIEWS.iter().position(|v| *v == app.view).unwrap_or(0);
    let mut filter = String::new();
    if app.filter.assignee.is_some() {
        filter.push_str("  [assigned to me]");
    }
    let tabs = Tabs::new(titles)
        .select(selected)
        .style(theme::dimmed())
        .highlight_style(theme::highlighted())
        .divider(" | ");

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Length(20)])
        .split(area);
    frame.render_widget(tabs, chunks[0]);
    frame.render_widget(
        Line::styled(filter, theme::normal().fg(theme::WARNING)),
        chunks[1],
    );
}

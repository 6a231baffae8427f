//! Report view rendering.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table},
};

use super::theme;
use crate::app::App;

/// Render the totals and the per-project table.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(3)])
        .split(area);

    let summary = app.report();
    let scope = app
        .filter
        .assignee
        .as_ref()
        .map_or_else(|| "all tasks".to_string(), |me| format!("assigned to {me}"));
    let totals = vec![
        Line::from(vec![
            Span::styled("Scope: ", theme::dimmed()),
            Span::raw(scope),
        ]),
        Line::from(vec![
            Span::styled("Tasks: ", theme::dimmed()),
            Span::styled(
                format!("{} / {} done", summary.completed_tasks, summary.total_tasks),
                theme::bold(),
            ),
            Span::raw(format!(" ({:.0}%)", summary.completion_rate() * 100.0)),
        ]),
        Line::from(vec![
            Span::styled("Hours: ", theme::dimmed()),
            Span::styled(format!("{:.1}", summary.total_hours), theme::bold()),
        ]),
    ];
    let block = Block::default()
        .title(Span::styled("Report", theme::panel_title(theme::HIGHLIGHT)))
        .borders(Borders::ALL)
        .border_style(theme::normal());
    frame.render_widget(Paragraph::new(totals).block(block), chunks[0]);

    let rows = summary.by_project.iter().map(|row| {
        Row::new(vec![
            Line::styled(
                row.label.name.clone(),
                theme::normal().fg(theme::project_color(&row.label.color)),
            ),
            Line::raw(row.total_tasks.to_string()),
            Line::raw(row.completed_tasks.to_string()),
            Line::raw(format!("{:.1}", row.total_hours)),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(8),
        ],
    )
    .header(Row::new(vec!["Project", "Tasks", "Done", "Hours"]).style(theme::bold()))
    .block(
        Block::default()
            .title("By project")
            .borders(Borders::ALL)
            .border_style(theme::normal()),
    );
    frame.render_widget(table, chunks[1]);
}

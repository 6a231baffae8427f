//! Calendar month grid rendering.

use chrono::{Datelike, NaiveDate};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use super::theme;
use crate::app::App;
use crate::drag::DropTarget;
use crate::projector::calendar::{self, CalendarEvent};

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Render the month grid and the selected day's agenda.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(75), Constraint::Percentage(25)])
        .split(area);

    render_month(frame, chunks[0], app);
    render_day(frame, chunks[1], app);
}

fn render_month(frame: &mut Frame, area: Rect, app: &App) {
    let month = app.month();
    let weeks = calendar::month_weeks(month);

    let block = Block::default()
        .title(Span::styled(
            month.start.format("%B %Y").to_string(),
            theme::panel_title(theme::HIGHLIGHT),
        ))
        .borders(Borders::ALL)
        .border_style(theme::normal());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut rows = vec![Constraint::Length(1)];
    rows.extend(weeks.iter().map(|_| Constraint::Min(3)));
    let row_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(rows)
        .split(inner);

    let header_cells = split_week(row_chunks[0]);
    for (name, cell) in WEEKDAYS.iter().zip(header_cells.iter()) {
        frame.render_widget(Line::styled(*name, theme::dimmed()), *cell);
    }

    for (week, row) in weeks.iter().zip(row_chunks.iter().skip(1)) {
        for (day, cell) in week.iter().zip(split_week(*row).iter()) {
            render_cell(frame, *cell, app, *day, month.contains(*day));
        }
    }
}

fn split_week(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 7); 7])
        .split(area)
}

fn render_cell(frame: &mut Frame, area: Rect, app: &App, day: NaiveDate, in_month: bool) {
    let is_drop_target = app
        .drag
        .active()
        .and_then(|a| a.target)
        .is_some_and(|t| t == DropTarget::Day(day));
    let border_style = if is_drop_target {
        theme::drop_marker()
    } else if day == app.selected_day {
        theme::highlighted()
    } else if in_month {
        theme::normal()
    } else {
        theme::normal().fg(theme::OUTSIDE_MONTH)
    };

    let events = app.calendar().get(&day).map(Vec::as_slice).unwrap_or(&[]);
    let lines: Vec<Line> = events.iter().map(|e| event_line(e, app)).collect();

    let block = Block::default()
        .title(day.day().to_string())
        .borders(Borders::ALL)
        .border_style(border_style);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn event_line<'a>(event: &'a CalendarEvent, app: &App) -> Line<'a> {
    let dragged = app.drag.active().map(|a| a.task_id);
    match event {
        CalendarEvent::Project { name, color, .. } => Line::from(vec![
            Span::styled("★ ", theme::normal().fg(theme::project_color(color))),
            Span::styled(name.as_str(), theme::dimmed()),
        ]),
        CalendarEvent::Task {
            task_id,
            title,
            status,
            ..
        } => {
            let style = if Some(*task_id) == dragged {
                theme::dragged()
            } else {
                theme::status(*status)
            };
            Line::styled(title.as_str(), style)
        }
    }
}

fn render_day(frame: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .day_events()
        .iter()
        .enumerate()
        .map(|(idx, event)| {
            let line = match event {
                CalendarEvent::Project { name, color, .. } => Line::from(vec![
                    Span::styled("★ ", theme::normal().fg(theme::project_color(color))),
                    Span::raw(format!("{name} starts")),
                ]),
                CalendarEvent::Task {
                    title,
                    time,
                    project,
                    ..
                } => {
                    let mut spans = vec![
                        Span::styled(
                            time.format(&app.time_format).to_string(),
                            theme::dimmed(),
                        ),
                        Span::raw(" "),
                        Span::raw(title.as_str()),
                    ];
                    if let Some(project) = project {
                        spans.push(Span::styled(
                            format!(" #{}", project.name),
                            theme::normal().fg(theme::project_color(&project.color)),
                        ));
                    }
                    Line::from(spans)
                }
            };
            let style = if idx == app.selected_event && !app.drag.is_active() {
                theme::selected()
            } else {
                theme::normal()
            };
            ListItem::new(line).style(style)
        })
        .collect();

    let block = Block::default()
        .title(Span::styled(
            app.selected_day.format(&app.date_format).to_string(),
            theme::panel_title(theme::HIGHLIGHT),
        ))
        .borders(Borders::ALL)
        .border_style(theme::normal());
    frame.render_widget(List::new(items).block(block), area);
}

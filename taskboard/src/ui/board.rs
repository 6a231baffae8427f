//! Kanban board rendering.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

use super::theme;
use crate::app::App;
use crate::projector::kanban::{Column, KanbanCard};

/// Render the four board columns side by side.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    for (column, chunk) in Column::ALL.iter().zip(columns.iter()) {
        render_column(frame, *chunk, app, *column);
    }
}

fn render_column(frame: &mut Frame, area: Rect, app: &App, column: Column) {
    let is_focused = app.selected_column == column;
    let dragged = app.drag.active().map(|a| a.task_id);
    let marker = app
        .board_drop_target()
        .and_then(|(target, index)| (target == column).then_some(index));

    let cards = app.board().cards(column);
    let mut items: Vec<ListItem> = Vec::with_capacity(cards.len() + 1);
    // Marker index counts cards without the dragged one.
    let mut slot = 0;
    for (idx, card) in cards.iter().enumerate() {
        let is_dragged = Some(card.task.id) == dragged;
        if !is_dragged {
            if marker == Some(slot) {
                items.push(drop_marker());
            }
            slot += 1;
        }

        let style = if is_dragged {
            theme::dragged()
        } else if is_focused && idx == app.selected_card && !app.drag.is_active() {
            theme::selected()
        } else {
            theme::status(card.task.status)
        };
        items.push(ListItem::new(card_line(card)).style(style));
    }
    if marker.is_some_and(|m| m >= slot) {
        items.push(drop_marker());
    }

    let border_style = if is_focused {
        theme::highlighted()
    } else {
        theme::normal()
    };
    let block = Block::default()
        .title(Span::styled(
            format!("{column} ({})", cards.len()),
            theme::panel_title(theme::HIGHLIGHT),
        ))
        .borders(Borders::ALL)
        .border_style(border_style);

    frame.render_widget(List::new(items).block(block), area);
}

fn card_line(card: &KanbanCard) -> Line<'_> {
    let checkbox = if card.task.status.is_done() {
        "[✓]"
    } else {
        "[ ]"
    };
    let mut spans = vec![
        Span::raw(checkbox),
        Span::raw(" "),
        Span::raw(card.task.title.as_str()),
    ];
    if let Some(project) = &card.project {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            format!("#{}", project.name),
            theme::normal().fg(theme::project_color(&project.color)),
        ));
    }
    Line::from(spans)
}

fn drop_marker() -> ListItem<'static> {
    ListItem::new(Line::styled("──── drop here ────", theme::drop_marker()))
}

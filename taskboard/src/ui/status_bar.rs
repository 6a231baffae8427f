//! Status bar rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme;
use crate::app::{App, View};

/// Render the status bar at the bottom of the screen.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let help_text = match (app.view, app.drag.is_active()) {
        (View::Board, false) => {
            "Tab: view | ←→↑↓: select | Space: drag | x: done | n: new | d: delete | m: mine | q: quit"
        }
        (View::Board, true) => "←→↑↓: choose drop spot | Enter: drop | Esc: cancel",
        (View::Calendar, false) => {
            "Tab: view | ←→↑↓: day | jk: event | Space: drag | x: done | n: new | q: quit"
        }
        (View::Calendar, true) => "←→↑↓: choose day | Enter: drop | Esc: cancel",
        (View::Report, _) => "Tab: view | m: mine | r: reload | q: quit",
    };

    let (dot_color, pending_text) = if app.pending == 0 {
        (theme::SUCCESS, "synced".to_string())
    } else {
        (theme::WARNING, format!("{} pending", app.pending))
    };

    let mut spans = vec![
        Span::styled("Taskboard v0.1.0", theme::bold()),
        Span::raw(" | "),
        Span::styled("●", theme::normal().fg(dot_color)),
        Span::raw(format!(" {pending_text}")),
        Span::raw(" | "),
    ];
    if let Some(status) = &app.status {
        let style = if status.is_error {
            theme::normal().fg(theme::ERROR)
        } else {
            theme::normal()
        };
        spans.push(Span::styled(status.text.clone(), style));
        spans.push(Span::raw(" | "));
    }
    spans.push(Span::styled(help_text, theme::dimmed()));

    let paragraph = Paragraph::new(Line::from(spans)).style(theme::status_bar_bg());
    frame.render_widget(paragraph, area);
}

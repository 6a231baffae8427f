//! Colors and styles shared by the board, calendar and report views.

use ratatui::style::{Color, Modifier, Style};

use taskboard_proto::task::TaskStatus;

/// Default text color.
pub const FG_PRIMARY: Color = Color::White;

/// Color for metadata and finished cards.
pub const FG_SECONDARY: Color = Color::Gray;

/// Highlight color for the selection and active tab.
pub const HIGHLIGHT: Color = Color::Cyan;

/// Success indicator color.
pub const SUCCESS: Color = Color::Green;

/// Warning / pending indicator color.
pub const WARNING: Color = Color::Yellow;

/// Error indicator color.
pub const ERROR: Color = Color::Red;

/// Color of the drop marker while dragging.
pub const DROP_MARKER: Color = Color::LightMagenta;

/// Color for days outside the shown month.
pub const OUTSIDE_MONTH: Color = Color::DarkGray;

/// Plain card text.
#[must_use]
pub fn normal() -> Style {
    Style::default().fg(FG_PRIMARY)
}

/// Dimmed text style (metadata, done tasks).
#[must_use]
pub fn dimmed() -> Style {
    Style::default().fg(FG_SECONDARY)
}

/// Bold text style.
#[must_use]
pub fn bold() -> Style {
    Style::default().fg(FG_PRIMARY).add_modifier(Modifier::BOLD)
}

/// Highlighted text style (selected column border, active tab).
#[must_use]
pub fn highlighted() -> Style {
    Style::default().fg(HIGHLIGHT).add_modifier(Modifier::BOLD)
}

/// The card or agenda entry under the cursor.
#[must_use]
pub fn selected() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

/// Style for the card being dragged.
#[must_use]
pub fn dragged() -> Style {
    Style::default()
        .fg(DROP_MARKER)
        .add_modifier(Modifier::ITALIC | Modifier::BOLD)
}

/// Style for the drop marker line.
#[must_use]
pub fn drop_marker() -> Style {
    Style::default().fg(DROP_MARKER).add_modifier(Modifier::BOLD)
}

/// Status bar line.
#[must_use]
pub fn status_bar_bg() -> Style {
    Style::default().fg(Color::White).bg(Color::Rgb(30, 30, 50))
}

/// Column and panel titles in the given color.
#[must_use]
pub fn panel_title(color: Color) -> Style {
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Text style for a task with `status`.
#[must_use]
pub fn status(status: TaskStatus) -> Style {
    match status {
        TaskStatus::Done | TaskStatus::Cancelled => dimmed(),
        TaskStatus::Blocked => normal().fg(ERROR),
        TaskStatus::InProgress => normal().fg(WARNING),
        _ => normal(),
    }
}

/// Parses a `#rrggbb` project color. Anything else falls back to gray.
#[must_use]
pub fn project_color(hex: &str) -> Color {
    let parse = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|part| u8::from_str_radix(part, 16).ok())
    };
    match (hex.len(), hex.starts_with('#')) {
        (7, true) => match (parse(1..3), parse(3..5), parse(5..7)) {
            (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
            _ => FG_SECONDARY,
        },
        _ => FG_SECONDARY,
    }
}

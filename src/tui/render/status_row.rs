use chrono::Utc;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, Focus, Mode};
use crate::util::unicode::{display_width, truncate_to_width};

use super::helpers::spans_width;

fn key_hints(app: &App) -> &'static str {
    match (app.mode, app.focus) {
        (Mode::Form, _) => "Tab field  Enter save  Esc cancel",
        (Mode::Confirm, _) => "y confirm  n cancel",
        (Mode::Help, _) => "any key to close",
        (Mode::Navigate, Focus::Inventory) => {
            "Enter mine  a add  e edit  d delete  s sort  Tab chest  ? help"
        }
        (Mode::Navigate, Focus::Chest) => "r restore  d delete  D empty  Tab inventory  ? help",
    }
}

/// Render the status row (bottom of screen): message or key hints on the
/// left, counters on the right
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;
    let counters = app.world.snapshot(Utc::now()).counters();
    let counters_width = display_width(&counters);
    let room = width.saturating_sub(counters_width + 2);

    let mut spans = Vec::new();
    if let Some(message) = &app.status_message {
        let color = if app.status_is_error {
            app.theme.red
        } else {
            app.theme.text_bright
        };
        spans.push(Span::styled(
            format!(" {}", truncate_to_width(message, room.saturating_sub(1))),
            Style::default().fg(color).bg(bg),
        ));
    } else if app.config.ui.show_key_hints {
        spans.push(Span::styled(
            format!(" {}", truncate_to_width(key_hints(app), room.saturating_sub(1))),
            Style::default().fg(app.theme.dim).bg(bg),
        ));
    }

    let content_width = spans_width(&spans);
    if content_width + counters_width < width {
        let padding = width - content_width - counters_width;
        spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
        spans.push(Span::styled(
            counters,
            Style::default().fg(app.theme.text).bg(bg),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

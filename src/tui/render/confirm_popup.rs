use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::App;
use crate::util::unicode::{display_width, truncate_to_width};

use super::helpers::fixed_rect;

/// Render the y/n popup for a destructive action
pub fn render_confirm_popup(frame: &mut Frame, app: &App, area: Rect) {
    let Some(state) = &app.confirm else {
        return;
    };
    let bg = app.theme.background;
    let max_w = area.width.saturating_sub(6) as usize;
    let message = truncate_to_width(&state.message, max_w);
    let popup_w = (display_width(&message) as u16 + 6).max(30);

    let key_style = Style::default()
        .fg(app.theme.highlight)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let dim_style = Style::default().fg(app.theme.dim).bg(bg);
    let lines = vec![
        Line::from(Span::styled(
            format!("  {}", message),
            Style::default().fg(app.theme.text_bright).bg(bg),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  y", key_style),
            Span::styled(" confirm   ", dim_style),
            Span::styled("n", key_style),
            Span::styled(" cancel", dim_style),
        ]),
    ];

    let popup = fixed_rect(popup_w, 5, area);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.red).bg(bg))
        .style(Style::default().bg(bg));
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

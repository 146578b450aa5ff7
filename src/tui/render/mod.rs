pub mod confirm_popup;
pub mod detail_view;
pub mod form_popup;
pub mod grid;
pub mod help_overlay;
pub mod helpers;
pub mod particles;
pub mod status_row;

#[cfg(test)]
pub mod test_helpers;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};

use super::app::{App, Focus, GRID_COLS, Mode};

/// Widest a grid gets: 9 slots of 7 columns
const GRID_MAX_W: u16 = 7 * GRID_COLS as u16;

/// Main render function: dispatches to sub-renderers
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Background fill
    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // Layout: inventory title | grid | chest title | grid | details | status row
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(grid::grid_height()),
            Constraint::Length(1),
            Constraint::Length(grid::grid_height()),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_title(frame, app, chunks[0], "Inventory", Focus::Inventory, true);
    grid::render_inventory(frame, app, grid_area(chunks[1]));
    render_title(frame, app, chunks[2], "Chest", Focus::Chest, false);
    grid::render_chest(frame, app, grid_area(chunks[3]));
    detail_view::render_detail_view(frame, app, chunks[4]);
    status_row::render_status_row(frame, app, chunks[5]);

    // Particles fly over the grids but under popups
    particles::render_particles(frame, app, area);

    match app.mode {
        Mode::Form => form_popup::render_form_popup(frame, app, area),
        Mode::Confirm => confirm_popup::render_confirm_popup(frame, app, area),
        Mode::Help => help_overlay::render_help_overlay(frame, app, area),
        Mode::Navigate => {}
    }
}

fn grid_area(area: Rect) -> Rect {
    Rect {
        x: area.x + 1,
        width: area.width.saturating_sub(1).min(GRID_MAX_W),
        ..area
    }
}

fn render_title(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    label: &str,
    focus: Focus,
    show_sort: bool,
) {
    let bg = app.theme.background;
    let style = if app.focus == focus {
        Style::default()
            .fg(app.theme.highlight)
            .bg(bg)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(app.theme.text).bg(bg)
    };
    let mut spans = vec![Span::styled(format!(" {}", label), style)];
    if show_sort {
        spans.push(Span::styled(
            format!("  sort: {}", app.world.sort_mode()),
            Style::default().fg(app.theme.dim).bg(bg),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

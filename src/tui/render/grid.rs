use chrono::Utc;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::model::task::{BlockType, CompletedTask, Task};
use crate::ops::capacity::MAX_SLOTS;
use crate::ops::deadline::{self, DeadlineStatus};
use crate::tui::app::{App, Focus, GRID_COLS};

const SLOT_W: u16 = 7;
const SLOT_H: u16 = 3;
const GRID_ROWS: usize = MAX_SLOTS / GRID_COLS;

/// Overlays for crack levels 1..=5, each two cells wide like a block glyph
const CRACK_GLYPHS: [&str; 5] = [
    "\u{b7}\u{2571}",
    "\u{2571}\u{2571}",
    "\u{2573}\u{2571}",
    "\u{2573}\u{2573}",
    "\u{259a}\u{259e}",
];

/// Width and height of one slot for a grid drawn in `area`
pub fn slot_size(area: Rect) -> (u16, u16) {
    let w = (area.width / GRID_COLS as u16).min(SLOT_W);
    let h = (area.height / GRID_ROWS as u16).min(SLOT_H);
    (w, h)
}

/// Screen rectangle of slot `index` (row-major) in a grid drawn in `area`
pub fn slot_rect(area: Rect, index: usize) -> Rect {
    let (w, h) = slot_size(area);
    let col = (index % GRID_COLS) as u16;
    let row = (index / GRID_COLS) as u16;
    Rect {
        x: area.x + col * w,
        y: area.y + row * h,
        width: w,
        height: h,
    }
}

/// Rows needed to draw a full grid
pub fn grid_height() -> u16 {
    SLOT_H * GRID_ROWS as u16
}

pub fn crack_glyph(level: u8) -> Option<&'static str> {
    match level {
        0 => None,
        n => CRACK_GLYPHS.get(n as usize - 1).copied(),
    }
}

/// What one slot shows
enum Slot<'a> {
    Empty,
    Active(&'a Task),
    Completed(&'a CompletedTask),
}

/// Render the 27-slot inventory grid, remembering where it was drawn
pub fn render_inventory(frame: &mut Frame, app: &mut App, area: Rect) {
    app.inventory_area = area;
    let app: &App = app;
    let snapshot = app.world.snapshot(Utc::now());
    for index in 0..MAX_SLOTS {
        let slot = match snapshot.active.get(index) {
            Some(task) => Slot::Active(task),
            None => Slot::Empty,
        };
        let selected = app.focus == Focus::Inventory && app.inventory_cursor == index;
        render_slot(frame, app, slot_rect(area, index), slot, selected);
    }
}

/// Render the chest grid, in completion order
pub fn render_chest(frame: &mut Frame, app: &App, area: Rect) {
    let completed: Vec<&CompletedTask> = app.world.store().completed().collect();
    for index in 0..MAX_SLOTS {
        let slot = match completed.get(index) {
            Some(done) => Slot::Completed(done),
            None => Slot::Empty,
        };
        let selected = app.focus == Focus::Chest && app.chest_cursor == index;
        render_slot(frame, app, slot_rect(area, index), slot, selected);
    }
}

fn render_slot(frame: &mut Frame, app: &App, rect: Rect, slot: Slot<'_>, selected: bool) {
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    let bg = app.theme.background;
    let border_style = if selected {
        Style::default()
            .fg(app.theme.highlight)
            .bg(bg)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(app.theme.slot).bg(bg)
    };

    let content = slot_content(app, &slot);
    let framed = rect.width >= 4 && rect.height >= 3;
    if framed {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .style(Style::default().bg(bg));
        let inner = block.inner(rect);
        frame.render_widget(block, rect);
        frame.render_widget(Paragraph::new(content).centered(), inner);
    } else {
        // Too small for borders: glyph only, reversed when selected
        let line = if selected {
            content.patch_style(Style::default().add_modifier(Modifier::REVERSED))
        } else {
            content
        };
        frame.render_widget(Paragraph::new(line), rect);
    }
}

fn slot_content(app: &App, slot: &Slot<'_>) -> Line<'static> {
    let bg = app.theme.background;
    match slot {
        Slot::Empty => Line::default(),
        Slot::Active(task) => {
            let block = task.block();
            let level = app.world.crack_level(&task.id);
            let glyph = crack_glyph(level).unwrap_or(block.glyph());
            let mut spans = vec![Span::styled(glyph, glyph_style(app, block))];
            match deadline::active_status(task, Utc::now()) {
                DeadlineStatus::Overdue => spans.push(Span::styled(
                    "\u{d7}",
                    Style::default().fg(app.theme.red).bg(bg),
                )),
                DeadlineStatus::Urgent => spans.push(Span::styled(
                    "!",
                    Style::default().fg(app.theme.yellow).bg(bg),
                )),
                _ => {}
            }
            Line::from(spans)
        }
        Slot::Completed(done) => {
            let block = done.task.block();
            let color = app.theme.fade(app.theme.block_color(block), 0.6);
            Line::from(Span::styled(
                block.glyph(),
                Style::default().fg(color).bg(bg),
            ))
        }
    }
}

fn glyph_style(app: &App, block: BlockType) -> Style {
    Style::default()
        .fg(app.theme.block_color(block))
        .bg(app.theme.background)
}

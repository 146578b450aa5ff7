use ratatui::Frame;
use ratatui::layout::{Position, Rect};

use crate::tui::app::App;
use crate::tui::theme::rgb;

/// Particle-space units per terminal column
pub const CELL_W: f32 = 8.0;
/// Particle-space units per terminal row
pub const CELL_H: f32 = 16.0;

/// Terminal cell a particle-space point falls in, if it is inside `area`
pub fn to_cell(x: f32, y: f32, area: Rect) -> Option<Position> {
    if x < 0.0 || y < 0.0 {
        return None;
    }
    let pos = Position {
        x: (x / CELL_W) as u16,
        y: (y / CELL_H) as u16,
    };
    area.contains(pos).then_some(pos)
}

/// Draw live particles straight into the buffer, over everything else
pub fn render_particles(frame: &mut Frame, app: &App, area: Rect) {
    let buf = frame.buffer_mut();
    for particle in app.world.particles().particles() {
        let Some(pos) = to_cell(particle.x, particle.y, area) else {
            continue;
        };
        let symbol = if particle.size >= 2.5 { "\u{25aa}" } else { "\u{b7}" };
        let color = app.theme.fade(rgb(particle.color), particle.opacity());
        if let Some(cell) = buf.cell_mut(pos) {
            cell.set_symbol(symbol).set_fg(color);
        }
    }
}

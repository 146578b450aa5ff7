use std::path::PathBuf;

use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

use crate::model::config::AppConfig;
use crate::model::task::Priority;
use crate::ops::particles::ParticleEngine;
use crate::ops::store::TaskStore;
use crate::ops::world::World;
use crate::tui::app::App;

pub const TERM_W: u16 = 80;
pub const TERM_H: u16 = 26;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// Build an App over an in-memory store with the given (name, priority) tasks.
/// Particles are seeded so renders are repeatable.
pub fn app_with_tasks(tasks: &[(&str, u8)]) -> App {
    let mut world = World::with_particles(TaskStore::new(), ParticleEngine::seeded(7));
    for (name, priority) in tasks {
        world
            .create_task(name, Priority::new(*priority).unwrap(), None)
            .unwrap();
    }
    App::new(world, AppConfig::default(), PathBuf::from("/tmp/craftdo-test"))
}

use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::io::config_io::CONFIG_FILE;
use crate::io::storage::{COMPLETED_FILE, TASKS_FILE};

/// Events sent from the file watcher to the TUI event loop.
#[derive(Debug)]
pub enum FileEvent {
    /// One or more data files changed on disk.
    Changed(Vec<PathBuf>),
}

/// Whether a changed path is one the TUI reloads
fn is_watched(path: &Path) -> bool {
    matches!(
        path.file_name().and_then(|n| n.to_str()),
        Some(TASKS_FILE) | Some(COMPLETED_FILE) | Some(CONFIG_FILE)
    )
}

/// Watches the data directory for edits made by other processes
/// (the CLI, or a hand-edited JSON file).
pub struct DataWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<FileEvent>,
}

impl DataWatcher {
    /// Start watching `data_dir`. Call `poll()` each tick.
    pub fn start(data_dir: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let Ok(event) = result else {
                    return;
                };
                match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
                    _ => return,
                }
                let relevant: Vec<PathBuf> =
                    event.paths.into_iter().filter(|p| is_watched(p)).collect();
                if !relevant.is_empty() {
                    let _ = tx.send(FileEvent::Changed(relevant));
                }
            },
            Config::default(),
        )?;

        watcher.watch(data_dir, RecursiveMode::NonRecursive)?;
        Ok(DataWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Drain queued events without blocking
    pub fn poll(&self) -> Vec<FileEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.rx.try_recv() {
            events.push(evt);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_data_files_are_watched() {
        assert!(is_watched(Path::new("/d/tasks.json")));
        assert!(is_watched(Path::new("/d/completed.json")));
        assert!(is_watched(Path::new("/d/config.toml")));
        assert!(!is_watched(Path::new("/d/.state.json")));
        assert!(!is_watched(Path::new("/d/.lock")));
        assert!(!is_watched(Path::new("/d/.tmpA1b2C3")));
    }
}

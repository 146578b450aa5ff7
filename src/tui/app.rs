use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use tracing::{debug, info, warn};

use crate::io::config_io;
use crate::io::lock::DataLock;
use crate::io::state::{UiState, read_ui_state, write_ui_state};
use crate::io::storage;
use crate::io::watcher::DataWatcher;
use crate::model::config::AppConfig;
use crate::model::task::{CompletedTask, Task, TaskId};
use crate::ops::capacity::MAX_SLOTS;
use crate::ops::world::{World, WorldEvent};

use super::input;
use super::render;
use super::theme::Theme;

/// Slots per grid row
pub const GRID_COLS: usize = 9;

/// How long our own saves mask watcher events
const SELF_WRITE_GRACE: Duration = Duration::from_millis(500);
const SAVE_RETRY: Duration = Duration::from_secs(2);

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// Add/edit form popup
    Form,
    /// y/n popup before a destructive action
    Confirm,
    Help,
}

/// Which grid the cursor is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Inventory,
    Chest,
}

impl Focus {
    fn as_str(self) -> &'static str {
        match self {
            Focus::Inventory => "inventory",
            Focus::Chest => "chest",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormKind {
    Add,
    Edit(TaskId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Priority,
    Deadline,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            FormField::Name => FormField::Priority,
            FormField::Priority => FormField::Deadline,
            FormField::Deadline => FormField::Name,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FormField::Name => FormField::Deadline,
            FormField::Priority => FormField::Name,
            FormField::Deadline => FormField::Priority,
        }
    }
}

/// State of the add/edit popup
#[derive(Debug, Clone)]
pub struct FormState {
    pub kind: FormKind,
    pub field: FormField,
    pub name: String,
    /// Byte offset into `name`
    pub name_cursor: usize,
    pub priority: u8,
    pub deadline: String,
    pub deadline_cursor: usize,
    /// Deadline the edited task had, and how it was shown, so an untouched
    /// field keeps full precision
    pub original_deadline: Option<(String, DateTime<Utc>)>,
    pub error: Option<String>,
}

impl FormState {
    pub fn add(default_priority: u8) -> Self {
        FormState {
            kind: FormKind::Add,
            field: FormField::Name,
            name: String::new(),
            name_cursor: 0,
            priority: default_priority,
            deadline: String::new(),
            deadline_cursor: 0,
            original_deadline: None,
            error: None,
        }
    }

    pub fn edit(task: &Task) -> Self {
        let deadline = task
            .deadline
            .map(crate::util::time::format_local)
            .unwrap_or_default();
        FormState {
            kind: FormKind::Edit(task.id.clone()),
            field: FormField::Name,
            name: task.name.clone(),
            name_cursor: task.name.len(),
            priority: task.priority.value(),
            deadline_cursor: deadline.len(),
            original_deadline: task.deadline.map(|d| (deadline.clone(), d)),
            deadline,
            error: None,
        }
    }

    /// The focused text buffer and its cursor, if the field is textual
    pub fn text_mut(&mut self) -> Option<(&mut String, &mut usize)> {
        match self.field {
            FormField::Name => Some((&mut self.name, &mut self.name_cursor)),
            FormField::Deadline => Some((&mut self.deadline, &mut self.deadline_cursor)),
            FormField::Priority => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteTask(TaskId),
    DeleteCompleted(TaskId),
    ClearChest,
}

#[derive(Debug, Clone)]
pub struct ConfirmState {
    pub message: String,
    pub action: ConfirmAction,
}

/// Main application state
pub struct App {
    pub world: World,
    pub config: AppConfig,
    pub theme: Theme,
    pub data_dir: PathBuf,
    pub mode: Mode,
    pub focus: Focus,
    pub inventory_cursor: usize,
    pub chest_cursor: usize,
    pub form: Option<FormState>,
    pub confirm: Option<ConfirmState>,
    pub status_message: Option<String>,
    pub status_is_error: bool,
    pub should_quit: bool,
    /// Where the inventory grid was last drawn; particle anchors are computed from it
    pub inventory_area: Rect,
    last_save: Option<Instant>,
    next_save_attempt: Option<Instant>,
}

impl App {
    pub fn new(world: World, config: AppConfig, data_dir: PathBuf) -> Self {
        let theme = Theme::from_config(&config.ui);
        let mut app = App {
            world,
            theme,
            data_dir,
            mode: Mode::Navigate,
            focus: Focus::Inventory,
            inventory_cursor: 0,
            chest_cursor: 0,
            form: None,
            confirm: None,
            status_message: None,
            status_is_error: false,
            should_quit: false,
            inventory_area: Rect::default(),
            last_save: None,
            next_save_attempt: None,
            config,
        };
        app.world.set_sort_mode(app.config.tasks.default_sort);
        app
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Active tasks in display order
    pub fn inventory_view(&self) -> Vec<&Task> {
        self.world.snapshot(Utc::now()).active
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.inventory_view().get(self.inventory_cursor).copied()
    }

    pub fn selected_completed(&self) -> Option<&CompletedTask> {
        self.world.store().completed().nth(self.chest_cursor)
    }

    pub fn cursor(&self) -> usize {
        match self.focus {
            Focus::Inventory => self.inventory_cursor,
            Focus::Chest => self.chest_cursor,
        }
    }

    pub fn cursor_mut(&mut self) -> &mut usize {
        match self.focus {
            Focus::Inventory => &mut self.inventory_cursor,
            Focus::Chest => &mut self.chest_cursor,
        }
    }

    /// Keep the cursor on the same task after the display order changes
    pub fn follow_task(&mut self, id: &TaskId) {
        if let Some(pos) = self.inventory_view().iter().position(|t| &t.id == id) {
            self.inventory_cursor = pos;
        }
    }

    /// Centre of an inventory slot in particle space
    pub fn slot_anchor(&self, index: usize) -> crate::ops::particles::Point {
        let rect = render::grid::slot_rect(self.inventory_area, index);
        crate::ops::particles::Point {
            x: (rect.x as f32 + rect.width as f32 / 2.0) * render::particles::CELL_W,
            y: (rect.y as f32 + rect.height as f32 / 2.0) * render::particles::CELL_H,
        }
    }

    // -----------------------------------------------------------------------
    // Notifications
    // -----------------------------------------------------------------------

    pub fn notify(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_is_error = false;
    }

    pub fn notify_error(&mut self, message: impl std::fmt::Display) {
        self.status_message = Some(message.to_string());
        self.status_is_error = true;
    }

    // -----------------------------------------------------------------------
    // Time and persistence
    // -----------------------------------------------------------------------

    /// Advance animations and timers, then persist anything that changed
    pub fn tick(&mut self, now: Instant) {
        for event in self.world.tick(now) {
            match event {
                WorldEvent::Completed(done) => {
                    self.notify(format!(
                        "Mined {}! \"{}\" moved to the chest",
                        done.task.block().name(),
                        done.task.name
                    ));
                    self.clamp_cursors();
                }
                WorldEvent::Vanished(id) => debug!(%id, "break finished on a removed task"),
                WorldEvent::EffectFinished { .. } => {}
            }
        }

        self.save(now);
    }

    /// Write the task files if dirty. Failures are shown and retried later.
    pub fn save(&mut self, now: Instant) {
        if !self.world.is_dirty() || self.next_save_attempt.is_some_and(|t| now < t) {
            return;
        }
        let result = DataLock::acquire(&self.data_dir, Duration::from_millis(200))
            .map_err(|e| e.to_string())
            .and_then(|_lock| {
                storage::save_store(&self.data_dir, self.world.store()).map_err(|e| e.to_string())
            });
        match result {
            Ok(()) => {
                self.world.mark_saved();
                self.last_save = Some(now);
                self.next_save_attempt = None;
            }
            Err(e) => {
                warn!(error = %e, "save failed");
                self.notify_error(format!("save failed: {}", e));
                self.next_save_attempt = Some(now + SAVE_RETRY);
            }
        }
    }

    /// Called when the watcher reports changed files. Reloads right away so
    /// the next save writes on top of the external change.
    pub fn on_files_changed(&mut self, now: Instant) {
        if self
            .last_save
            .is_some_and(|t| now.saturating_duration_since(t) < SELF_WRITE_GRACE)
        {
            return;
        }
        self.reload_from_disk();
    }

    fn reload_from_disk(&mut self) {
        match config_io::load_config(&self.data_dir) {
            Ok(config) => {
                self.theme = Theme::from_config(&config.ui);
                self.config = config;
            }
            Err(e) => self.notify_error(e),
        }
        match storage::load_store(&self.data_dir) {
            Ok(store) => {
                let dropped = self.world.replace_store(store);
                self.clamp_cursors();
                info!(dropped = dropped.len(), "reloaded task files after external change");
                if dropped.is_empty() {
                    self.notify("reloaded from disk");
                } else {
                    self.notify(format!(
                        "reloaded from disk; {} break(s) stopped",
                        dropped.len()
                    ));
                }
            }
            Err(e) => self.notify_error(e),
        }
    }

    pub fn clamp_cursors(&mut self) {
        self.inventory_cursor = self.inventory_cursor.min(MAX_SLOTS - 1);
        self.chest_cursor = self.chest_cursor.min(MAX_SLOTS - 1);
    }

    pub fn ui_state(&self) -> UiState {
        UiState {
            sort_mode: self.world.sort_mode(),
            focus: self.focus.as_str().to_string(),
            inventory_cursor: self.inventory_cursor,
            chest_cursor: self.chest_cursor,
        }
    }

    pub fn restore_ui_state(&mut self, state: UiState) {
        self.world.set_sort_mode(state.sort_mode);
        self.focus = match state.focus.as_str() {
            "chest" => Focus::Chest,
            _ => Focus::Inventory,
        };
        self.inventory_cursor = state.inventory_cursor;
        self.chest_cursor = state.chest_cursor;
        self.clamp_cursors();
    }
}

fn save_ui_state(app: &App) {
    if let Err(e) = write_ui_state(&app.data_dir, &app.ui_state()) {
        warn!(error = %e, "could not write session state");
    }
}

/// Run the TUI against `data_dir`
pub fn run(data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = config_io::load_config(data_dir)?;
    let store = storage::load_store(data_dir)?;
    std::fs::create_dir_all(data_dir)?;

    let fresh = !storage::is_initialized(data_dir);
    let mut app = App::new(World::new(store), config, data_dir.to_path_buf());
    if let Some(state) = read_ui_state(data_dir) {
        app.restore_ui_state(state);
    }
    if fresh {
        app.notify("empty inventory: press a to add your first task");
    }
    let watcher = match DataWatcher::start(data_dir) {
        Ok(w) => Some(w),
        Err(e) => {
            warn!(error = %e, "file watcher unavailable");
            None
        }
    };
    info!(dir = %data_dir.display(), "tui started");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Restore the terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app, watcher.as_ref());

    // Flush anything still dirty, even if a retry was scheduled
    app.next_save_attempt = None;
    app.save(Instant::now());
    save_ui_state(&app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    watcher: Option<&DataWatcher>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut save_counter = 0u32;
    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        // Tick at frame rate while anything animates, otherwise idle
        let timeout = if app.world.is_animating() {
            Duration::from_millis(app.config.ui.frame_ms.max(1))
        } else {
            Duration::from_millis(250)
        };
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            input::handle_key(app, key);
            save_counter += 1;
            if save_counter >= 5 {
                save_ui_state(app);
                save_counter = 0;
            }
        }

        let now = Instant::now();
        if let Some(watcher) = watcher
            && !watcher.poll().is_empty()
        {
            app.on_files_changed(now);
        }
        app.tick(now);

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Priority;
    use crate::ops::particles::ParticleEngine;
    use crate::ops::sort::SortMode;
    use crate::ops::store::TaskStore;
    use tempfile::TempDir;

    fn app_in(dir: &TempDir) -> App {
        let world = World::with_particles(TaskStore::new(), ParticleEngine::seeded(5));
        App::new(world, AppConfig::default(), dir.path().to_path_buf())
    }

    #[test]
    fn completion_is_saved_on_tick() {
        let tmp = TempDir::new().unwrap();
        let mut app = app_in(&tmp);
        let id = app
            .world
            .create_task("Plant wheat", Priority::new(1).unwrap(), None)
            .unwrap()
            .id;
        let t0 = Instant::now();
        app.tick(t0);
        assert_eq!(storage::load_store(tmp.path()).unwrap().active_len(), 1);

        app.world
            .request_complete(&id, app.slot_anchor(0), t0)
            .unwrap();
        app.tick(t0 + Duration::from_millis(1000));

        let on_disk = storage::load_store(tmp.path()).unwrap();
        assert_eq!(on_disk.active_len(), 0);
        assert!(on_disk.get_completed(&id).is_some());
        assert!(app.status_message.as_deref().unwrap_or("").contains("Mined Dirt"));
    }

    #[test]
    fn external_change_survives_overlapping_breaks() {
        let tmp = TempDir::new().unwrap();
        let mut app = app_in(&tmp);
        let a = app
            .world
            .create_task("Chop logs", Priority::new(1).unwrap(), None)
            .unwrap()
            .id;
        let b = app
            .world
            .create_task("Slay wither", Priority::new(5).unwrap(), None)
            .unwrap()
            .id;
        let t0 = Instant::now();
        app.tick(t0);
        app.world.request_complete(&a, Default::default(), t0).unwrap();
        app.world.request_complete(&b, Default::default(), t0).unwrap();

        // Another process adds a task while both blocks are breaking
        let mut external = storage::load_store(tmp.path()).unwrap();
        external.create("from cli", Priority::new(3).unwrap(), None).unwrap();
        storage::save_store(tmp.path(), &external).unwrap();
        app.on_files_changed(t0 + Duration::from_secs(1));
        assert_eq!(app.world.pending_count(), 2);

        app.tick(t0 + Duration::from_millis(1100));
        app.tick(t0 + Duration::from_millis(4100));

        let on_disk = storage::load_store(tmp.path()).unwrap();
        let names: Vec<&str> = on_disk.active().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["from cli"]);
        assert_eq!(on_disk.completed_len(), 2);
        assert_eq!(app.world.store().active_len(), 1);
    }

    #[test]
    fn external_delete_stops_its_break() {
        let tmp = TempDir::new().unwrap();
        let mut app = app_in(&tmp);
        let id = app
            .world
            .create_task("Fish", Priority::new(2).unwrap(), None)
            .unwrap()
            .id;
        let t0 = Instant::now();
        app.tick(t0);
        app.world.request_complete(&id, Default::default(), t0).unwrap();

        let mut external = storage::load_store(tmp.path()).unwrap();
        external.delete(&id).unwrap();
        storage::save_store(tmp.path(), &external).unwrap();
        app.on_files_changed(t0 + Duration::from_secs(1));

        assert_eq!(app.world.pending_count(), 0);
        assert!(app.status_message.as_deref().unwrap_or("").contains("1 break(s) stopped"));
        app.tick(t0 + Duration::from_millis(1600));
        assert_eq!(app.world.store().completed_len(), 0);
    }

    #[test]
    fn own_save_does_not_trigger_reload() {
        let tmp = TempDir::new().unwrap();
        let mut app = app_in(&tmp);
        app.world
            .create_task("Tame cat", Priority::new(2).unwrap(), None)
            .unwrap();
        let t0 = Instant::now();
        app.tick(t0);
        app.on_files_changed(t0 + Duration::from_millis(100));
        assert_eq!(app.status_message, None);
    }

    #[test]
    fn ui_state_round_trip() {
        let tmp = TempDir::new().unwrap();
        let mut app = app_in(&tmp);
        app.world.set_sort_mode(SortMode::Deadline);
        app.focus = Focus::Chest;
        app.chest_cursor = 40;
        let state = app.ui_state();

        let mut other = app_in(&tmp);
        other.restore_ui_state(state);
        assert_eq!(other.world.sort_mode(), SortMode::Deadline);
        assert_eq!(other.focus, Focus::Chest);
        assert_eq!(other.chest_cursor, MAX_SLOTS - 1);
    }

    #[test]
    fn form_for_edit_prefills_fields() {
        let task = Task::new("Ride a pig".into(), Priority::new(4).unwrap(), None);
        let form = FormState::edit(&task);
        assert_eq!(form.name, "Ride a pig");
        assert_eq!(form.name_cursor, "Ride a pig".len());
        assert_eq!(form.priority, 4);
        assert!(form.deadline.is_empty());
        assert_eq!(form.kind, FormKind::Edit(task.id.clone()));
    }
}

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::ops::capacity::{self, MAX_SLOTS};
use crate::ops::completion::BreakStart;
use crate::tui::app::{App, ConfirmAction, ConfirmState, Focus, FormState, GRID_COLS, Mode};

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('c') {
            app.should_quit = true;
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc => app.status_message = None,
        KeyCode::Char('?') => app.mode = Mode::Help,
        KeyCode::Tab | KeyCode::BackTab => {
            app.focus = match app.focus {
                Focus::Inventory => Focus::Chest,
                Focus::Chest => Focus::Inventory,
            };
        }

        // Movement within the 3x9 grid
        KeyCode::Left | KeyCode::Char('h') => move_cursor(app, -1),
        KeyCode::Right | KeyCode::Char('l') => move_cursor(app, 1),
        KeyCode::Up | KeyCode::Char('k') => move_cursor(app, -(GRID_COLS as isize)),
        KeyCode::Down | KeyCode::Char('j') => move_cursor(app, GRID_COLS as isize),
        KeyCode::Home => *app.cursor_mut() = 0,
        KeyCode::End => *app.cursor_mut() = MAX_SLOTS - 1,

        _ => match app.focus {
            Focus::Inventory => handle_inventory_key(app, key.code),
            Focus::Chest => handle_chest_key(app, key.code),
        },
    }
}

fn move_cursor(app: &mut App, delta: isize) {
    let cursor = app.cursor_mut();
    let target = *cursor as isize + delta;
    if (0..MAX_SLOTS as isize).contains(&target) {
        *cursor = target as usize;
    }
}

fn handle_inventory_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('a') => open_add_form(app),
        KeyCode::Char('e') => {
            if let Some(task) = app.selected_task() {
                app.form = Some(FormState::edit(task));
                app.mode = Mode::Form;
            }
        }
        KeyCode::Enter | KeyCode::Char(' ') => start_breaking(app),
        KeyCode::Char('d') => {
            if let Some(task) = app.selected_task() {
                app.confirm = Some(ConfirmState {
                    message: format!("Delete \"{}\"?", task.name),
                    action: ConfirmAction::DeleteTask(task.id.clone()),
                });
                app.mode = Mode::Confirm;
            }
        }
        KeyCode::Char('s') => {
            let selected = app.selected_task().map(|t| t.id.clone());
            let mode = app.world.sort_mode().next();
            app.world.set_sort_mode(mode);
            if let Some(id) = selected {
                app.follow_task(&id);
            }
            app.notify(format!("sort: {}", mode));
        }
        _ => {}
    }
}

fn handle_chest_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('r') => {
            let Some(id) = app.selected_completed().map(|d| d.id().clone()) else {
                return;
            };
            match app.world.restore_completed(&id) {
                Ok(task) => {
                    app.notify(format!("restored \"{}\" to the inventory", task.name));
                    app.clamp_cursors();
                }
                Err(e) => app.notify_error(e),
            }
        }
        KeyCode::Char('d') => {
            if let Some(done) = app.selected_completed() {
                app.confirm = Some(ConfirmState {
                    message: format!("Delete \"{}\" from the chest?", done.task.name),
                    action: ConfirmAction::DeleteCompleted(done.id().clone()),
                });
                app.mode = Mode::Confirm;
            }
        }
        KeyCode::Char('D') => {
            let count = app.world.store().completed_len();
            if count == 0 {
                app.notify_error("the chest is already empty");
                return;
            }
            app.confirm = Some(ConfirmState {
                message: format!("Empty the chest ({} tasks)?", count),
                action: ConfirmAction::ClearChest,
            });
            app.mode = Mode::Confirm;
        }
        _ => {}
    }
}

fn open_add_form(app: &mut App) {
    if let Err(denied) = capacity::check_inventory(app.world.store().active_len()) {
        app.notify_error(denied);
        return;
    }
    app.form = Some(FormState::add(app.config.tasks.default_priority));
    app.mode = Mode::Form;
}

fn start_breaking(app: &mut App) {
    let Some(task) = app.selected_task() else {
        return;
    };
    let id = task.id.clone();
    let block = task.block();
    let anchor = app.slot_anchor(app.inventory_cursor);

    match app.world.request_complete(&id, anchor, Instant::now()) {
        Ok(BreakStart::Started { .. }) => app.notify(format!("breaking {}...", block.name())),
        Ok(BreakStart::AlreadyBreaking) => {}
        Err(e) => app.notify_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::AppConfig;
    use crate::model::task::Priority;
    use crate::ops::sort::SortMode;
    use crate::ops::world::World;
    use crate::tui::input::handle_key;
    use crate::tui::input::test_keys::{ch, key};
    use crate::ops::store::TaskStore;
    use std::path::PathBuf;

    fn app_with(names: &[(&str, u8)]) -> App {
        let mut world = World::new(TaskStore::new());
        for (name, p) in names {
            world
                .create_task(name, Priority::new(*p).unwrap(), None)
                .unwrap();
        }
        App::new(world, AppConfig::default(), PathBuf::from("/tmp/craftdo-test"))
    }

    #[test]
    fn cursor_moves_within_grid() {
        let mut app = app_with(&[]);
        handle_key(&mut app, key(KeyCode::Left));
        assert_eq!(app.inventory_cursor, 0);
        handle_key(&mut app, key(KeyCode::Down));
        assert_eq!(app.inventory_cursor, 9);
        handle_key(&mut app, ch('l'));
        assert_eq!(app.inventory_cursor, 10);
        handle_key(&mut app, key(KeyCode::End));
        handle_key(&mut app, key(KeyCode::Down));
        assert_eq!(app.inventory_cursor, 26);
    }

    #[test]
    fn tab_switches_grid_and_cursor() {
        let mut app = app_with(&[]);
        handle_key(&mut app, key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Chest);
        handle_key(&mut app, key(KeyCode::Right));
        assert_eq!(app.chest_cursor, 1);
        assert_eq!(app.inventory_cursor, 0);
    }

    #[test]
    fn enter_starts_breaking_selected_block() {
        let mut app = app_with(&[("Chop oak", 2)]);
        handle_key(&mut app, key(KeyCode::Enter));
        let id = app.selected_task().unwrap().id.clone();
        assert!(app.world.is_breaking(&id));
        assert_eq!(app.world.pending_count(), 1);

        // a second press is a no-op
        handle_key(&mut app, ch(' '));
        assert_eq!(app.world.pending_count(), 1);
    }

    #[test]
    fn sort_keeps_selection() {
        let mut app = app_with(&[("low", 1), ("high", 5)]);
        handle_key(&mut app, ch('l'));
        assert_eq!(app.selected_task().unwrap().name, "high");
        handle_key(&mut app, ch('s'));
        handle_key(&mut app, ch('s'));
        assert_eq!(app.world.sort_mode(), SortMode::Priority);
        assert_eq!(app.selected_task().unwrap().name, "high");
        assert_eq!(app.inventory_cursor, 0);
    }

    #[test]
    fn delete_asks_first() {
        let mut app = app_with(&[("Tame wolf", 3)]);
        handle_key(&mut app, ch('d'));
        assert_eq!(app.mode, Mode::Confirm);
        assert!(app.confirm.as_ref().unwrap().message.contains("Tame wolf"));
        assert_eq!(app.world.store().active_len(), 1);
    }

    #[test]
    fn add_refused_when_inventory_full() {
        let names: Vec<(String, u8)> = (0..MAX_SLOTS).map(|i| (format!("t{i}"), 1)).collect();
        let refs: Vec<(&str, u8)> = names.iter().map(|(n, p)| (n.as_str(), *p)).collect();
        let mut app = app_with(&refs);
        handle_key(&mut app, ch('a'));
        assert_eq!(app.mode, Mode::Navigate);
        assert!(app.status_is_error);
        assert!(app.status_message.as_deref().unwrap().contains("inventory is full"));
    }

    #[test]
    fn clear_empty_chest_is_an_error() {
        let mut app = app_with(&[]);
        handle_key(&mut app, key(KeyCode::Tab));
        handle_key(&mut app, ch('D'));
        assert_eq!(app.mode, Mode::Navigate);
        assert!(app.status_is_error);
    }

    #[test]
    fn q_quits() {
        let mut app = app_with(&[]);
        handle_key(&mut app, ch('q'));
        assert!(app.should_quit);
    }
}

use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::{App, ConfirmAction, Mode};

pub(super) fn handle_confirm(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            let state = app.confirm.take();
            app.mode = Mode::Navigate;
            if let Some(state) = state {
                run_action(app, state.action);
            }
        }
        // Cancel: n or Esc
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.confirm = None;
            app.mode = Mode::Navigate;
        }
        _ => {}
    }
}

fn run_action(app: &mut App, action: ConfirmAction) {
    let result = match action {
        ConfirmAction::DeleteTask(id) => app
            .world
            .delete_task(&id)
            .map(|task| format!("deleted \"{}\"", task.name)),
        ConfirmAction::DeleteCompleted(id) => app
            .world
            .delete_completed(&id)
            .map(|done| format!("deleted \"{}\" from the chest", done.task.name)),
        ConfirmAction::ClearChest => app
            .world
            .clear_completed()
            .map(|n| format!("cleared {} tasks from the chest", n)),
    };
    match result {
        Ok(message) => {
            app.notify(message);
            app.clamp_cursors();
        }
        Err(e) => app.notify_error(e),
    }
}

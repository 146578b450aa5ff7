use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::model::task::Priority;
use crate::ops::store::TaskUpdate;
use crate::tui::app::{App, FormField, FormKind, FormState, Mode};
use crate::util::time::parse_deadline;
use crate::util::unicode::{next_grapheme_boundary, prev_grapheme_boundary};

pub(super) fn handle_form(app: &mut App, key: KeyEvent) {
    let Some(form) = app.form.as_mut() else {
        app.mode = Mode::Navigate;
        return;
    };

    match key.code {
        KeyCode::Esc => {
            app.form = None;
            app.mode = Mode::Navigate;
            return;
        }
        KeyCode::Enter => {
            submit_form(app);
            return;
        }
        KeyCode::Tab | KeyCode::Down => form.field = form.field.next(),
        KeyCode::BackTab | KeyCode::Up => form.field = form.field.prev(),
        _ if form.field == FormField::Priority => edit_priority(form, key.code),
        _ => edit_text(form, key),
    }
}

fn edit_priority(form: &mut FormState, code: KeyCode) {
    match code {
        KeyCode::Left | KeyCode::Char('-') => {
            form.priority = form.priority.saturating_sub(1).max(Priority::MIN);
        }
        KeyCode::Right | KeyCode::Char('+') => {
            form.priority = (form.priority + 1).min(Priority::MAX);
        }
        KeyCode::Char(c) => {
            if let Some(n) = c.to_digit(10)
                && Priority::new(n as u8).is_some()
            {
                form.priority = n as u8;
            }
        }
        _ => {}
    }
}

fn edit_text(form: &mut FormState, key: KeyEvent) {
    let Some((text, cursor)) = form.text_mut() else {
        return;
    };
    match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            text.insert(*cursor, c);
            *cursor += c.len_utf8();
        }
        KeyCode::Char('u') => {
            // Ctrl-U clears the field
            text.clear();
            *cursor = 0;
        }
        KeyCode::Backspace => {
            if let Some(prev) = prev_grapheme_boundary(text, *cursor) {
                text.replace_range(prev..*cursor, "");
                *cursor = prev;
            }
        }
        KeyCode::Delete => {
            if let Some(next) = next_grapheme_boundary(text, *cursor) {
                text.replace_range(*cursor..next, "");
            }
        }
        KeyCode::Left => {
            if let Some(prev) = prev_grapheme_boundary(text, *cursor) {
                *cursor = prev;
            }
        }
        KeyCode::Right => {
            if let Some(next) = next_grapheme_boundary(text, *cursor) {
                *cursor = next;
            }
        }
        KeyCode::Home => *cursor = 0,
        KeyCode::End => *cursor = text.len(),
        _ => {}
    }
    form.error = None;
}

fn submit_form(app: &mut App) {
    let Some(form) = app.form.as_mut() else {
        return;
    };

    let name = form.name.trim().to_string();
    if name.is_empty() {
        form.error = Some("name cannot be empty".into());
        form.field = FormField::Name;
        return;
    }
    let priority = Priority::new(form.priority).unwrap_or_default();

    let deadline_text = form.deadline.trim();
    let deadline = match &form.original_deadline {
        _ if deadline_text.is_empty() => None,
        Some((shown, original)) if shown == deadline_text => Some(*original),
        _ => match parse_deadline(deadline_text, Utc::now()) {
            Ok(d) => Some(d),
            Err(e) => {
                form.error = Some(e.to_string());
                form.field = FormField::Deadline;
                return;
            }
        },
    };

    let kind = form.kind.clone();
    let result = match &kind {
        FormKind::Add => app.world.create_task(&name, priority, deadline),
        FormKind::Edit(id) => app.world.edit_task(
            id,
            TaskUpdate {
                name: Some(name),
                priority: Some(priority),
                deadline: Some(deadline),
            },
        ),
    };

    match result {
        Ok(task) => {
            app.form = None;
            app.mode = Mode::Navigate;
            app.follow_task(&task.id);
            match kind {
                FormKind::Add => app.notify(format!("added \"{}\"", task.name)),
                FormKind::Edit(_) => app.notify(format!("updated \"{}\"", task.name)),
            }
        }
        Err(e) => {
            if let Some(form) = app.form.as_mut() {
                form.error = Some(e.to_string());
            }
        }
    }
}

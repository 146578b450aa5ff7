use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::model::task::{BlockType, Priority};
use crate::tui::app::{App, FormField, FormKind, FormState};

use super::helpers::fixed_rect;

const LABEL_WIDTH: usize = 10;

/// Render the add/edit popup
pub fn render_form_popup(frame: &mut Frame, app: &App, area: Rect) {
    let Some(form) = &app.form else {
        return;
    };
    let bg = app.theme.background;
    let text_style = Style::default().fg(app.theme.text).bg(bg);
    let dim_style = Style::default().fg(app.theme.dim).bg(bg);
    let label_style = |field: FormField| {
        if form.field == field {
            Style::default()
                .fg(app.theme.highlight)
                .bg(bg)
                .add_modifier(Modifier::BOLD)
        } else {
            text_style
        }
    };

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(""));

    // Name
    let mut name = vec![Span::styled(
        format!(" {:<w$}", "Name", w = LABEL_WIDTH),
        label_style(FormField::Name),
    )];
    push_text_with_cursor(&mut name, app, form, FormField::Name);
    lines.push(Line::from(name));

    // Priority, shown as its block
    let block = BlockType::from_priority(form.priority);
    let arrows = |enabled: bool, s: &'static str| {
        if enabled {
            Span::styled(s, text_style)
        } else {
            Span::styled(s, dim_style)
        }
    };
    lines.push(Line::from(vec![
        Span::styled(
            format!(" {:<w$}", "Priority", w = LABEL_WIDTH),
            label_style(FormField::Priority),
        ),
        arrows(form.priority > Priority::MIN, "\u{25c2} "),
        Span::styled(
            format!("{} {} {}", form.priority, block.glyph(), block.name()),
            Style::default().fg(app.theme.block_color(block)).bg(bg),
        ),
        arrows(form.priority < Priority::MAX, " \u{25b8}"),
    ]));

    // Deadline
    let mut deadline = vec![Span::styled(
        format!(" {:<w$}", "Deadline", w = LABEL_WIDTH),
        label_style(FormField::Deadline),
    )];
    push_text_with_cursor(&mut deadline, app, form, FormField::Deadline);
    lines.push(Line::from(deadline));
    lines.push(Line::from(Span::styled(
        format!(" {:<w$}+30m  +2h  +1d  2025-06-01 18:00", "", w = LABEL_WIDTH),
        dim_style,
    )));

    lines.push(Line::from(""));
    match &form.error {
        Some(err) => lines.push(Line::from(Span::styled(
            format!(" {}", err),
            Style::default().fg(app.theme.red).bg(bg),
        ))),
        None => lines.push(Line::from("")),
    }

    let title = match form.kind {
        FormKind::Add => " Add task ",
        FormKind::Edit(_) => " Edit task ",
    };
    let popup = fixed_rect(56, lines.len() as u16 + 2, area);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            title,
            Style::default()
                .fg(app.theme.text_bright)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        ))
        .border_style(Style::default().fg(app.theme.slot).bg(bg))
        .style(Style::default().bg(bg));
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

fn push_text_with_cursor(
    spans: &mut Vec<Span<'static>>,
    app: &App,
    form: &FormState,
    field: FormField,
) {
    let bg = app.theme.background;
    let (text, cursor) = match field {
        FormField::Name => (&form.name, form.name_cursor),
        FormField::Deadline => (&form.deadline, form.deadline_cursor),
        FormField::Priority => return,
    };
    let style = Style::default().fg(app.theme.text_bright).bg(bg);
    if form.field != field {
        spans.push(Span::styled(text.clone(), style));
        return;
    }
    let cursor = cursor.min(text.len());
    spans.push(Span::styled(text[..cursor].to_string(), style));
    spans.push(Span::styled(
        "\u{258C}",
        Style::default().fg(app.theme.highlight).bg(bg),
    ));
    spans.push(Span::styled(text[cursor..].to_string(), style));
}

use std::time::Instant;

use chrono::Utc;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::ops::completion::breaking_time;
use crate::ops::deadline::{self, DeadlineStatus};
use crate::tui::app::{App, Focus};
use crate::util::time::{format_local, format_relative};
use crate::util::unicode::truncate_to_width;

/// Render details for the selected slot below the grids
pub fn render_detail_view(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let text_style = Style::default().fg(app.theme.text).bg(bg);
    let bright_style = Style::default()
        .fg(app.theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let dim_style = Style::default().fg(app.theme.dim).bg(bg);
    let width = area.width.saturating_sub(1) as usize;
    let now = Utc::now();

    let mut lines: Vec<Line<'static>> = Vec::new();
    match app.focus {
        Focus::Inventory => match app.selected_task() {
            Some(task) => {
                let block = task.block();
                lines.push(Line::from(Span::styled(
                    format!(" {}", truncate_to_width(&task.name, width)),
                    bright_style,
                )));

                let mut info = vec![
                    Span::styled(" ", text_style),
                    Span::styled(
                        block.name(),
                        Style::default().fg(app.theme.block_color(block)).bg(bg),
                    ),
                    Span::styled(format!(" \u{b7} P{}", task.priority), text_style),
                ];
                if let Some(progress) = app.world.break_progress(&task.id, Instant::now()) {
                    info.push(Span::styled(
                        format!(" \u{b7} breaking {:.0}%", progress * 100.0),
                        Style::default().fg(app.theme.yellow).bg(bg),
                    ));
                } else {
                    let secs = breaking_time(task.priority).as_secs_f32();
                    info.push(Span::styled(format!(" \u{b7} mines in {:.1}s", secs), dim_style));
                }
                lines.push(Line::from(info));

                let status = deadline::active_status(task, now);
                lines.push(match task.deadline {
                    Some(d) => {
                        let mut spans = vec![Span::styled(
                            format!(" due {} ({})", format_local(d), format_relative(d, now)),
                            Style::default().fg(app.theme.deadline_color(status)).bg(bg),
                        )];
                        if status != DeadlineStatus::Ok {
                            spans.push(Span::styled(
                                format!("  {}", status.label()),
                                Style::default()
                                    .fg(app.theme.deadline_color(status))
                                    .bg(bg)
                                    .add_modifier(Modifier::BOLD),
                            ));
                        }
                        Line::from(spans)
                    }
                    None => Line::from(Span::styled(" no deadline", dim_style)),
                });
            }
            None => lines.push(Line::from(Span::styled(" empty slot (a to add)", dim_style))),
        },
        Focus::Chest => match app.selected_completed() {
            Some(done) => {
                lines.push(Line::from(Span::styled(
                    format!(" {}", truncate_to_width(&done.task.name, width)),
                    bright_style,
                )));
                lines.push(Line::from(vec![
                    Span::styled(" ", text_style),
                    Span::styled(
                        done.task.block().name(),
                        Style::default()
                            .fg(app.theme.block_color(done.task.block()))
                            .bg(bg),
                    ),
                    Span::styled(
                        format!(
                            " \u{b7} mined {} ({})",
                            format_local(done.completed_at),
                            format_relative(done.completed_at, now)
                        ),
                        text_style,
                    ),
                ]));
                let late = deadline::completed_status(done) == DeadlineStatus::Overdue;
                lines.push(match done.task.deadline {
                    Some(d) if late => Line::from(Span::styled(
                        format!(" was due {}  late", format_local(d)),
                        Style::default().fg(app.theme.red).bg(bg),
                    )),
                    Some(d) => Line::from(Span::styled(
                        format!(" was due {}  on time", format_local(d)),
                        Style::default().fg(app.theme.green).bg(bg),
                    )),
                    None => Line::from(Span::styled(" no deadline", dim_style)),
                });
            }
            None => lines.push(Line::from(Span::styled(" empty slot", dim_style))),
        },
    }

    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), area);
}

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, Mode};
use crate::util::unicode;

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let mut spans = match &app.status_message {
        Some(message) => vec![Span::styled(
            format!(" {}", message),
            Style::default().fg(app.theme.yellow).bg(bg),
        )],
        None => {
            let mut spans = vec![Span::styled(
                format!(" {}", app.view.items_left_label()),
                Style::default().fg(app.theme.text).bg(bg),
            )];
            let completed = app.view.completed_count();
            if completed > 0 {
                spans.push(Span::styled(
                    format!("  {} completed", completed),
                    Style::default().fg(app.theme.dim).bg(bg),
                ));
            }
            spans
        }
    };

    let hint = match app.mode {
        Mode::Navigate => "a add  e edit  x toggle  d delete  c clear done  q quit",
        Mode::Add => "Enter add  Esc done",
        Mode::Edit => "Enter save  Esc cancel",
        Mode::Confirm => "y confirm  n cancel",
    };
    let content_width: usize = spans.iter().map(|s| unicode::display_width(&s.content)).sum();
    let hint_width = unicode::display_width(hint) + 1;
    if content_width + hint_width < width {
        let padding = width - content_width - hint_width;
        spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
        spans.push(Span::styled(hint, Style::default().fg(app.theme.dim).bg(bg)));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

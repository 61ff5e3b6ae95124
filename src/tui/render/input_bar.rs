use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, Mode};
use crate::util::unicode;

const PROMPT: &str = " \u{276F} ";
const PLACEHOLDER: &str = "What needs to be done?";

/// Render the add-item input on the first row of `area`
pub fn render_input_bar(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let active = app.mode == Mode::Add;
    let prompt_color = if active { app.theme.highlight } else { app.theme.dim };

    let mut spans = vec![Span::styled(PROMPT, Style::default().fg(prompt_color).bg(bg))];
    if app.add_input.is_empty() {
        spans.push(Span::styled(PLACEHOLDER, Style::default().fg(app.theme.dim).bg(bg)));
    } else {
        spans.push(Span::styled(
            app.add_input.text().to_string(),
            Style::default().fg(app.theme.text_bright).bg(bg),
        ));
    }

    let row = Rect { height: 1, ..area };
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(bg)),
        row,
    );

    if active {
        let col = unicode::display_width(PROMPT) + app.add_input.cursor_col();
        let x = (row.x as usize + col).min((row.x + row.width).saturating_sub(1) as usize);
        frame.set_cursor_position(Position::new(x as u16, row.y));
    }
}

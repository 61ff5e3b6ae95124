use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::model::item::Filter;
use crate::tui::app::{App, Mode};
use crate::util::unicode;
use crate::view::Row;

/// Width of the selection bar plus checkbox: "▎[x] "
const GUTTER: usize = 5;

/// Render the visible rows, scrolled so the cursor stays on screen
pub fn render_list_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let bg = app.theme.background;
    let height = area.height as usize;

    if app.view.rows.is_empty() {
        let message = match app.view.filter {
            Filter::All => "Nothing to do. Press a to add an item.",
            Filter::Active => "No active items.",
            Filter::Completed => "No completed items.",
        };
        let line = Line::from(Span::styled(
            format!("  {}", message),
            Style::default().fg(app.theme.dim).bg(bg),
        ));
        frame.render_widget(Paragraph::new(line).style(Style::default().bg(bg)), area);
        return;
    }

    app.scroll_to_cursor(height);
    let width = area.width as usize;
    let editing = app.row_edit.editing_id().map(str::to_string);

    let mut lines: Vec<Line> = Vec::with_capacity(height);
    for (idx, row) in app
        .view
        .rows
        .iter()
        .enumerate()
        .skip(app.scroll_offset)
        .take(height)
    {
        let selected = idx == app.cursor;
        let is_editing = editing.as_deref() == Some(row.id.as_str());
        lines.push(row_line(app, row, selected, is_editing, width));

        if is_editing
            && app.mode == Mode::Edit
            && let Some(input) = app.row_edit.input()
        {
            let col = (GUTTER + input.cursor_col()).min(width.saturating_sub(1));
            let y = area.y + (idx - app.scroll_offset) as u16;
            frame.set_cursor_position(Position::new(area.x + col as u16, y));
        }
    }

    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), area);
}

fn row_line<'a>(app: &App, row: &'a Row, selected: bool, editing: bool, width: usize) -> Line<'a> {
    let theme = &app.theme;
    let row_bg = if selected { theme.selection_bg } else { theme.background };
    let base = Style::default().bg(row_bg);

    let bar = if selected {
        Span::styled("\u{258E}", base.fg(theme.selection_border))
    } else {
        Span::styled(" ", base)
    };
    let (checkbox, check_color) = if row.completed {
        ("[x] ", theme.green)
    } else {
        ("[ ] ", theme.dim)
    };

    let available = width.saturating_sub(GUTTER);
    let title = match (editing, app.row_edit.input()) {
        (true, Some(input)) => Span::styled(
            unicode::truncate_to_width(input.text(), available),
            base.fg(theme.text_bright).add_modifier(Modifier::UNDERLINED),
        ),
        _ => {
            let mut style = base.fg(theme.title_color(row.completed));
            if row.completed {
                style = style.add_modifier(Modifier::CROSSED_OUT);
            }
            if selected {
                style = style.add_modifier(Modifier::BOLD);
            }
            Span::styled(unicode::truncate_to_width(&row.title, available), style)
        }
    };

    let mut spans = vec![bar, Span::styled(checkbox, base.fg(check_color)), title];
    if selected {
        // Carry the selection background to the right edge
        let used: usize = spans.iter().map(|s| unicode::display_width(&s.content)).sum();
        spans.push(Span::styled(" ".repeat(width.saturating_sub(used)), base));
    }
    Line::from(spans)
}

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::model::item::Filter;
use crate::tui::app::App;
use crate::util::unicode;

/// Render the filter tabs with a separator line below
pub fn render_tab_bar(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // tabs
            Constraint::Length(1), // separator
        ])
        .split(area);

    render_tabs(frame, app, chunks[0]);

    let sep = Paragraph::new(Line::from(Span::styled(
        "\u{2500}".repeat(chunks[1].width as usize),
        Style::default().fg(app.theme.dim).bg(app.theme.background),
    )));
    frame.render_widget(sep, chunks[1]);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let bg_style = Style::default().bg(bg);
    let sep = Span::styled("\u{2502}", Style::default().fg(app.theme.dim).bg(bg));

    let mut spans: Vec<Span> = vec![
        Span::styled(" ", bg_style),
        Span::styled("\u{2713}", Style::default().fg(app.theme.purple).bg(bg)),
        Span::styled(" ", bg_style),
    ];
    for filter in Filter::ALL {
        let is_current = app.view.filter == filter;
        spans.push(Span::styled(
            format!(" {} ", filter.label()),
            tab_style(app, is_current),
        ));
        spans.push(sep.clone());
    }

    // Backend name, right-aligned
    let label = format!("{} ", app.backend);
    let used: usize = spans.iter().map(|s| unicode::display_width(&s.content)).sum();
    let width = area.width as usize;
    if used + label.len() < width {
        spans.push(Span::styled(" ".repeat(width - used - label.len()), bg_style));
        spans.push(Span::styled(label, Style::default().fg(app.theme.dim).bg(bg)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).style(bg_style), area);
}

fn tab_style(app: &App, is_current: bool) -> Style {
    if is_current {
        Style::default()
            .fg(app.theme.text_bright)
            .bg(app.theme.selection_bg)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(app.theme.dim).bg(app.theme.background)
    }
}

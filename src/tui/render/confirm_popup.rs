use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::App;

use super::centered_rect_fixed;

/// Render the clear-all confirmation popup
pub fn render_confirm_popup(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let header_style = Style::default()
        .fg(app.theme.highlight)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let text_style = Style::default().fg(app.theme.text).bg(bg);
    let warn_style = Style::default().fg(app.theme.red).bg(bg);
    let dim_style = Style::default().fg(app.theme.dim).bg(bg);

    let count = app.confirm_count;
    let lines = vec![
        Line::from(Span::styled(" Clear All", header_style)),
        Line::from(Span::styled("", text_style)),
        Line::from(Span::styled(
            format!(
                "  Delete all {} item{}?",
                count,
                if count == 1 { "" } else { "s" }
            ),
            text_style,
        )),
        Line::from(Span::styled("  This cannot be undone.", warn_style)),
        Line::from(Span::styled("", text_style)),
        Line::from(vec![
            Span::styled("  ", text_style),
            Span::styled("y", dim_style),
            Span::styled(" confirm  ", text_style),
            Span::styled("n", dim_style),
            Span::styled(" cancel", text_style),
        ]),
    ];

    let popup_w: u16 = 36.min(area.width.saturating_sub(2));
    let popup_h = ((lines.len() as u16) + 2).min(area.height.saturating_sub(2));
    let overlay_area = centered_rect_fixed(popup_w, popup_h, area);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.highlight).bg(bg))
        .style(Style::default().bg(bg));

    frame.render_widget(
        Paragraph::new(lines).block(block).style(Style::default().bg(bg)),
        overlay_area,
    );
}

pub mod confirm_popup;
pub mod input_bar;
pub mod list_view;
pub mod status_row;
pub mod tab_bar;

#[cfg(test)]
pub mod test_helpers;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::widgets::Block;

use super::app::{App, Mode};

/// Draw the whole screen for the current mode
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Background fill
    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // Layout: tab bar (2 rows) | input bar | list | status row
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // filter tabs + separator
            Constraint::Length(2), // add input + spacer
            Constraint::Min(1),    // list
            Constraint::Length(1), // status row
        ])
        .split(area);

    tab_bar::render_tab_bar(frame, app, chunks[0]);
    input_bar::render_input_bar(frame, app, chunks[1]);
    list_view::render_list_view(frame, app, chunks[2]);
    status_row::render_status_row(frame, app, chunks[3]);

    if app.mode == Mode::Confirm {
        confirm_popup::render_confirm_popup(frame, app, frame.area());
    }
}

pub(super) fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

use std::cell::Cell;

use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

use crate::controller::Controller;
use crate::io::recovery::RecoveryLog;
use crate::model::config::Backend;
use crate::store::LocalStore;
use crate::store::testing::MemoryKeyValue;
use crate::tui::app::App;
use crate::tui::theme::Theme;

pub const TERM_W: u16 = 80;
pub const TERM_H: u16 = 24;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// An App over an in-memory local store holding `titles`, added in order
/// (so the last title is the newest and shows first).
pub fn test_app(titles: &[&str]) -> App {
    let tick = Cell::new(1_700_000_000_000);
    let store = LocalStore::open(
        Box::new(MemoryKeyValue::default()),
        "todo-items-v1",
        RecoveryLog::disabled(),
    )
    .with_clock(Box::new(move || {
        tick.set(tick.get() + 1);
        tick.get()
    }));
    let mut controller = Controller::new(Box::new(store));
    for title in titles {
        controller.submit(title);
    }
    App::new(controller, Theme::default(), Backend::Local)
}

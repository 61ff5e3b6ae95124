use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::{App, Mode};
use crate::view::TextInput;

use super::navigate::move_cursor;

/// Keys shared by every single-line input. Returns false for keys it
/// does not handle.
fn edit_text(input: &mut TextInput, key: KeyEvent) -> bool {
    let word = key.modifiers.contains(KeyModifiers::ALT)
        || key.modifiers.contains(KeyModifiers::CONTROL);
    match (key.modifiers, key.code) {
        // Home / Ctrl+A (macOS Cmd+Left sends ^A): jump to start of line
        (_, KeyCode::Home) => input.home(),
        (m, KeyCode::Char('a')) if m.contains(KeyModifiers::CONTROL) => input.home(),
        // End / Ctrl+E (macOS Cmd+Right sends ^E): jump to end of line
        (_, KeyCode::End) => input.end(),
        (m, KeyCode::Char('e')) if m.contains(KeyModifiers::CONTROL) => input.end(),
        // Kill to start of line: Ctrl+U (macOS Cmd+Backspace sends ^U)
        (m, KeyCode::Char('u')) if m.contains(KeyModifiers::CONTROL) => input.delete_to_start(),
        (m, KeyCode::Char('w')) if m.contains(KeyModifiers::CONTROL) => input.delete_word_back(),
        // Alt+b / Alt+f: readline word motion
        (m, KeyCode::Char('b')) if m.contains(KeyModifiers::ALT) => input.word_left(),
        (m, KeyCode::Char('f')) if m.contains(KeyModifiers::ALT) => input.word_right(),
        (_, KeyCode::Left) if word => input.word_left(),
        (_, KeyCode::Right) if word => input.word_right(),
        (_, KeyCode::Left) => input.left(),
        (_, KeyCode::Right) => input.right(),
        (_, KeyCode::Backspace) if word => input.delete_word_back(),
        (_, KeyCode::Backspace) => input.backspace(),
        (_, KeyCode::Delete) => input.delete(),
        (m, KeyCode::Char(c))
            if !m.contains(KeyModifiers::CONTROL) && !m.contains(KeyModifiers::ALT) =>
        {
            input.insert_char(c)
        }
        _ => return false,
    }
    true
}

/// Typing in the add bar
pub(super) fn handle_add(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            // Rejected titles stay in the bar
            if app.controller.submit(app.add_input.text()) {
                app.add_input.take();
                app.cursor = 0;
            }
        }
        KeyCode::Esc => app.mode = Mode::Navigate,
        _ => {
            edit_text(&mut app.add_input, key);
        }
    }
}

/// Editing the selected row
pub(super) fn handle_edit(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => commit(app),
        KeyCode::Esc => {
            app.row_edit.cancel(&mut app.controller);
            app.mode = Mode::Navigate;
        }
        // Leaving the row blurs it, which commits
        KeyCode::Tab => commit(app),
        KeyCode::Up => {
            commit(app);
            move_cursor(app, -1);
        }
        KeyCode::Down => {
            commit(app);
            move_cursor(app, 1);
        }
        _ => {
            if let Some(input) = app.row_edit.input_mut() {
                edit_text(input, key);
            }
        }
    }
}

fn commit(app: &mut App) {
    app.row_edit.commit(&mut app.controller);
    app.mode = Mode::Navigate;
    // The cursor moves relative to the rows as they are after the commit
    app.refresh();
}

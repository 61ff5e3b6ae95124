mod confirm;
mod edit;
mod navigate;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Mode};

use confirm::handle_confirm;
use edit::{handle_add, handle_edit};
use navigate::handle_navigate;

/// Handle a key event in the current mode
pub fn handle_key(app: &mut App, key: KeyEvent) {
    // Ignore bare modifier key presses (Shift, Ctrl, Alt, etc.)
    if matches!(key.code, KeyCode::Modifier(_)) {
        return;
    }
    app.status_message = None;

    let key = normalize_key(key);
    match app.mode {
        Mode::Navigate => handle_navigate(app, key),
        Mode::Add => handle_add(app, key),
        Mode::Edit => handle_edit(app, key),
        Mode::Confirm => handle_confirm(app, key),
    }
    app.refresh();
}

/// Handle a bracketed paste. Only text inputs take pasted text.
pub fn handle_paste(app: &mut App, text: &str) {
    match app.mode {
        Mode::Add => app.add_input.insert_str(text),
        Mode::Edit => {
            if let Some(input) = app.row_edit.input_mut() {
                input.insert_str(text);
            }
        }
        Mode::Navigate | Mode::Confirm => {}
    }
}

/// Terminals report Shift+c as `Char('c')` with SHIFT on some platforms and
/// as `Char('C')` on others. Normalize to the uppercase form.
fn normalize_key(mut key: KeyEvent) -> KeyEvent {
    if let KeyCode::Char(c) = key.code
        && key.modifiers.contains(KeyModifiers::SHIFT)
        && c.is_ascii_lowercase()
    {
        key.code = KeyCode::Char(c.to_ascii_uppercase());
    }
    key
}

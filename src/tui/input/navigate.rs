use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::model::item::Filter;
use crate::tui::app::{App, Mode};

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    match (key.modifiers, key.code) {
        (_, KeyCode::Char('q')) => app.should_quit = true,
        (m, KeyCode::Char('c')) if m.contains(KeyModifiers::CONTROL) => app.should_quit = true,

        // Add
        (_, KeyCode::Char('a') | KeyCode::Char('i')) => app.mode = Mode::Add,

        // Movement
        (_, KeyCode::Char('j') | KeyCode::Down) => move_cursor(app, 1),
        (_, KeyCode::Char('k') | KeyCode::Up) => move_cursor(app, -1),
        (_, KeyCode::Char('g') | KeyCode::Home) => app.cursor = 0,
        (_, KeyCode::Char('G') | KeyCode::End) => {
            app.cursor = app.view.rows.len().saturating_sub(1);
        }

        // Row actions
        (_, KeyCode::Char(' ') | KeyCode::Char('x')) => toggle_selected(app),
        (_, KeyCode::Char('e') | KeyCode::Enter) => begin_edit(app),
        (_, KeyCode::Char('d') | KeyCode::Delete) => {
            if let Some(id) = app.selected_id().map(str::to_string) {
                app.controller.remove(&id);
            }
        }

        // Filters
        (_, KeyCode::Tab) => {
            let next = app.controller.filter().next();
            set_filter(app, next);
        }
        (_, KeyCode::Char('1')) => set_filter(app, Filter::All),
        (_, KeyCode::Char('2')) => set_filter(app, Filter::Active),
        (_, KeyCode::Char('3')) => set_filter(app, Filter::Completed),

        // Bulk
        (_, KeyCode::Char('c')) => {
            let removed = app.controller.clear_completed();
            if removed == 0 {
                app.status_message = Some("no completed items".to_string());
            }
        }
        (_, KeyCode::Char('C')) => {
            if app.controller.clear_all_is_noop() {
                app.status_message = Some("list is already empty".to_string());
            } else {
                app.confirm_count = app.controller.items().len();
                app.mode = Mode::Confirm;
            }
        }
        _ => {}
    }
}

pub(super) fn move_cursor(app: &mut App, delta: isize) {
    let len = app.view.rows.len();
    if len == 0 {
        app.cursor = 0;
        return;
    }
    app.cursor = app.cursor.saturating_add_signed(delta).min(len - 1);
}

fn set_filter(app: &mut App, filter: Filter) {
    app.controller.set_filter(filter);
    app.cursor = 0;
    app.scroll_offset = 0;
}

fn toggle_selected(app: &mut App) {
    let Some(row) = app.view.rows.get(app.cursor) else {
        return;
    };
    let (id, completed) = (row.id.clone(), row.completed);
    app.controller.toggle_complete(&id, !completed);
}

fn begin_edit(app: &mut App) {
    let Some(row) = app.view.rows.get(app.cursor) else {
        return;
    };
    let (id, title) = (row.id.clone(), row.title.clone());
    if app.row_edit.begin(&id, &title) {
        app.mode = Mode::Edit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::render::test_helpers::test_app;

    #[test]
    fn cursor_stays_in_bounds() {
        let mut app = test_app(&["a", "b"]);
        move_cursor(&mut app, -1);
        assert_eq!(app.cursor, 0);
        move_cursor(&mut app, 5);
        assert_eq!(app.cursor, 1);

        let mut empty = test_app(&[]);
        move_cursor(&mut empty, 1);
        assert_eq!(empty.cursor, 0);
    }

    #[test]
    fn actions_on_empty_list_are_ignored() {
        let mut app = test_app(&[]);
        for code in [KeyCode::Char('x'), KeyCode::Char('e'), KeyCode::Char('d')] {
            handle_navigate(&mut app, KeyEvent::new(code, KeyModifiers::NONE));
        }
        assert_eq!(app.mode, Mode::Navigate);
        assert!(app.controller.items().is_empty());
    }

    #[test]
    fn filter_change_resets_cursor() {
        let mut app = test_app(&["a", "b", "c"]);
        app.cursor = 2;
        handle_navigate(&mut app, KeyEvent::new(KeyCode::Char('2'), KeyModifiers::NONE));
        assert_eq!(app.controller.filter(), Filter::Active);
        assert_eq!(app.cursor, 0);
    }
}

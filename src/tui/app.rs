use std::cell::Cell;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use crossterm::event::{self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::controller::Controller;
use crate::model::config::Backend;
use crate::model::workspace::Workspace;
use crate::store;
use crate::view::{ListView, RowEdit, TextInput};

use super::input;
use super::render;
use super::theme::Theme;

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    /// Typing a new item in the input bar
    Add,
    /// Editing the title of the selected row
    Edit,
    /// Clear-all confirmation popup is open
    Confirm,
}

/// Main application state
pub struct App {
    pub controller: Controller,
    /// Projection of the controller state currently on screen
    pub view: ListView,
    pub mode: Mode,
    pub should_quit: bool,
    pub theme: Theme,
    pub backend: Backend,
    /// Cursor index into `view.rows`
    pub cursor: usize,
    /// First visible row
    pub scroll_offset: usize,
    pub add_input: TextInput,
    pub row_edit: RowEdit,
    /// Item count shown in the clear-all popup
    pub confirm_count: usize,
    /// One-shot message for the status row, cleared on the next key
    pub status_message: Option<String>,
    dirty: Rc<Cell<bool>>,
}

impl App {
    pub fn new(mut controller: Controller, theme: Theme, backend: Backend) -> Self {
        let dirty = Rc::new(Cell::new(false));
        let flag = dirty.clone();
        controller.set_render_hook(Box::new(move |_| flag.set(true)));
        let view = controller.view();
        App {
            controller,
            view,
            mode: Mode::Navigate,
            should_quit: false,
            theme,
            backend,
            cursor: 0,
            scroll_offset: 0,
            add_input: TextInput::default(),
            row_edit: RowEdit::default(),
            confirm_count: 0,
            status_message: None,
            dirty,
        }
    }

    /// Id of the row under the cursor
    pub fn selected_id(&self) -> Option<&str> {
        self.view.rows.get(self.cursor).map(|r| r.id.as_str())
    }

    /// Pick up controller changes. The cursor follows its row when the row
    /// moves and is clamped when it disappears.
    pub fn refresh(&mut self) {
        if !self.dirty.replace(false) {
            return;
        }
        let selected = self.selected_id().map(str::to_string);
        self.view = self.controller.view();
        if let Some(pos) = selected.as_deref().and_then(|id| self.view.position(id)) {
            self.cursor = pos;
        } else {
            self.clamp_cursor();
        }
        // A pushed snapshot can delete the row being edited
        let orphaned = self
            .row_edit
            .editing_id()
            .is_some_and(|id| self.view.position(id).is_none());
        if orphaned {
            self.row_edit = RowEdit::Viewing;
            if self.mode == Mode::Edit {
                self.mode = Mode::Navigate;
            }
        }
    }

    pub fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.view.rows.len().saturating_sub(1));
    }

    /// Keep the cursor inside a viewport of `height` rows
    pub fn scroll_to_cursor(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.cursor < self.scroll_offset {
            self.scroll_offset = self.cursor;
        } else if self.cursor >= self.scroll_offset + height {
            self.scroll_offset = self.cursor + 1 - height;
        }
    }
}

/// Run the TUI against the store selected for `workspace`
pub fn run(workspace: &Workspace, backend: Backend) -> Result<(), Box<dyn std::error::Error>> {
    let store = store::open(workspace, backend)?;
    let controller = Controller::new(store);
    let theme = Theme::from_config(&workspace.config.ui);
    let mut app = App::new(controller, theme, backend);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableBracketedPaste, LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        app.controller.pump();
        app.refresh();
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(250))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    input::handle_key(app, key);
                }
                Event::Paste(text) => input::handle_paste(app, &text),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

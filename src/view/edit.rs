use crate::controller::Controller;
use crate::util::unicode;

/// Single-line text buffer with a byte-offset cursor on grapheme boundaries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    text: String,
    cursor: usize,
}

impl TextInput {
    /// Buffer pre-filled with `text`, cursor at the end
    pub fn new(text: &str) -> Self {
        TextInput {
            text: text.to_string(),
            cursor: text.len(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Terminal column of the cursor
    pub fn cursor_col(&self) -> usize {
        unicode::byte_offset_to_display_col(&self.text, self.cursor)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn insert_char(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    /// Insert pasted text. Line breaks become spaces.
    pub fn insert_str(&mut self, s: &str) {
        let clean = s.replace("\r\n", " ").replace(['\n', '\r'], " ");
        self.text.insert_str(self.cursor, &clean);
        self.cursor += clean.len();
    }

    pub fn backspace(&mut self) {
        if let Some(prev) = unicode::prev_grapheme_boundary(&self.text, self.cursor) {
            self.text.replace_range(prev..self.cursor, "");
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if let Some(next) = unicode::next_grapheme_boundary(&self.text, self.cursor) {
            self.text.replace_range(self.cursor..next, "");
        }
    }

    pub fn delete_word_back(&mut self) {
        let start = unicode::word_boundary_left(&self.text, self.cursor);
        self.text.replace_range(start..self.cursor, "");
        self.cursor = start;
    }

    /// Kill from the start of the line to the cursor
    pub fn delete_to_start(&mut self) {
        self.text.replace_range(..self.cursor, "");
        self.cursor = 0;
    }

    pub fn left(&mut self) {
        if let Some(prev) = unicode::prev_grapheme_boundary(&self.text, self.cursor) {
            self.cursor = prev;
        }
    }

    pub fn right(&mut self) {
        if let Some(next) = unicode::next_grapheme_boundary(&self.text, self.cursor) {
            self.cursor = next;
        }
    }

    pub fn word_left(&mut self) {
        self.cursor = unicode::word_boundary_left(&self.text, self.cursor);
    }

    pub fn word_right(&mut self) {
        self.cursor = unicode::word_boundary_right(&self.text, self.cursor);
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.text.len();
    }

    /// Empty the buffer, returning what it held
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }
}

/// Edit state of the list. At most one row edits at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RowEdit {
    #[default]
    Viewing,
    Editing { id: String, input: TextInput },
}

impl RowEdit {
    /// Start editing a row with its current title. Ignored (returns false)
    /// while a row is already being edited.
    pub fn begin(&mut self, id: &str, title: &str) -> bool {
        if self.is_editing() {
            return false;
        }
        *self = RowEdit::Editing {
            id: id.to_string(),
            input: TextInput::new(title),
        };
        true
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, RowEdit::Editing { .. })
    }

    pub fn editing_id(&self) -> Option<&str> {
        match self {
            RowEdit::Editing { id, .. } => Some(id),
            RowEdit::Viewing => None,
        }
    }

    pub fn input(&self) -> Option<&TextInput> {
        match self {
            RowEdit::Editing { input, .. } => Some(input),
            RowEdit::Viewing => None,
        }
    }

    pub fn input_mut(&mut self) -> Option<&mut TextInput> {
        match self {
            RowEdit::Editing { input, .. } => Some(input),
            RowEdit::Viewing => None,
        }
    }

    /// Enter or blur: hand the buffer to the controller and go back to
    /// viewing. Returns whether a new title was persisted.
    pub fn commit(&mut self, controller: &mut Controller) -> bool {
        match std::mem::take(self) {
            RowEdit::Editing { id, input } => controller.commit_edit(&id, input.text()),
            RowEdit::Viewing => false,
        }
    }

    /// Escape: drop the buffer without touching the store
    pub fn cancel(&mut self, controller: &mut Controller) {
        if self.is_editing() {
            *self = RowEdit::Viewing;
            controller.rerender();
        }
    }
}

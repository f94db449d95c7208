use std::mem;

/// Text of the line being edited plus the cursor position within it.
///
/// The cursor is a byte offset that always sits on a character boundary.
#[derive(Debug, Default)]
pub struct Buffer {
    text: String,
    cursor: usize,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte offset of the cursor.
    #[cfg(test)]
    fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of columns between the cursor and the end of the line.
    pub fn columns_after_cursor(&self) -> usize {
        self.text[self.cursor..].chars().count()
    }

    /// Move the text out of the buffer, leaving it empty.
    pub fn take_text(&mut self) -> String {
        self.cursor = 0;
        mem::take(&mut self.text)
    }

    /// Replace the whole line, placing the cursor at the end.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.len();
    }

    pub fn move_left(&mut self) {
        if let Some(c) = self.text[..self.cursor].chars().next_back() {
            self.cursor -= c.len_utf8();
        }
    }

    pub fn move_right(&mut self) {
        if let Some(c) = self.text[self.cursor..].chars().next() {
            self.cursor += c.len_utf8();
        }
    }

    pub fn move_to_start_of_line(&mut self) {
        self.cursor = 0;
    }

    pub fn move_to_end_of_line(&mut self) {
        self.cursor = self.text.len();
    }

    /// Insert a character at the cursor and advance past it.
    pub fn insert_char(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn delete_before_cursor(&mut self) {
        if let Some(c) = self.text[..self.cursor].chars().next_back() {
            self.cursor -= c.len_utf8();
            self.text.remove(self.cursor);
        }
    }

    pub fn delete_after_cursor(&mut self) {
        if self.cursor < self.text.len() {
            self.text.remove(self.cursor);
        }
    }

    /// Delete everything before the cursor.
    pub fn delete_to_start_of_line(&mut self) {
        self.text.drain(..self.cursor);
        self.cursor = 0;
    }

    /// Clears the buffer text and moves the cursor to the beginning.
    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }
}

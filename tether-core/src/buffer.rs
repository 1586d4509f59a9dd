use std::fmt;

/// The line being composed, not yet sent to the backend.
///
/// The cursor is stored as the number of characters to its *right*, so the
/// common case (typing at the end) is offset 0 and never needs adjusting.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    content: Vec<char>,
    cursor_offset: usize,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn cursor_offset(&self) -> usize {
        self.cursor_offset
    }

    pub fn chars(&self) -> &[char] {
        &self.content
    }

    /// Characters left of the cursor.
    pub fn left(&self) -> &[char] {
        &self.content[..self.split()]
    }

    /// Characters right of the cursor.
    pub fn right(&self) -> &[char] {
        &self.content[self.split()..]
    }

    pub fn right_string(&self) -> String {
        self.right().iter().collect()
    }

    fn split(&self) -> usize {
        self.content.len() - self.cursor_offset
    }

    /// Insert `c` just left of the cursor.
    pub fn insert(&mut self, c: char) {
        if self.cursor_offset == 0 || c == '\r' {
            self.content.push(c);
        } else {
            let at = self.split();
            self.content.insert(at, c);
        }
    }

    /// Remove up to `n` characters left of the cursor. Returns how many went.
    pub fn delete_before_cursor(&mut self, n: usize) -> usize {
        let end = self.split();
        let n = n.min(end);
        if n == 0 {
            return 0;
        }
        self.content.drain(end - n..end);
        n
    }

    /// Returns false when already at the end.
    pub fn move_cursor_forward(&mut self) -> bool {
        if self.cursor_offset == 0 {
            return false;
        }
        self.cursor_offset -= 1;
        true
    }

    /// Returns false when already at the start.
    pub fn move_cursor_back(&mut self) -> bool {
        if self.cursor_offset >= self.content.len() {
            return false;
        }
        self.cursor_offset += 1;
        true
    }

    pub fn move_to_end(&mut self) {
        self.cursor_offset = 0;
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor_offset = 0;
    }

    /// Empty the buffer and hand back what it held.
    pub fn take(&mut self) -> String {
        let line = self.to_string();
        self.clear();
        line
    }
}

impl fmt::Display for EditBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.content {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

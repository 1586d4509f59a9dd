//! Caret arithmetic under line wrapping.
//!
//! The terminal offers no "go to column N of my line" primitive that survives
//! wrapping, so every caret move is a relative delta from a position we can
//! compute: the screen cell just after the last character of the buffer.
//! Positions are counted in characters from the start of the displayed prefix.

/// A relative caret move. Positive `rows` is up, positive `cols` is right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaretDelta {
    pub rows: isize,
    pub cols: isize,
}

impl CaretDelta {
    pub fn is_zero(&self) -> bool {
        self.rows == 0 && self.cols == 0
    }
}

impl std::ops::Neg for CaretDelta {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            rows: -self.rows,
            cols: -self.cols,
        }
    }
}

/// Layout snapshot: everything needed to place the caret, nothing cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wrap {
    pub prefix_len: usize,
    pub content_len: usize,
    pub cursor_offset: usize,
    pub width: usize,
}

impl Wrap {
    pub fn new(prefix_len: usize, content_len: usize, cursor_offset: usize, width: usize) -> Self {
        Self {
            prefix_len,
            content_len,
            cursor_offset,
            width: width.max(1),
        }
    }

    /// Prefix plus content, in characters.
    pub fn total(&self) -> usize {
        self.prefix_len + self.content_len
    }

    /// Absolute position of the logical cursor.
    pub fn caret(&self) -> usize {
        self.total().saturating_sub(self.cursor_offset)
    }

    /// Wrapped row of the caret, counted from the row the prefix starts on.
    pub fn caret_row(&self) -> usize {
        self.caret() / self.width
    }

    /// Move from the end of the content to `offset` characters before it.
    pub fn offset_to_caret(&self, offset: usize) -> CaretDelta {
        let w = self.width;
        let total = self.total();
        let target = total.saturating_sub(offset);

        if total / w == target / w {
            return CaretDelta {
                rows: 0,
                cols: -((total - target) as isize),
            };
        }

        CaretDelta {
            rows: (total / w) as isize - (target / w) as isize,
            cols: (target % w) as isize - (total % w) as isize,
        }
    }

    /// Caret sits in the last column of a row.
    pub fn at_end_of_row(&self) -> bool {
        self.caret() % self.width == self.width - 1
    }

    /// Caret sits in the first column of a row.
    pub fn at_start_of_row(&self) -> bool {
        self.caret() % self.width == 0
    }
}

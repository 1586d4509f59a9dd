//! Screen renderer.
//!
//! Keeps the real terminal in step with the [`EditBuffer`]. Every method
//! assumes the physical caret is where the logical cursor says it is, and
//! leaves it there again when it returns.

use crossterm::QueueableCommand;
use crossterm::cursor::{MoveDown, MoveLeft, MoveRight, MoveTo, MoveUp};
use crossterm::terminal::{Clear, ClearType};
use std::io::{self, Write};

use crate::buffer::EditBuffer;
use crate::wrap::{CaretDelta, Wrap};

/// DCH: delete the character under the caret. crossterm has no command for it.
const DCH: &[u8] = b"\x1b[P";
const CRLF: &[u8] = b"\r\n";

/// Cursor counts are `u16` on the wire.
fn cells(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

#[derive(Debug)]
pub struct Screen<W: Write> {
    out: W,
}

impl<W: Write> Screen<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.out.write_all(bytes)
    }

    pub fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.out.write_all(s.as_bytes())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn crlf(&mut self) -> io::Result<()> {
        self.out.write_all(CRLF)
    }

    pub fn emit_relative_move(&mut self, delta: CaretDelta) -> io::Result<()> {
        let rows = cells(delta.rows.unsigned_abs());
        let cols = cells(delta.cols.unsigned_abs());
        if delta.rows > 0 {
            self.out.queue(MoveUp(rows))?;
        } else if delta.rows < 0 {
            self.out.queue(MoveDown(rows))?;
        }
        if delta.cols > 0 {
            self.out.queue(MoveRight(cols))?;
        } else if delta.cols < 0 {
            self.out.queue(MoveLeft(cols))?;
        }
        Ok(())
    }

    /// One column right, dropping to the start of the next row from the last column.
    pub fn caret_forward(&mut self, wrap: &Wrap) -> io::Result<()> {
        if wrap.at_end_of_row() {
            self.out
                .queue(MoveDown(1))?
                .queue(MoveLeft(cells(wrap.width)))?;
        } else {
            self.out.queue(MoveRight(1))?;
        }
        Ok(())
    }

    /// One column left, climbing to the end of the previous row from column 0.
    pub fn caret_back(&mut self, wrap: &Wrap) -> io::Result<()> {
        if wrap.at_start_of_row() {
            self.out
                .queue(MoveUp(1))?
                .queue(MoveRight(cells(wrap.width)))?;
        } else {
            self.out.queue(MoveLeft(1))?;
        }
        Ok(())
    }

    /// Show a character the buffer has just taken in. `wrap` describes the
    /// buffer after the insertion.
    pub fn render_insert(&mut self, c: char, buffer: &EditBuffer, wrap: &Wrap) -> io::Result<()> {
        let mut text = String::with_capacity(buffer.cursor_offset() + 1);
        text.push(c);
        if buffer.cursor_offset() > 0 {
            text.extend(buffer.right());
        }
        self.write_str(&text)?;

        // The terminal holds the caret in the last column until the next
        // printable arrives; force the wrap so the arithmetic stays exact.
        if wrap.total() % wrap.width == 0 {
            self.crlf()?;
        }
        self.emit_relative_move(wrap.offset_to_caret(buffer.cursor_offset()))
    }

    /// Delete the character left of the cursor, on screen and in `buffer`.
    /// Returns false if there was nothing to delete.
    pub fn render_backspace(
        &mut self,
        buffer: &mut EditBuffer,
        prefix_len: usize,
        width: usize,
    ) -> io::Result<bool> {
        if buffer.left().is_empty() {
            return Ok(false);
        }
        let before = Wrap::new(prefix_len, buffer.len(), buffer.cursor_offset(), width);
        self.caret_back(&before)?;

        let offset = buffer.cursor_offset();
        if offset == 0 {
            self.write_bytes(DCH)?;
            buffer.delete_before_cursor(1);
            return Ok(true);
        }

        self.write_str(&buffer.right_string())?;
        // Shifting the tail left empties the last row: step onto it before DCH.
        if (before.total() - 1) % before.width == 0 {
            self.crlf()?;
        }
        self.write_bytes(DCH)?;
        buffer.delete_before_cursor(1);

        let after = Wrap::new(prefix_len, buffer.len(), offset, width);
        self.emit_relative_move(after.offset_to_caret(offset))?;
        Ok(true)
    }

    /// Walk the caret from the cursor to the end of the content.
    pub fn caret_to_end(&mut self, wrap: &Wrap) -> io::Result<()> {
        self.emit_relative_move(-wrap.offset_to_caret(wrap.cursor_offset))
    }

    /// Erase prefix and content, leaving the caret where the prefix began.
    pub fn clear_current_line(&mut self, wrap: &Wrap) -> io::Result<()> {
        let rows = wrap.caret_row();
        if rows > 0 {
            self.out.queue(MoveUp(cells(rows)))?;
        }
        self.out
            .queue(MoveLeft(cells(wrap.width)))?
            .queue(Clear(ClearType::FromCursorDown))?;
        Ok(())
    }

    /// Caret home and wipe the whole display.
    pub fn clear_screen(&mut self) -> io::Result<()> {
        self.out.queue(MoveTo(0, 0))?.queue(Clear(ClearType::All))?;
        Ok(())
    }

    /// Print prefix and content from an erased row, then place the caret.
    pub fn redraw(&mut self, prefix: &str, buffer: &EditBuffer, wrap: &Wrap) -> io::Result<()> {
        let mut text = String::with_capacity(prefix.len() + buffer.len());
        text.push_str(prefix);
        text.extend(buffer.chars());
        self.write_str(&text)?;
        if wrap.total() > 0 && wrap.total() % wrap.width == 0 {
            self.crlf()?;
        }
        self.emit_relative_move(wrap.offset_to_caret(buffer.cursor_offset()))
    }
}

//! The line-editing driver.
//!
//! Owns the parser, the edit buffer and the screen. Every keystroke byte goes
//! through [`Driver::handle_byte`], which runs it through the parser, applies
//! the resulting action to the buffer and mirrors it on the terminal before
//! returning. Completed lines go to a [`Backend`].

use serde::{Deserialize, Serialize};
use std::io::{self, Write};

use crate::buffer::EditBuffer;
use crate::commands::{CommandTable, Trigger};
use crate::context::ContextHandle;
use crate::error::{DriverError, SequenceError};
use crate::parser::{Action, Parser, ParserState};
use crate::screen::Screen;
use crate::wrap::Wrap;

/// Where submitted lines go.
pub trait Backend {
    /// `line` already ends with the carriage return.
    fn submit(&mut self, line: &[u8]) -> io::Result<()>;
}

impl Backend for Vec<u8> {
    fn submit(&mut self, line: &[u8]) -> io::Result<()> {
        self.extend_from_slice(line);
        Ok(())
    }
}

/// What to do when a keystroke sequence cannot be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Hand the error to the caller; the session is expected to end.
    Strict,
    /// Log it, drop the sequence, and go back to `Ground`.
    #[default]
    Resilient,
}

/// Outcome of one byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Continue,
    /// A line (plus CR) was written to the backend.
    Submitted,
    /// A registered command matched; nothing was sent to the backend.
    Command { name: String, line: String },
    /// Resilient mode swallowed a bad sequence.
    Discarded(SequenceError),
}

pub type DebugHook = Box<dyn FnMut(u8) + Send>;

pub struct Driver<W: Write> {
    parser: Parser,
    buffer: EditBuffer,
    screen: Screen<W>,
    ctx: ContextHandle,
    commands: CommandTable,
    policy: ErrorPolicy,
    debug_hook: Option<DebugHook>,
}

impl<W: Write> std::fmt::Debug for Driver<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("parser", &self.parser)
            .field("buffer", &self.buffer)
            .field("ctx", &self.ctx)
            .field("commands", &self.commands.len())
            .field("policy", &self.policy)
            .field("debug_hook", &self.debug_hook.is_some())
            .finish()
    }
}

impl<W: Write> Driver<W> {
    pub fn new(out: W, ctx: ContextHandle) -> Self {
        Self {
            parser: Parser::new(),
            buffer: EditBuffer::new(),
            screen: Screen::new(out),
            ctx,
            commands: CommandTable::new(),
            policy: ErrorPolicy::default(),
            debug_hook: None,
        }
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_commands(mut self, commands: CommandTable) -> Self {
        self.commands = commands;
        self
    }

    pub fn set_debug_hook(&mut self, hook: Option<DebugHook>) {
        self.debug_hook = hook;
    }

    pub fn state(&self) -> ParserState {
        self.parser.state()
    }

    /// The line as typed so far.
    pub fn content(&self) -> String {
        self.buffer.to_string()
    }

    pub fn cursor_offset(&self) -> usize {
        self.buffer.cursor_offset()
    }

    pub fn context(&self) -> &ContextHandle {
        &self.ctx
    }

    pub fn screen(&self) -> &Screen<W> {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen<W> {
        &mut self.screen
    }

    /// Swap the session this driver edits for. The buffer and parser are reset.
    pub fn set_context(&mut self, ctx: ContextHandle) {
        self.ctx = ctx;
        self.reset();
    }

    /// Forget the current line without touching the screen.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.parser.reset();
    }

    fn wrap(&self) -> Wrap {
        Wrap::new(
            self.ctx.prefix_len(),
            self.buffer.len(),
            self.buffer.cursor_offset(),
            self.ctx.geometry().width(),
        )
    }

    /// Process one keystroke byte to completion.
    pub fn handle_byte(&mut self, byte: u8, backend: &mut dyn Backend) -> Result<Step, DriverError> {
        if let Some(hook) = self.debug_hook.as_mut() {
            hook(byte);
        }

        let action = match self.parser.advance(byte) {
            Ok(action) => action,
            Err(e) => return self.on_sequence_error(e),
        };

        let step = self.apply(action, backend)?;
        self.screen.flush()?;
        Ok(step)
    }

    /// Feed a run of keystrokes; stops at the first error.
    pub fn handle_bytes(&mut self, bytes: &[u8], backend: &mut dyn Backend) -> Result<Vec<Step>, DriverError> {
        bytes
            .iter()
            .map(|&b| self.handle_byte(b, backend))
            .collect()
    }

    fn on_sequence_error(&mut self, e: SequenceError) -> Result<Step, DriverError> {
        match self.policy {
            ErrorPolicy::Strict => Err(e.into()),
            ErrorPolicy::Resilient => {
                tracing::warn!(error = %e, "discarding keystroke sequence");
                self.parser.reset();
                Ok(Step::Discarded(e))
            }
        }
    }

    fn apply(&mut self, action: Action, backend: &mut dyn Backend) -> Result<Step, DriverError> {
        match action {
            Action::None => {}
            Action::EscDispatch(byte) => {
                tracing::trace!(byte, "escape dispatch (unbound)");
            }
            Action::Print(c) => return self.insert(c),
            Action::FormFeed => {
                self.screen.clear_screen()?;
                self.redraw()?;
            }
            Action::CarriageReturn => return self.submit(backend),
            Action::Backspace => {
                let width = self.ctx.geometry().width();
                let prefix_len = self.ctx.prefix_len();
                self.screen
                    .render_backspace(&mut self.buffer, prefix_len, width)?;
            }
            Action::CursorForward => {
                if self.buffer.cursor_offset() > 0 {
                    let wrap = self.wrap();
                    self.screen.caret_forward(&wrap)?;
                    self.buffer.move_cursor_forward();
                }
            }
            Action::CursorBack => {
                if self.buffer.cursor_offset() < self.buffer.len() {
                    let wrap = self.wrap();
                    self.screen.caret_back(&wrap)?;
                    self.buffer.move_cursor_back();
                }
            }
            Action::End => {
                let wrap = self.wrap();
                self.screen.caret_to_end(&wrap)?;
                self.buffer.move_to_end();
            }
        }
        Ok(Step::Continue)
    }

    fn insert(&mut self, c: char) -> Result<Step, DriverError> {
        self.buffer.insert(c);
        let wrap = self.wrap();
        self.screen.render_insert(c, &self.buffer, &wrap)?;

        let line = self.buffer.to_string();
        let Some(name) = self.commands.check(&line, Trigger::OnKeystroke) else {
            return Ok(Step::Continue);
        };
        let name = name.to_string();
        tracing::debug!(command = %name, "keystroke command matched");

        let wrap = self.wrap();
        self.screen.clear_current_line(&wrap)?;
        self.buffer.clear();
        self.redraw()?;
        Ok(Step::Command { name, line })
    }

    fn submit(&mut self, backend: &mut dyn Backend) -> Result<Step, DriverError> {
        let mut line = self.buffer.to_string();
        line.push('\r');

        let step = match self.commands.check(&line, Trigger::OnSubmit) {
            Some(name) => {
                tracing::debug!(command = %name, "submit command matched");
                Step::Command {
                    name: name.to_string(),
                    line,
                }
            }
            None => {
                tracing::debug!(chars = self.buffer.len(), "submitting line");
                backend.submit(line.as_bytes())?;
                Step::Submitted
            }
        };

        let wrap = self.wrap();
        self.screen.caret_to_end(&wrap)?;
        // A full last row already left the caret at column 0 of a new one.
        let on_fresh_row = !self.buffer.is_empty() && wrap.total() % wrap.width == 0;
        self.buffer.clear();
        if !on_fresh_row {
            self.screen.crlf()?;
        }
        Ok(step)
    }

    /// Reprint prefix and buffer on an erased row and place the caret.
    pub fn redraw(&mut self) -> io::Result<()> {
        let prefix = self.ctx.last_line();
        let wrap = self.wrap();
        self.screen.redraw(&prefix, &self.buffer, &wrap)
    }

    /// Erase the line and draw it again with the current geometry.
    ///
    /// Call after every resize, before any further keystroke.
    pub fn clear_and_redraw(&mut self) -> io::Result<()> {
        let wrap = self.wrap();
        tracing::debug!(width = wrap.width, rows = wrap.caret_row(), "redrawing line");
        self.screen.clear_current_line(&wrap)?;
        self.redraw()?;
        self.screen.flush()
    }

    /// Write backend output straight to the terminal.
    pub fn passthrough(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.screen.write_bytes(bytes)?;
        self.screen.flush()
    }
}

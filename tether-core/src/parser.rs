//! Keystroke parser.
//!
//! A byte-at-a-time state machine modelled on the VT500 parser diagram
//! (vt100.net/emu/vt500_parser.png), reduced to the states a line editor
//! needs plus one extra state for multi-byte UTF-8 characters. Only 2-byte
//! characters decode; longer ones are collected whole and then rejected.
//!
//! The parser never touches the buffer or the screen. It turns bytes into
//! [`Action`]s and leaves the editing to the driver.

use serde::{Deserialize, Serialize};

use crate::error::SequenceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParserState {
    #[default]
    Ground,
    Escape,
    CsiEntry,
    CsiParam,
    UnicodeContinuation,
}

/// What a completed byte asks the editor to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Byte consumed; only the parser state moved.
    None,
    Print(char),
    FormFeed,
    CarriageReturn,
    Backspace,
    CursorForward,
    CursorBack,
    End,
    /// Final byte of a plain escape sequence. Nothing is bound to these yet.
    EscDispatch(u8),
}

#[derive(Debug, Default, Clone)]
pub struct Parser {
    state: ParserState,
    params: String,
    utf8: Vec<u8>,
}

fn is_c0(b: u8) -> bool {
    matches!(b, 0x00..=0x17 | 0x19 | 0x1C..=0x1F)
}

fn is_param(b: u8) -> bool {
    matches!(b, 0x30..=0x39 | 0x3B)
}

/// Encoded length announced by a UTF-8 lead byte.
fn utf8_len(lead: u8) -> usize {
    match lead {
        0xF0..=0xF4 => 4,
        0xE0..=0xEF => 3,
        _ => 2,
    }
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// CSI parameter bytes collected so far.
    pub fn params(&self) -> &str {
        &self.params
    }

    /// Bytes of the multi-byte character currently being decoded.
    pub fn pending_utf8(&self) -> &[u8] {
        &self.utf8
    }

    /// Back to `Ground` with both accumulators empty.
    pub fn reset(&mut self) {
        self.state = ParserState::Ground;
        self.params.clear();
        self.utf8.clear();
    }

    fn enter(&mut self, state: ParserState) {
        tracing::trace!(from = ?self.state, to = ?state, "parser transition");
        self.state = state;
    }

    fn enter_clear(&mut self, state: ParserState) {
        self.params.clear();
        self.utf8.clear();
        self.enter(state);
    }

    fn unsupported(&self, byte: u8) -> SequenceError {
        SequenceError::UnsupportedSequence {
            state: self.state,
            byte,
        }
    }

    /// Feed one byte.
    pub fn advance(&mut self, byte: u8) -> Result<Action, SequenceError> {
        // Inside a multi-byte character, 0x80..=0xBF are continuation bytes,
        // not C1 controls.
        let continuation =
            self.state == ParserState::UnicodeContinuation && matches!(byte, 0x80..=0xBF);

        if !continuation {
            if let Some(result) = self.anywhere(byte) {
                return result;
            }
        }

        match self.state {
            ParserState::Ground => self.ground(byte),
            ParserState::Escape => self.escape(byte),
            ParserState::CsiEntry => self.csi_entry(byte),
            ParserState::CsiParam => self.csi_param(byte),
            ParserState::UnicodeContinuation => self.unicode_continuation(byte),
        }
    }

    fn anywhere(&mut self, byte: u8) -> Option<Result<Action, SequenceError>> {
        match byte {
            // Execute
            0x18 | 0x1A | 0x80..=0x8F | 0x91..=0x97 | 0x99 | 0x9A => {
                Some(Err(self.unsupported(byte)))
            }
            // DCS, OSC, SOS/PM/APC
            0x90 | 0x9D | 0x98 | 0x9E | 0x9F => Some(Err(self.unsupported(byte))),
            0x9B => {
                self.enter_clear(ParserState::CsiEntry);
                Some(Ok(Action::None))
            }
            // ST
            0x9C => {
                self.enter_clear(ParserState::Ground);
                Some(Ok(Action::None))
            }
            0x1B => {
                self.enter_clear(ParserState::Escape);
                Some(Ok(Action::None))
            }
            _ => None,
        }
    }

    fn ground(&mut self, byte: u8) -> Result<Action, SequenceError> {
        match byte {
            0x20..=0x7E => Ok(Action::Print(byte as char)),
            0x0C => Ok(Action::FormFeed),
            0x0D => Ok(Action::CarriageReturn),
            0x7F => Ok(Action::Backspace),
            b if is_c0(b) => Err(self.unsupported(b)),
            0xC2..=0xF4 => {
                self.utf8.clear();
                self.utf8.push(byte);
                self.enter(ParserState::UnicodeContinuation);
                Ok(Action::None)
            }
            _ => Err(self.unsupported(byte)),
        }
    }

    fn escape(&mut self, byte: u8) -> Result<Action, SequenceError> {
        match byte {
            b if is_c0(b) => Err(self.unsupported(b)),
            0x7F => Ok(Action::None),
            0x5B => {
                self.enter_clear(ParserState::CsiEntry);
                Ok(Action::None)
            }
            0x30..=0x4F | 0x51..=0x57 | 0x5A | 0x5C | 0x60..=0x7E => {
                self.enter_clear(ParserState::Ground);
                Ok(Action::EscDispatch(byte))
            }
            _ => Err(self.unsupported(byte)),
        }
    }

    fn csi_entry(&mut self, byte: u8) -> Result<Action, SequenceError> {
        match byte {
            0x7F => Ok(Action::None),
            b if is_c0(b) => Err(self.unsupported(b)),
            0x40..=0x7E => self.csi_dispatch(byte),
            b if is_param(b) => {
                self.params.push(b as char);
                self.enter(ParserState::CsiParam);
                Ok(Action::None)
            }
            _ => Err(self.unsupported(byte)),
        }
    }

    fn csi_param(&mut self, byte: u8) -> Result<Action, SequenceError> {
        if is_param(byte) {
            self.params.push(byte as char);
            return Ok(Action::None);
        }
        tracing::debug!(params = %self.params, byte, "malformed CSI parameter");
        Err(SequenceError::MalformedParameter {
            byte,
            params: self.params.clone(),
        })
    }

    fn csi_dispatch(&mut self, byte: u8) -> Result<Action, SequenceError> {
        let action = match byte {
            b'C' => Ok(Action::CursorForward),
            b'D' => Ok(Action::CursorBack),
            b'F' => Ok(Action::End),
            _ => Err(self.unsupported(byte)),
        };
        self.enter_clear(ParserState::Ground);
        action
    }

    fn unicode_continuation(&mut self, byte: u8) -> Result<Action, SequenceError> {
        let Some(&lead) = self.utf8.first() else {
            // Reached only through a bad reset; treat the byte as fresh input.
            self.enter(ParserState::Ground);
            return self.ground(byte);
        };

        if !matches!(byte, 0x80..=0xBF) {
            // Truncated character: drop it, keep the byte.
            tracing::debug!(lead, byte, "incomplete UTF-8 character abandoned");
            self.enter_clear(ParserState::Ground);
            return self.ground(byte);
        }
        self.utf8.push(byte);
        if self.utf8.len() < utf8_len(lead) {
            return Ok(Action::None);
        }

        let decoded = std::str::from_utf8(&self.utf8)
            .ok()
            .and_then(|s| s.chars().next());
        let err = self.unsupported(byte);
        self.enter_clear(ParserState::Ground);

        if utf8_len(lead) > 2 {
            return Err(SequenceError::UnimplementedEncoding { lead });
        }
        decoded.map(Action::Print).ok_or(err)
    }
}

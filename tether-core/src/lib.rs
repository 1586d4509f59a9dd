//! # Tether Core
//!
//! A local line editor that sits between the user's terminal and a process
//! behind a PTY. Keystrokes are parsed and edited here; the backend only ever
//! sees complete lines.
//!
//! - `parser`: byte-at-a-time keystroke state machine
//! - `buffer`: the line being composed and its cursor
//! - `wrap`: caret arithmetic across wrapped rows
//! - `screen`: escape sequences that keep the terminal in step with the buffer
//! - `driver`: ties the above together behind `handle_byte`

pub mod buffer;
pub mod commands;
pub mod context;
pub mod driver;
pub mod error;
pub mod parser;
pub mod prompt;
pub mod pty_manager;
pub mod screen;
pub mod wrap;

pub use buffer::EditBuffer;
pub use commands::{CommandTable, Trigger};
pub use context::{ContextHandle, Geometry};
pub use driver::{Backend, Driver, ErrorPolicy, Step};
pub use error::{DriverError, SequenceError};
pub use parser::{Action, Parser, ParserState};
pub use wrap::{CaretDelta, Wrap};

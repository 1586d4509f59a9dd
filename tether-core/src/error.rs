use thiserror::Error;

use crate::parser::ParserState;

/// A keystroke sequence the line editor cannot act on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// Recognized control code or escape/CSI final byte with no handler yet.
    #[error("unsupported sequence in {state:?}: 0x{byte:02X}")]
    UnsupportedSequence { state: ParserState, byte: u8 },

    /// Unexpected byte while collecting CSI parameters.
    #[error("malformed CSI parameter 0x{byte:02X} after {params:?}")]
    MalformedParameter { byte: u8, params: String },

    /// A complete 3- or 4-byte character; only 2-byte characters decode.
    #[error("unimplemented encoding: lead byte 0x{lead:02X}")]
    UnimplementedEncoding { lead: u8 },
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error("terminal or backend write failed: {0}")]
    Io(#[from] std::io::Error),
}

impl DriverError {
    /// The sequence error behind this failure, if it was not an I/O error.
    pub fn sequence(&self) -> Option<&SequenceError> {
        match self {
            DriverError::Sequence(e) => Some(e),
            DriverError::Io(_) => None,
        }
    }
}

//! Prefix-key chords for session control.
//!
//! `prefix c` opens a session, `prefix TAB` cycles to the next one and
//! `prefix prefix` sends the prefix byte itself. Everything else goes to
//! the line editor.

/// What a chord asks the application to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chord {
    CreateSession,
    CycleSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Feed to the line editor.
    Editor(u8),
    /// Prefix seen; waiting for the chord key.
    Pending,
    Chord(Chord),
    /// Send straight to the active PTY.
    Raw(u8),
    /// Unknown chord key, dropped.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct ChordInterceptor {
    prefix: u8,
    armed: bool,
}

impl ChordInterceptor {
    pub fn new(prefix: u8) -> Self {
        Self { prefix, armed: false }
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn route(&mut self, byte: u8) -> Route {
        if !self.armed {
            if byte == self.prefix {
                self.armed = true;
                return Route::Pending;
            }
            return Route::Editor(byte);
        }

        self.armed = false;
        match byte {
            b'c' => Route::Chord(Chord::CreateSession),
            b'\t' => Route::Chord(Chord::CycleSession),
            b if b == self.prefix => Route::Raw(self.prefix),
            other => {
                tracing::debug!(byte = other, "Unbound chord key");
                Route::Ignored
            }
        }
    }
}

/// Tracks the text on the terminal's current row from the backend's output.
///
/// The editor needs this to know where the caret starts (usually right after
/// the shell prompt). Escape sequences are skipped rather than interpreted:
/// - CSI: `ESC [` ... final byte `0x40..=0x7E`
/// - OSC: `ESC ]` ... BEL or ST (window titles, OSC 7, OSC 133)
/// - other escapes: `ESC` + one byte
///
/// Chunk-safe: a sequence split across two reads is still skipped.
#[derive(Debug, Default, Clone)]
pub struct PromptTracker {
    line: Vec<u8>,
    state: ScanState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ScanState {
    #[default]
    Ground,
    Esc,
    Csi,
    Osc,
    OscEsc,
}

impl PromptTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text since the last line break.
    pub fn line(&self) -> String {
        String::from_utf8_lossy(&self.line).into_owned()
    }

    pub fn clear(&mut self) {
        self.line.clear();
        self.state = ScanState::Ground;
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        for &b in bytes {
            match self.state {
                ScanState::Ground => match b {
                    0x1b => self.state = ScanState::Esc,
                    b'\r' | b'\n' => self.line.clear(),
                    0x08 => self.pop_char(),
                    0x00..=0x1f | 0x7f => {}
                    _ => self.line.push(b),
                },
                ScanState::Esc => {
                    self.state = match b {
                        b'[' => ScanState::Csi,
                        b']' => ScanState::Osc,
                        _ => ScanState::Ground,
                    };
                }
                ScanState::Csi => {
                    if (0x40..=0x7e).contains(&b) {
                        self.state = ScanState::Ground;
                    }
                }
                ScanState::Osc => match b {
                    0x07 => self.state = ScanState::Ground,
                    0x1b => self.state = ScanState::OscEsc,
                    _ => {}
                },
                ScanState::OscEsc => {
                    // ST is ESC \ ; anything else stays inside the string
                    self.state = if b == b'\\' {
                        ScanState::Ground
                    } else {
                        ScanState::Osc
                    };
                }
            }
        }
    }

    fn pop_char(&mut self) {
        while let Some(b) = self.line.pop() {
            if !(0x80..=0xbf).contains(&b) {
                break;
            }
        }
    }
}

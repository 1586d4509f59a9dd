use anyhow::{Context, Result};
use portable_pty::{Child, CommandBuilder, NativePtySystem, PtyPair, PtySize, PtySystem};
use std::io::{self, Read, Write};
use tokio::sync::mpsc;

use crate::context::Geometry;
use crate::driver::Backend;

/// A child process behind a pseudo-terminal.
pub struct PtyManager {
    pair: PtyPair,
    writer: Box<dyn Write + Send>,
    child: Box<dyn Child + Send + Sync>,
}

impl std::fmt::Debug for PtyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyManager")
            .field("pair", &"PtyPair")
            .field("writer", &"Box<dyn Write + Send>")
            .field("child", &"Box<dyn Child + Send + Sync>")
            .finish()
    }
}

fn pty_size(geometry: Geometry) -> PtySize {
    PtySize {
        rows: geometry.rows,
        cols: geometry.columns,
        pixel_width: 0,
        pixel_height: 0,
    }
}

impl PtyManager {
    /// Spawn `program` (the user's shell when `None`) in a new PTY.
    pub fn spawn(program: Option<&str>, geometry: Geometry) -> Result<Self> {
        let pty_system = NativePtySystem::default();
        let pair = pty_system
            .openpty(pty_size(geometry))
            .context("Failed to open PTY")?;

        let cmd = match program {
            Some(p) => CommandBuilder::new(p),
            None => default_shell_command(),
        };
        let child = pair
            .slave
            .spawn_command(cmd)
            .context("Failed to spawn shell process")?;

        let writer = pair
            .master
            .take_writer()
            .context("Failed to take PTY writer")?;

        tracing::info!(?program, cols = geometry.columns, rows = geometry.rows, "PTY spawned");
        Ok(Self { pair, writer, child })
    }

    pub fn resize(&mut self, geometry: Geometry) -> Result<()> {
        self.pair
            .master
            .resize(pty_size(geometry))
            .context("Failed to resize PTY")
    }

    /// Raw write (no newline).
    pub fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.writer
            .write_all(data)
            .context("Failed to write to PTY")?;
        self.writer.flush().context("Failed to flush PTY writer")
    }

    pub fn child_is_alive(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(_)) => false,
            Err(_) => true,
        }
    }

    pub fn kill(&mut self) -> Result<()> {
        self.child.kill().context("Failed to kill PTY child")
    }

    /// Pump PTY output into a channel from a dedicated reader thread.
    /// The channel closes when the child's side of the PTY does.
    pub fn start_reader(&mut self) -> Result<mpsc::Receiver<Vec<u8>>> {
        let mut reader = self
            .pair
            .master
            .try_clone_reader()
            .context("Failed to clone PTY reader")?;

        let (tx, rx) = mpsc::channel(256);

        std::thread::spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.blocking_send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "PTY reader stopped");
                        break;
                    }
                }
            }
        });

        Ok(rx)
    }
}

impl Backend for PtyManager {
    fn submit(&mut self, line: &[u8]) -> io::Result<()> {
        self.writer.write_all(line)?;
        self.writer.flush()
    }
}

fn default_shell_command() -> CommandBuilder {
    let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/bash".to_string());
    CommandBuilder::new(shell)
}

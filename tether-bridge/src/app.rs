//! The terminal front end: raw stdin in, line editor, shells behind PTYs.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::io::{self, Read};
use tether_core::{Driver, Geometry, Step};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::Config;
use crate::keyboard::{ChordInterceptor, Chord, Route};
use crate::session::{SessionEvent, SessionManager};

/// Raw mode for as long as this lives.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        crossterm::terminal::enable_raw_mode().context("Failed to enter raw mode")?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::terminal::disable_raw_mode();
    }
}

pub fn terminal_geometry() -> Geometry {
    crossterm::terminal::size()
        .map(|(columns, rows)| Geometry::new(columns, rows))
        .unwrap_or_default()
}

/// Keystrokes from a blocking stdin thread. Closes on EOF.
fn spawn_stdin_reader() -> mpsc::Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel(64);
    std::thread::spawn(move || {
        let mut stdin = io::stdin();
        let mut buf = [0u8; 1024];
        loop {
            match stdin.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.blocking_send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!(error = %e, "stdin read failed");
                    break;
                }
            }
        }
    });
    rx
}

/// Sends the new geometry whenever the terminal is resized.
fn spawn_resize_watcher(initial: Geometry) -> mpsc::Receiver<Geometry> {
    let (tx, rx) = mpsc::channel(8);
    tokio::spawn(async move {
        let mut current = initial;

        #[cfg(unix)]
        let mut winch = match tokio::signal::unix::signal(
            tokio::signal::unix::SignalKind::window_change(),
        ) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "No SIGWINCH; resizes will be missed");
                return;
            }
        };
        #[cfg(not(unix))]
        let mut tick = tokio::time::interval(std::time::Duration::from_millis(250));

        loop {
            #[cfg(unix)]
            if winch.recv().await.is_none() {
                return;
            }
            #[cfg(not(unix))]
            tick.tick().await;

            let geometry = terminal_geometry();
            if geometry != current {
                current = geometry;
                if tx.send(geometry).await.is_err() {
                    return;
                }
            }
        }
    });
    rx
}

pub struct App {
    driver: Driver<io::Stdout>,
    sessions: SessionManager,
    chords: ChordInterceptor,
    expansions: HashMap<String, String>,
}

impl App {
    /// Spawn the first session and build the editor around it.
    pub fn new(config: &Config, geometry: Geometry) -> Result<(Self, mpsc::Receiver<SessionEvent>)> {
        let (mut sessions, events) = SessionManager::new(config.resolve_shell());
        sessions.create(geometry)?;
        let ctx = sessions
            .active()
            .map(|s| s.ctx.clone())
            .context("No session after create")?;

        let mut driver = Driver::new(io::stdout(), ctx)
            .with_policy(config.error_policy)
            .with_commands(config.command_table()?);

        if config.debug_echo {
            driver.set_debug_hook(Some(Box::new(|byte| {
                tracing::debug!(byte = %format_args!("{:#04x}", byte), "key");
            })));
        }

        let app = Self {
            driver,
            sessions,
            chords: ChordInterceptor::new(config.prefix_key),
            expansions: config.alias_expansions(),
        };
        Ok((app, events))
    }

    /// Returns `false` once the last session is gone.
    fn on_keys(&mut self, keys: &[u8]) -> Result<bool> {
        for &byte in keys {
            match self.chords.route(byte) {
                Route::Editor(b) => self.edit(b)?,
                Route::Pending | Route::Ignored => {}
                Route::Raw(b) => {
                    if let Some(session) = self.sessions.active_mut() {
                        session.pty.write_raw(&[b])?;
                    }
                }
                Route::Chord(Chord::CreateSession) => {
                    let geometry = self.driver.context().geometry();
                    self.sessions.create(geometry)?;
                    self.show_active()?;
                }
                Route::Chord(Chord::CycleSession) => {
                    if self.sessions.cycle() {
                        self.show_active()?;
                    }
                }
            }
        }
        Ok(!self.sessions.is_empty())
    }

    fn edit(&mut self, byte: u8) -> Result<()> {
        let Some(session) = self.sessions.active_mut() else {
            return Ok(());
        };

        match self.driver.handle_byte(byte, &mut session.pty)? {
            Step::Continue => {}
            Step::Submitted => session.line_submitted(),
            Step::Command { name, line } => {
                session.line_submitted();
                match self.expansions.get(&name) {
                    Some(expansion) => {
                        tracing::info!(%name, %line, "Alias expanded");
                        session.pty.write_raw(format!("{}\r", expansion).as_bytes())?;
                    }
                    None => tracing::debug!(%name, %line, "Command without handler"),
                }
            }
            Step::Discarded(e) => tracing::debug!(error = %e, "Keystroke sequence dropped"),
        }
        Ok(())
    }

    /// Put the active session on screen.
    fn show_active(&mut self) -> Result<()> {
        let Some(session) = self.sessions.active_mut() else {
            return Ok(());
        };
        let pending = session.take_pending();
        self.driver.set_context(session.ctx.clone());
        self.driver.screen_mut().clear_screen()?;
        if pending.is_empty() {
            self.driver.redraw()?;
            self.driver.screen_mut().flush()?;
        } else {
            self.driver.passthrough(&pending)?;
        }
        Ok(())
    }

    /// Returns `false` once the last session is gone.
    fn on_session_event(&mut self, event: SessionEvent) -> Result<bool> {
        match event {
            SessionEvent::Output(id, bytes) => self.on_output(id, &bytes)?,
            SessionEvent::Closed(id) => {
                let was_active = self.sessions.remove(id);
                if self.sessions.is_empty() {
                    return Ok(false);
                }
                if was_active {
                    self.show_active()?;
                }
            }
        }
        Ok(true)
    }

    fn on_output(&mut self, id: Uuid, bytes: &[u8]) -> Result<()> {
        if self.sessions.is_active(id) {
            self.driver.passthrough(bytes)?;
            if let Some(session) = self.sessions.active_mut() {
                session.observe(bytes);
            }
        } else if let Some(session) = self.sessions.get_mut(id) {
            session.hold(bytes);
        }
        Ok(())
    }

    fn on_resize(&mut self, geometry: Geometry) -> Result<()> {
        tracing::debug!(cols = geometry.columns, rows = geometry.rows, "Terminal resized");
        self.sessions.resize_all(geometry);
        self.driver.clear_and_redraw()?;
        Ok(())
    }

    pub async fn run(mut self, mut events: mpsc::Receiver<SessionEvent>) -> Result<()> {
        let mut keys = spawn_stdin_reader();
        let mut resizes = spawn_resize_watcher(self.driver.context().geometry());

        let outcome = loop {
            let step = tokio::select! {
                Some(chunk) = keys.recv() => self.on_keys(&chunk),
                Some(event) = events.recv() => self.on_session_event(event),
                Some(geometry) = resizes.recv() => self.on_resize(geometry).map(|_| true),
                else => Ok(false),
            };
            match step {
                Ok(true) => {}
                Ok(false) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        self.sessions.kill_all();
        outcome
    }
}

/// Take over the terminal and run until the last shell exits.
pub async fn run(config: Config) -> Result<()> {
    let geometry = terminal_geometry();
    let _raw = RawModeGuard::enable()?;
    let (app, events) = App::new(&config, geometry)?;
    app.run(events).await
}

//! Shell sessions, each with its own PTY and context.

use anyhow::Result;
use tether_core::pty_manager::PtyManager;
use tether_core::prompt::PromptTracker;
use tether_core::{ContextHandle, Geometry};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Output held for a session that is not on screen.
const PENDING_LIMIT: usize = 64 * 1024;

#[derive(Debug)]
pub enum SessionEvent {
    Output(Uuid, Vec<u8>),
    Closed(Uuid),
}

#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub pty: PtyManager,
    pub ctx: ContextHandle,
    pub prompt: PromptTracker,
    pending: Vec<u8>,
}

impl Session {
    /// Track shell output as the current prompt line.
    pub fn observe(&mut self, bytes: &[u8]) {
        self.prompt.feed(bytes);
        self.ctx.set_last_line(self.prompt.line());
    }

    /// The line was handed to the shell; the next prompt starts fresh.
    pub fn line_submitted(&mut self) {
        self.prompt.clear();
        self.ctx.set_last_line("");
    }

    pub fn hold(&mut self, bytes: &[u8]) {
        self.observe(bytes);
        self.pending.extend_from_slice(bytes);
        if self.pending.len() > PENDING_LIMIT {
            let excess = self.pending.len() - PENDING_LIMIT;
            self.pending.drain(..excess);
        }
    }

    pub fn take_pending(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.pending)
    }
}

/// Owns every session and merges their output into one channel.
#[derive(Debug)]
pub struct SessionManager {
    sessions: Vec<Session>,
    active: usize,
    program: Option<String>,
    events: mpsc::Sender<SessionEvent>,
}

impl SessionManager {
    pub fn new(program: Option<String>) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (events, rx) = mpsc::channel(256);
        let manager = Self {
            sessions: Vec::new(),
            active: 0,
            program,
            events,
        };
        (manager, rx)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Spawn a session and make it active. Must run inside a tokio runtime.
    pub fn create(&mut self, geometry: Geometry) -> Result<Uuid> {
        let mut pty = PtyManager::spawn(self.program.as_deref(), geometry)?;
        let mut output = pty.start_reader()?;
        let id = Uuid::new_v4();

        let events = self.events.clone();
        tokio::spawn(async move {
            while let Some(chunk) = output.recv().await {
                if events.send(SessionEvent::Output(id, chunk)).await.is_err() {
                    return;
                }
            }
            let _ = events.send(SessionEvent::Closed(id)).await;
        });

        self.sessions.push(Session {
            id,
            pty,
            ctx: ContextHandle::new(geometry),
            prompt: PromptTracker::new(),
            pending: Vec::new(),
        });
        self.active = self.sessions.len() - 1;
        tracing::info!(%id, count = self.sessions.len(), "Session created");
        Ok(id)
    }

    /// Advance to the next session. Returns `false` when there is nowhere
    /// else to go.
    pub fn cycle(&mut self) -> bool {
        if self.sessions.len() < 2 {
            return false;
        }
        self.active = (self.active + 1) % self.sessions.len();
        tracing::debug!(id = %self.sessions[self.active].id, "Session cycled");
        true
    }

    pub fn active(&self) -> Option<&Session> {
        self.sessions.get(self.active)
    }

    pub fn active_mut(&mut self) -> Option<&mut Session> {
        self.sessions.get_mut(self.active)
    }

    pub fn is_active(&self, id: Uuid) -> bool {
        self.active().is_some_and(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    /// Drop a session whose shell has exited. Returns `true` if it was the
    /// active one.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let Some(index) = self.sessions.iter().position(|s| s.id == id) else {
            return false;
        };
        let was_active = index == self.active;
        self.sessions.remove(index);
        if index < self.active || self.active >= self.sessions.len() {
            self.active = self.active.saturating_sub(1);
        }
        tracing::info!(%id, remaining = self.sessions.len(), "Session closed");
        was_active
    }

    pub fn resize_all(&mut self, geometry: Geometry) {
        for session in &mut self.sessions {
            session.ctx.set_geometry(geometry);
            if let Err(e) = session.pty.resize(geometry) {
                tracing::warn!(id = %session.id, error = %e, "PTY resize failed");
            }
        }
    }

    pub fn kill_all(&mut self) {
        for session in &mut self.sessions {
            if session.pty.child_is_alive() {
                if let Err(e) = session.pty.kill() {
                    tracing::warn!(id = %session.id, error = %e, "Failed to kill shell");
                }
            }
        }
    }
}

use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

/// Terminal dimensions. `columns` doubles as the wrap width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    pub columns: u16,
    pub rows: u16,
}

impl Geometry {
    pub fn new(columns: u16, rows: u16) -> Self {
        Self {
            columns: columns.max(1),
            rows: rows.max(1),
        }
    }

    pub fn width(&self) -> usize {
        usize::from(self.columns.max(1))
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

/// What the session owns and the editor only reads.
#[derive(Debug, Default)]
struct SessionContext {
    geometry: Geometry,
    /// Text already on the caret's row before editing began (usually the prompt).
    last_line: String,
}

/// Shared handle to a session's geometry and displayed prefix.
///
/// The bridge updates it on resize and on backend output; the driver reads it
/// on every byte and keeps no copy of its own.
#[derive(Debug, Clone, Default)]
pub struct ContextHandle(Arc<RwLock<SessionContext>>);

impl ContextHandle {
    pub fn new(geometry: Geometry) -> Self {
        Self(Arc::new(RwLock::new(SessionContext {
            geometry,
            last_line: String::new(),
        })))
    }

    pub fn geometry(&self) -> Geometry {
        self.0.read().unwrap_or_else(PoisonError::into_inner).geometry
    }

    /// Character count of the displayed prefix.
    pub fn prefix_len(&self) -> usize {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last_line
            .chars()
            .count()
    }

    pub fn last_line(&self) -> String {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last_line
            .clone()
    }

    /// Returns true if the geometry actually changed.
    pub fn set_geometry(&self, geometry: Geometry) -> bool {
        let mut ctx = self.0.write().unwrap_or_else(PoisonError::into_inner);
        if ctx.geometry == geometry {
            return false;
        }
        ctx.geometry = geometry;
        true
    }

    pub fn set_last_line(&self, line: impl Into<String>) {
        self.0.write().unwrap_or_else(PoisonError::into_inner).last_line = line.into();
    }
}

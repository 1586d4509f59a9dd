//! Command interception.
//!
//! Patterns are tested against the edit buffer before input is forwarded to
//! the backend. They are compiled once, when the table is built; matching is
//! first-registered-wins.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// When a pattern is tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    /// At carriage return, against the line plus its trailing `\r`.
    OnSubmit,
    /// After every inserted character, against the line so far.
    OnKeystroke,
}

#[derive(Debug, Clone)]
struct Entry {
    pattern: Regex,
    name: String,
    trigger: Trigger,
}

#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    entries: Vec<Entry>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, pattern: &str, name: impl Into<String>, trigger: Trigger) -> Result<()> {
        let name = name.into();
        let pattern = Regex::new(pattern)
            .with_context(|| format!("Invalid pattern for command '{}': {}", name, pattern))?;
        self.entries.push(Entry {
            pattern,
            name,
            trigger,
        });
        Ok(())
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, pattern: &str, name: impl Into<String>, trigger: Trigger) -> Result<Self> {
        self.register(pattern, name, trigger)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name of the first command whose pattern matches `input`.
    pub fn check(&self, input: &str, trigger: Trigger) -> Option<&str> {
        self.entries
            .iter()
            .filter(|e| e.trigger == trigger)
            .find(|e| e.pattern.is_match(input))
            .map(|e| e.name.as_str())
    }
}

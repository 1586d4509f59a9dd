//! User configuration.
//!
//! Read from `--config`, then `$TETHER_CONFIG`, then `config.json` in the
//! platform config directory. Every field is optional; a missing file means
//! defaults.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tether_core::{CommandTable, ErrorPolicy, Trigger};

pub const CONFIG_ENV: &str = "TETHER_CONFIG";

/// Ctrl-A
pub const DEFAULT_PREFIX_KEY: u8 = 0x01;

/// Command-table name prefix for alias entries.
const ALIAS_PREFIX: &str = "alias:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Program to run in each session. Defaults to `$SHELL`.
    pub shell: Option<String>,
    pub error_policy: ErrorPolicy,
    /// Log every keystroke byte at debug level.
    pub debug_echo: bool,
    /// Byte that starts a session chord.
    pub prefix_key: u8,
    /// Whole-line replacements applied on Enter.
    pub aliases: BTreeMap<String, String>,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shell: None,
            error_policy: ErrorPolicy::Resilient,
            debug_echo: false,
            prefix_key: DEFAULT_PREFIX_KEY,
            aliases: BTreeMap::new(),
            log_file: None,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "tether")
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|d| d.config_dir().join("config.json"))
    }

    /// Resolve and load the config file. Only an explicitly named file is
    /// required to exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(text)?;
        Ok(config)
    }

    pub fn log_path(&self) -> PathBuf {
        if let Some(path) = &self.log_file {
            return path.clone();
        }
        project_dirs()
            .map(|d| d.data_local_dir().join("tether.log"))
            .unwrap_or_else(|| std::env::temp_dir().join("tether.log"))
    }

    /// The program to spawn: configured shell, `$SHELL`, or `bash` on `PATH`.
    pub fn resolve_shell(&self) -> Option<String> {
        if let Some(shell) = &self.shell {
            return Some(shell.clone());
        }
        if let Ok(shell) = std::env::var("SHELL") {
            return Some(shell);
        }
        which::which("bash")
            .ok()
            .map(|p| p.to_string_lossy().into_owned())
    }

    /// One `OnSubmit` entry per alias, matching the exact line.
    pub fn command_table(&self) -> Result<CommandTable> {
        let mut table = CommandTable::new();
        for alias in self.aliases.keys() {
            let pattern = format!(r"^{}\r$", regex::escape(alias));
            table.register(&pattern, alias_command_name(alias), Trigger::OnSubmit)?;
        }
        Ok(table)
    }

    /// Command name → line to send instead.
    pub fn alias_expansions(&self) -> HashMap<String, String> {
        self.aliases
            .iter()
            .map(|(alias, expansion)| (alias_command_name(alias), expansion.clone()))
            .collect()
    }
}

pub fn alias_command_name(alias: &str) -> String {
    format!("{}{}", ALIAS_PREFIX, alias)
}

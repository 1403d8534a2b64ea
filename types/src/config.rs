//! Agent configuration.
//!
//! Stored as TOML by the core config layer. Every field has a default so a
//! missing or partial file still loads.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which change-signal strategy watches the local install store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSignalKind {
    /// Registry wait handle on Windows, stat polling elsewhere.
    #[default]
    Auto,
    /// Compare file size and mtime on every tick.
    Poll,
    /// Filesystem notifications on the registry file.
    Watch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Milliseconds between local-state ticks.
    pub tick_interval_ms: u64,
    /// Overrides the platform default `registry.vdf` location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_path: Option<PathBuf>,
    pub change_signal: ChangeSignalKind,
    /// Directory for rolling log files. Logs go to stderr when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_directory: Option<String>,
    /// Offline library mirror used as the backend source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library_directory: Option<PathBuf>,
}

pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            registry_path: None,
            change_signal: ChangeSignalKind::Auto,
            log_directory: None,
            library_directory: None,
        }
    }
}

//! Picks the local-state reader and change signal for this OS.
//!
//! Decided once at startup; nothing downstream branches on platform.

use gamesync_types::{AgentConfig, ChangeSignalKind};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::local::{LocalStateReader, VdfRegistryReader, default_registry_path};
use crate::signal::{ChangeSignal, StatChangeSignal, WatchChangeSignal};

/// Configured `registry.vdf` path, else the platform default.
pub fn resolve_registry_path(config: &AgentConfig) -> PathBuf {
    if let Some(path) = &config.registry_path {
        return path.clone();
    }
    default_registry_path().unwrap_or_else(|| {
        warn!("No home directory, looking for registry.vdf in the working directory");
        PathBuf::from("registry.vdf")
    })
}

#[cfg(target_os = "windows")]
pub fn local_state_reader(config: &AgentConfig) -> Arc<dyn LocalStateReader> {
    match &config.registry_path {
        Some(path) => Arc::new(VdfRegistryReader::new(path)),
        None => Arc::new(crate::local::WindowsRegistryReader),
    }
}

#[cfg(not(target_os = "windows"))]
pub fn local_state_reader(config: &AgentConfig) -> Arc<dyn LocalStateReader> {
    Arc::new(VdfRegistryReader::new(resolve_registry_path(config)))
}

pub fn change_signal(config: &AgentConfig) -> Box<dyn ChangeSignal> {
    let path = resolve_registry_path(config);
    match config.change_signal {
        ChangeSignalKind::Auto => auto_signal(config, path),
        ChangeSignalKind::Poll => {
            info!(path = %path.display(), "Polling registry file for changes");
            Box::new(StatChangeSignal::new(path))
        }
        ChangeSignalKind::Watch => {
            info!(path = %path.display(), "Watching registry file for changes");
            Box::new(WatchChangeSignal::new(path))
        }
    }
}

#[cfg(target_os = "windows")]
fn auto_signal(config: &AgentConfig, path: PathBuf) -> Box<dyn ChangeSignal> {
    if config.registry_path.is_none() {
        match crate::signal::RegistryChangeSignal::steam_apps() {
            Ok(signal) => {
                info!("Waiting on registry notifications for changes");
                return Box::new(signal);
            }
            Err(e) => warn!(error = %e, "Registry notifications unavailable, polling instead"),
        }
    }
    Box::new(StatChangeSignal::new(path))
}

#[cfg(not(target_os = "windows"))]
fn auto_signal(_config: &AgentConfig, path: PathBuf) -> Box<dyn ChangeSignal> {
    info!(path = %path.display(), "Polling registry file for changes");
    Box::new(StatChangeSignal::new(path))
}

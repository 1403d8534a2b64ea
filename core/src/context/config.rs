//! Loading and saving [`AgentConfig`] through confy.

use gamesync_types::AgentConfig;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

pub const APP_NAME: &str = "gamesync";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(#[source] confy::ConfyError),

    #[error("failed to save config: {0}")]
    Save(#[source] confy::ConfyError),
}

pub trait AgentConfigExt: Sized {
    /// Load from the per-user config location, falling back to defaults.
    fn load() -> Self;

    fn load_from(path: &Path) -> Result<Self, ConfigError>;

    /// Persist to the per-user config location. Errors are logged.
    fn save(&self);

    fn save_to(&self, path: &Path) -> Result<(), ConfigError>;
}

impl AgentConfigExt for AgentConfig {
    fn load() -> Self {
        match confy::load(APP_NAME, None) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                AgentConfig::default()
            }
        }
    }

    fn load_from(path: &Path) -> Result<Self, ConfigError> {
        confy::load_path(path).map_err(ConfigError::Load)
    }

    fn save(&self) {
        match confy::store(APP_NAME, None, self) {
            Ok(()) => info!("Config saved"),
            Err(e) => warn!(error = %e, "Failed to save config"),
        }
    }

    fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        confy::store_path(path, self).map_err(ConfigError::Save)
    }
}

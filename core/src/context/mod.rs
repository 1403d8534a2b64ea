mod config;
mod platform;

pub use config::{APP_NAME, AgentConfigExt, ConfigError};
pub use platform::{change_signal, local_state_reader, resolve_registry_path};

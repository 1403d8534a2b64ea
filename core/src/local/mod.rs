//! Locally installed game state
//!
//! - **Snapshot**: immutable id → state mapping read from the install store
//! - **Diff**: minimal transitions between two snapshots
//! - **Readers**: platform sources for snapshots (`registry.vdf` file, or
//!   the Windows registry)

mod diff;
mod registry;
pub mod snapshot;
#[cfg(target_os = "windows")]
pub(crate) mod windows;

pub use diff::state_changes;
pub use registry::{APPS_KEY_PATH, VdfRegistryReader, default_registry_path, snapshot_from_apps};
pub use snapshot::Snapshot;
#[cfg(target_os = "windows")]
pub use windows::WindowsRegistryReader;

use crate::error::LocalStateError;

/// Reads the current install store into a fresh snapshot.
///
/// May be slow; callers keep it off the tick path.
pub trait LocalStateReader: Send + Sync {
    fn read_snapshot(&self) -> Result<Snapshot, LocalStateError>;
}

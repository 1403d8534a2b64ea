use gamesync_types::{GameId, LocalGame, LocalGameState};
use keyvalues_parser::{Obj, Value, Vdf};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{LocalStateReader, Snapshot};
use crate::error::LocalStateError;

/// Where per-app state lives, both in the Windows registry (under HKCU) and
/// in the `registry.vdf` mirror other platforms keep.
pub const APPS_KEY_PATH: [&str; 6] = ["Registry", "HKCU", "Software", "Valve", "Steam", "Apps"];

/// Build a snapshot from app id → (value name, value) pairs.
///
/// `Installed` and `Running` set their flag when the value is `1`; names
/// compare case-insensitively. Apps with neither flag stay in the snapshot
/// as `NONE`.
pub fn snapshot_from_apps<I, V, K, S>(apps: I) -> Snapshot
where
    I: IntoIterator<Item = (String, V)>,
    V: IntoIterator<Item = (K, S)>,
    K: AsRef<str>,
    S: AsRef<str>,
{
    let snapshot: Snapshot = apps
        .into_iter()
        .map(|(app_id, values)| {
            let mut state = LocalGameState::NONE;
            for (name, value) in values {
                let name = name.as_ref();
                if value.as_ref() != "1" {
                    continue;
                }
                if name.eq_ignore_ascii_case("running") {
                    state |= LocalGameState::RUNNING;
                }
                if name.eq_ignore_ascii_case("installed") {
                    state |= LocalGameState::INSTALLED;
                }
            }
            LocalGame::new(GameId::from(app_id), state)
        })
        .collect();
    debug!(games = snapshot.len(), "Local game list refreshed");
    snapshot
}

/// Default `registry.vdf` location for this platform.
pub fn default_registry_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    if cfg!(target_os = "macos") {
        Some(home.join("Library/Application Support/Steam/registry.vdf"))
    } else {
        Some(home.join(".steam/registry.vdf"))
    }
}

/// Reads app state out of a `registry.vdf` file.
#[derive(Debug, Clone)]
pub struct VdfRegistryReader {
    path: PathBuf,
}

impl VdfRegistryReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocalStateReader for VdfRegistryReader {
    /// A missing file means no apps, the same as an empty store.
    fn read_snapshot(&self) -> Result<Snapshot, LocalStateError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "Registry file not found, no local games");
                return Ok(Snapshot::new());
            }
            Err(e) => {
                return Err(LocalStateError::Io {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };
        let root = Vdf::parse(&text).map_err(|e| LocalStateError::Parse {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        let apps = apps_blocks(&root);
        if apps.is_empty() {
            debug!(path = %self.path.display(), "No apps block in registry file");
        }

        let entries = apps.into_iter().flat_map(|block| {
            block.iter().map(|(app_id, values)| {
                let pairs: Vec<(&str, &str)> = values
                    .iter()
                    .filter_map(as_obj)
                    .flat_map(|app| app.iter())
                    .flat_map(|(name, values)| {
                        values.iter().filter_map(move |value| match value {
                            Value::Str(text) => Some((&**name, &**text)),
                            Value::Obj(_) => None,
                        })
                    })
                    .collect();
                (app_id.to_string(), pairs)
            })
        });
        Ok(snapshot_from_apps(entries))
    }
}

/// Every block at [`APPS_KEY_PATH`]. Keys match case-insensitively and
/// repeated blocks are all kept, so their apps merge.
fn apps_blocks<'a, 't>(root: &'a Vdf<'t>) -> Vec<&'a Obj<'t>> {
    let Some((first, rest)) = APPS_KEY_PATH.split_first() else {
        return Vec::new();
    };
    if !root.key.eq_ignore_ascii_case(first) {
        return Vec::new();
    }
    let mut blocks: Vec<&Obj> = as_obj(&root.value).into_iter().collect();
    for key in rest {
        blocks = blocks
            .into_iter()
            .flat_map(|block| {
                block
                    .iter()
                    .filter(move |(name, _)| name.eq_ignore_ascii_case(key))
                    .flat_map(|(_, values)| values.iter().filter_map(as_obj))
            })
            .collect();
    }
    blocks
}

fn as_obj<'a, 't>(value: &'a Value<'t>) -> Option<&'a Obj<'t>> {
    match value {
        Value::Obj(obj) => Some(obj),
        Value::Str(_) => None,
    }
}

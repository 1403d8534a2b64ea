//! Error taxonomy shared by the import and local-state paths.

use gamesync_types::GameId;
use std::path::PathBuf;
use thiserror::Error;

/// Failure reported for an import, per game id or for a whole batch.
///
/// Clonable because one failed batch call is reported against every id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Network or auth failure from the library backend.
    #[error("library backend unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The backend answered with something we could not interpret.
    #[error("malformed backend response: {0}")]
    MalformedUpstreamData(String),

    /// Called before the user's identity was resolved.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The backend has no play time for this game.
    #[error("no play time recorded for game {0}")]
    UnknownGame(GameId),
}

/// Failure reading the local install store.
#[derive(Debug, Error)]
pub enum LocalStateError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("registry error: {0}")]
    Registry(String),
}

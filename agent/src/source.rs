//! Library backend served from an offline mirror directory.
//!
//! ```text
//! <library_directory>/
//! ├── profile.json              UserProfile of the signed-in user
//! ├── games.json                [OwnedGameRecord]
//! ├── friends.json              [FriendInfo]
//! └── achievements/<id>.json    [Achievement]
//! ```
//!
//! `profile.json` stands in for the backend session: without it, or when it
//! names a different user, every call answers `NotAuthenticated`.

use async_trait::async_trait;
use gamesync_core::{LibrarySource, SyncError};
use gamesync_types::{Achievement, FriendInfo, GameId, OwnedGameRecord, UserId, UserProfile};
use serde::de::DeserializeOwned;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const PROFILE_FILE: &str = "profile.json";
const GAMES_FILE: &str = "games.json";
const FRIENDS_FILE: &str = "friends.json";
const ACHIEVEMENTS_DIR: &str = "achievements";

pub struct JsonDirSource {
    root: PathBuf,
}

impl JsonDirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn read<T>(&self, relative: impl AsRef<Path>) -> Result<T, SyncError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let path = self.root.join(relative);
        tokio::task::spawn_blocking(move || read_json(&path))
            .await
            .map_err(|e| SyncError::UpstreamUnavailable(e.to_string()))?
    }

    /// The session is valid while `profile.json` still names `user_id`.
    async fn ensure_session(&self, user_id: &UserId) -> Result<(), SyncError> {
        let profile: UserProfile = self.read(PROFILE_FILE).await?;
        if &profile.user_id != user_id {
            return Err(SyncError::NotAuthenticated);
        }
        Ok(())
    }
}

#[async_trait]
impl LibrarySource for JsonDirSource {
    async fn profile(&self) -> Result<UserProfile, SyncError> {
        self.read(PROFILE_FILE).await
    }

    async fn owned_games(&self, user_id: &UserId) -> Result<Vec<OwnedGameRecord>, SyncError> {
        self.ensure_session(user_id).await?;
        self.read(GAMES_FILE).await
    }

    async fn achievements(
        &self,
        user_id: &UserId,
        game_id: &GameId,
    ) -> Result<Vec<Achievement>, SyncError> {
        if !is_plain_id(game_id.as_str()) {
            return Err(SyncError::MalformedUpstreamData(format!(
                "invalid game id {game_id:?}"
            )));
        }
        self.ensure_session(user_id).await?;
        let file = Path::new(ACHIEVEMENTS_DIR).join(format!("{game_id}.json"));
        self.read(file).await
    }

    async fn friends(&self, user_id: &UserId) -> Result<Vec<FriendInfo>, SyncError> {
        self.ensure_session(user_id).await?;
        self.read(FRIENDS_FILE).await
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, SyncError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound && path.ends_with(PROFILE_FILE) => {
            return Err(SyncError::NotAuthenticated);
        }
        Err(e) => {
            return Err(SyncError::UpstreamUnavailable(format!(
                "{}: {e}",
                path.display()
            )));
        }
    };
    serde_json::from_str(&text)
        .map_err(|e| SyncError::MalformedUpstreamData(format!("{}: {e}", path.display())))
}

fn is_plain_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

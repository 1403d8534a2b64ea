//! Seams to the outside world.
//!
//! The library backend is consumed through [`LibrarySource`]; results flow
//! back to the host through the sink traits, which are handed to each
//! component at construction.

use async_trait::async_trait;
use gamesync_types::{
    Achievement, FriendInfo, GameId, GameTime, LocalGame, OwnedGameRecord, UserId, UserProfile,
};

use crate::error::SyncError;

/// Remote library backend.
///
/// Implementations own transport, session cookies, retries and timeouts.
/// Failures come back as [`SyncError::UpstreamUnavailable`] or
/// [`SyncError::MalformedUpstreamData`].
#[async_trait]
pub trait LibrarySource: Send + Sync {
    /// Resolve the identity behind the current backend session.
    async fn profile(&self) -> Result<UserProfile, SyncError>;

    async fn owned_games(&self, user_id: &UserId) -> Result<Vec<OwnedGameRecord>, SyncError>;

    async fn achievements(
        &self,
        user_id: &UserId,
        game_id: &GameId,
    ) -> Result<Vec<Achievement>, SyncError>;

    async fn friends(&self, user_id: &UserId) -> Result<Vec<FriendInfo>, SyncError>;
}

/// Receives per-game import results. Exactly one call per requested id.
pub trait ImportSink: Send + Sync {
    fn achievements_import_success(&self, game_id: &GameId, achievements: Vec<Achievement>);
    fn achievements_import_failure(&self, game_id: &GameId, error: SyncError);
    fn game_time_import_success(&self, game_time: GameTime);
    fn game_time_import_failure(&self, game_id: &GameId, error: SyncError);
}

/// Receives local install/run state transitions.
pub trait LocalGameSink: Send + Sync {
    fn local_game_changed(&self, change: LocalGame);
}

/// Told when the backend session is no longer usable.
pub trait AuthSink: Send + Sync {
    fn authentication_lost(&self);
}

//! Batch import of per-game data from the library backend.
//!
//! Every batch honours the same contract: each distinct requested id gets
//! exactly one success or failure report on the [`ImportSink`], whether it
//! was answered from cache, short-circuited, fetched, or failed with the
//! whole batch.
//!
//! ```text
//!   import_achievements(ids)
//!          │
//!          ▼
//!   owned_games(user) ──── error ────► every id fails
//!          │
//!          ▼  last_played per id
//!   no play time ──────────────────► success([])
//!   cache.get(id, last_played) hit ─► success(cached)
//!   miss ──► spawn fetch ─► cache.update + success | failure(id)
//! ```

mod achievements;
mod game_times;

#[cfg(test)]
mod importer_tests;

use gamesync_types::{
    Achievement, FriendInfo, GameId, GameTime, OwnedGame, OwnedGameRecord, UserId,
};
use hashbrown::{HashMap, HashSet};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::cache::FreshnessCache;
use crate::error::SyncError;
use crate::session::Session;
use crate::source::{ImportSink, LibrarySource};

pub use achievements::AchievementBatch;
pub use game_times::GameTimeBatch;

/// Achievements keyed by game, gated on the game's last-played time.
pub type AchievementCache = FreshnessCache<GameId, Vec<Achievement>>;

/// Tally of one finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Distinct ids in the request.
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Successes answered from the cache.
    pub from_cache: usize,
    /// Successes that needed a backend fetch.
    pub fetched: usize,
}

impl ImportReport {
    fn new(requested: usize) -> Self {
        Self {
            requested,
            ..Self::default()
        }
    }

    /// Number of sink reports emitted.
    pub fn reported(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Entry point for everything the host asks of the library backend.
pub struct LibraryImporter {
    session: Arc<Session>,
    source: Arc<dyn LibrarySource>,
    sink: Arc<dyn ImportSink>,
    achievements_cache: Arc<AchievementCache>,
}

impl LibraryImporter {
    pub fn new(
        session: Arc<Session>,
        source: Arc<dyn LibrarySource>,
        sink: Arc<dyn ImportSink>,
    ) -> Self {
        Self {
            session,
            source,
            sink,
            achievements_cache: Arc::new(AchievementCache::new()),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn achievements_cache(&self) -> &AchievementCache {
        &self.achievements_cache
    }

    pub async fn owned_games(&self) -> Result<Vec<OwnedGame>, SyncError> {
        let user_id = self.session.user_id()?;
        let records = self
            .checked(self.source.owned_games(&user_id).await)
            .inspect_err(|e| log_source_error(e, "Failed to list owned games"))?;
        Ok(records.iter().map(OwnedGame::from).collect())
    }

    pub async fn friends(&self) -> Result<Vec<FriendInfo>, SyncError> {
        let user_id = self.session.user_id()?;
        self.checked(self.source.friends(&user_id).await)
            .inspect_err(|e| log_source_error(e, "Failed to list friends"))
    }

    /// Fetch one game's achievements directly, bypassing the cache.
    pub async fn unlocked_achievements(
        &self,
        game_id: &GameId,
    ) -> Result<Vec<Achievement>, SyncError> {
        let user_id = self.session.user_id()?;
        self.checked(self.source.achievements(&user_id, game_id).await)
            .inspect_err(|e| log_source_error(e, "Failed to fetch achievements"))
    }

    /// Import achievements for `game_ids` and wait for every report.
    pub async fn import_achievements(
        &self,
        game_ids: &[GameId],
    ) -> Result<ImportReport, SyncError> {
        Ok(self.achievement_batch(game_ids)?.run().await)
    }

    /// Check identity, then run the batch in the background.
    ///
    /// Dropping the handle does not cancel in-flight fetches; they still
    /// populate the cache.
    pub fn start_achievements_import(
        &self,
        game_ids: &[GameId],
    ) -> Result<JoinHandle<ImportReport>, SyncError> {
        let batch = self.achievement_batch(game_ids)?;
        Ok(tokio::spawn(batch.run()))
    }

    pub async fn import_game_times(&self, game_ids: &[GameId]) -> Result<ImportReport, SyncError> {
        Ok(self.game_time_batch(game_ids)?.run().await)
    }

    pub fn start_game_times_import(
        &self,
        game_ids: &[GameId],
    ) -> Result<JoinHandle<ImportReport>, SyncError> {
        let batch = self.game_time_batch(game_ids)?;
        Ok(tokio::spawn(batch.run()))
    }

    fn achievement_batch(&self, game_ids: &[GameId]) -> Result<AchievementBatch, SyncError> {
        let user_id = self.session.user_id()?;
        Ok(AchievementBatch {
            context: self.batch_context(user_id),
            cache: Arc::clone(&self.achievements_cache),
            game_ids: unique_ids(game_ids),
        })
    }

    fn game_time_batch(&self, game_ids: &[GameId]) -> Result<GameTimeBatch, SyncError> {
        let user_id = self.session.user_id()?;
        Ok(GameTimeBatch {
            context: self.batch_context(user_id),
            game_ids: unique_ids(game_ids),
        })
    }

    fn batch_context(&self, user_id: UserId) -> BatchContext {
        BatchContext {
            session: Arc::clone(&self.session),
            source: Arc::clone(&self.source),
            sink: Arc::clone(&self.sink),
            user_id,
        }
    }

    fn checked<T>(&self, result: Result<T, SyncError>) -> Result<T, SyncError> {
        if let Err(SyncError::NotAuthenticated) = &result {
            self.session.lose_authentication();
        }
        result
    }
}

/// Shared handles a batch carries into its spawned tasks.
#[derive(Clone)]
struct BatchContext {
    session: Arc<Session>,
    source: Arc<dyn LibrarySource>,
    sink: Arc<dyn ImportSink>,
    user_id: UserId,
}

impl BatchContext {
    /// One batched owned-games call, reduced to play-time entries by id.
    async fn game_times(&self) -> Result<HashMap<GameId, GameTime>, SyncError> {
        match self.source.owned_games(&self.user_id).await {
            Ok(records) => Ok(game_times_by_id(&records)),
            Err(error) => {
                if error == SyncError::NotAuthenticated {
                    self.session.lose_authentication();
                }
                Err(error)
            }
        }
    }
}

/// Play-time entries keyed by id. Games never played have no entry.
pub fn game_times_by_id(records: &[OwnedGameRecord]) -> HashMap<GameId, GameTime> {
    records
        .iter()
        .filter_map(|record| record.game_time())
        .map(|time| (time.game_id.clone(), time))
        .collect()
}

/// Drop repeated ids, keeping first-seen order.
fn unique_ids(game_ids: &[GameId]) -> Vec<GameId> {
    let mut seen = HashSet::with_capacity(game_ids.len());
    game_ids
        .iter()
        .filter(|id| seen.insert(*id))
        .cloned()
        .collect()
}

/// Upstream failures are reported alike but logged apart.
fn log_source_error(error: &SyncError, context: &str) {
    match error {
        SyncError::MalformedUpstreamData(_) => {
            error!(error = %error, "{context}: malformed backend response")
        }
        SyncError::UpstreamUnavailable(_) => {
            warn!(error = %error, "{context}: backend unavailable")
        }
        _ => warn!(error = %error, "{context}"),
    }
}

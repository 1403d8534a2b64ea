use gamesync_types::GameId;
use std::sync::Arc;
use tracing::{debug, error};

use super::{AchievementCache, BatchContext, ImportReport, log_source_error};
use crate::error::SyncError;

/// One achievements import request, owned by its task.
pub struct AchievementBatch {
    pub(super) context: BatchContext,
    pub(super) cache: Arc<AchievementCache>,
    pub(super) game_ids: Vec<GameId>,
}

impl AchievementBatch {
    pub async fn run(self) -> ImportReport {
        let Self {
            context,
            cache,
            game_ids,
        } = self;
        let mut report = ImportReport::new(game_ids.len());

        let game_times = match context.game_times().await {
            Ok(times) => times,
            Err(error) => {
                log_source_error(&error, "Failed to retrieve game times");
                for game_id in &game_ids {
                    context
                        .sink
                        .achievements_import_failure(game_id, error.clone());
                }
                report.failed = game_ids.len();
                return report;
            }
        };

        let mut tasks = Vec::new();
        for game_id in game_ids {
            let played = game_times
                .get(&game_id)
                .filter(|time| time.time_played > 0);
            let Some(game_time) = played else {
                // Never played, nothing can be unlocked.
                context
                    .sink
                    .achievements_import_success(&game_id, Vec::new());
                report.succeeded += 1;
                continue;
            };

            let timestamp = game_time.last_played;
            if let Some(achievements) = cache.get(&game_id, timestamp) {
                debug!(game_id = %game_id, timestamp, "Achievements served from cache");
                context
                    .sink
                    .achievements_import_success(&game_id, achievements);
                report.succeeded += 1;
                report.from_cache += 1;
                continue;
            }

            let task = tokio::spawn(fetch_game_achievements(
                context.clone(),
                Arc::clone(&cache),
                game_id.clone(),
                timestamp,
            ));
            tasks.push((game_id, task));
        }

        for (game_id, task) in tasks {
            match task.await {
                Ok(true) => {
                    report.succeeded += 1;
                    report.fetched += 1;
                }
                Ok(false) => report.failed += 1,
                Err(join_error) => {
                    error!(game_id = %game_id, error = %join_error, "Achievement fetch task died");
                    context.sink.achievements_import_failure(
                        &game_id,
                        SyncError::UpstreamUnavailable(join_error.to_string()),
                    );
                    report.failed += 1;
                }
            }
        }

        debug!(?report, "Achievements import finished");
        report
    }
}

/// Fetch one game, write through to the cache, report. Returns success.
async fn fetch_game_achievements(
    context: BatchContext,
    cache: Arc<AchievementCache>,
    game_id: GameId,
    timestamp: i64,
) -> bool {
    match context.source.achievements(&context.user_id, &game_id).await {
        Ok(achievements) => {
            cache.update(game_id.clone(), achievements.clone(), timestamp);
            context
                .sink
                .achievements_import_success(&game_id, achievements);
            true
        }
        Err(error) => {
            log_source_error(&error, &format!("Failed to import achievements for {game_id}"));
            context.sink.achievements_import_failure(&game_id, error);
            false
        }
    }
}

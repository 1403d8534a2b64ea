use gamesync_types::GameId;
use tracing::debug;

use super::{BatchContext, ImportReport, log_source_error};
use crate::error::SyncError;

/// One game-time import request.
pub struct GameTimeBatch {
    pub(super) context: BatchContext,
    pub(super) game_ids: Vec<GameId>,
}

impl GameTimeBatch {
    pub async fn run(self) -> ImportReport {
        let Self { context, game_ids } = self;
        let mut report = ImportReport::new(game_ids.len());

        let game_times = match context.game_times().await {
            Ok(times) => times,
            Err(error) => {
                log_source_error(&error, "Failed to import game times");
                for game_id in &game_ids {
                    context.sink.game_time_import_failure(game_id, error.clone());
                }
                report.failed = game_ids.len();
                return report;
            }
        };

        for game_id in game_ids {
            match game_times.get(&game_id) {
                Some(game_time) => {
                    context.sink.game_time_import_success(game_time.clone());
                    report.succeeded += 1;
                }
                None => {
                    context
                        .sink
                        .game_time_import_failure(&game_id, SyncError::UnknownGame(game_id.clone()));
                    report.failed += 1;
                }
            }
        }

        debug!(?report, "Game times import finished");
        report
    }
}

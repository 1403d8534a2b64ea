//! Line-delimited JSON bridge to the host process.
//!
//! ```text
//!   stdin  ── {"command": ...} ──► Host::handle ──► LibraryImporter / poller
//!                                                        │
//!   stdout ◄── {"event": ...} ◄── notification channel ◄─┘ (HostSink)
//! ```
//!
//! Every notification goes through one channel so lines never interleave.
//! Import commands are acknowledged right away; per-game results stream in
//! as the batch runs, followed by an `import_finished` summary.

use gamesync_core::{
    AuthSink, ImportReport, ImportSink, LibraryImporter, LibrarySource, LocalGameSink,
    LocalGamePoller, SyncError,
};
use gamesync_types::{
    Achievement, FriendInfo, GameId, GameTime, LocalGame, OwnedGame, UserProfile,
};
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Authenticate,
    OwnedGames,
    ImportAchievements { game_ids: Vec<GameId> },
    ImportGameTimes { game_ids: Vec<GameId> },
    UnlockedAchievements { game_id: GameId },
    Friends,
    LocalGames,
    Shutdown,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Authenticate => "authenticate",
            Self::OwnedGames => "owned_games",
            Self::ImportAchievements { .. } => "import_achievements",
            Self::ImportGameTimes { .. } => "import_game_times",
            Self::UnlockedAchievements { .. } => "unlocked_achievements",
            Self::Friends => "friends",
            Self::LocalGames => "local_games",
            Self::Shutdown => "shutdown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    Achievements,
    GameTimes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Notification {
    Authenticated {
        profile: UserProfile,
    },
    AuthenticationLost,
    OwnedGames {
        games: Vec<OwnedGame>,
    },
    Friends {
        friends: Vec<FriendInfo>,
    },
    UnlockedAchievements {
        game_id: GameId,
        achievements: Vec<Achievement>,
    },
    ImportStarted {
        kind: ImportKind,
    },
    AchievementsImported {
        game_id: GameId,
        achievements: Vec<Achievement>,
    },
    AchievementsImportFailed {
        game_id: GameId,
        error: String,
    },
    GameTimeImported {
        #[serde(flatten)]
        game_time: GameTime,
    },
    GameTimeImportFailed {
        game_id: GameId,
        error: String,
    },
    ImportFinished {
        kind: ImportKind,
        requested: usize,
        succeeded: usize,
        failed: usize,
    },
    LocalGames {
        games: Vec<LocalGame>,
    },
    LocalGameChanged {
        #[serde(flatten)]
        change: LocalGame,
    },
    Error {
        command: String,
        error: String,
    },
    /// Last line before the agent exits.
    Stopped,
}

/// Routes every sink callback onto the notification channel.
///
/// A closed channel means the agent is shutting down; sends are dropped.
#[derive(Clone)]
pub struct HostSink {
    tx: UnboundedSender<Notification>,
}

impl HostSink {
    pub fn new(tx: UnboundedSender<Notification>) -> Self {
        Self { tx }
    }

    pub fn notify(&self, notification: Notification) {
        let _ = self.tx.send(notification);
    }
}

impl ImportSink for HostSink {
    fn achievements_import_success(&self, game_id: &GameId, achievements: Vec<Achievement>) {
        self.notify(Notification::AchievementsImported {
            game_id: game_id.clone(),
            achievements,
        });
    }

    fn achievements_import_failure(&self, game_id: &GameId, error: SyncError) {
        self.notify(Notification::AchievementsImportFailed {
            game_id: game_id.clone(),
            error: error.to_string(),
        });
    }

    fn game_time_import_success(&self, game_time: GameTime) {
        self.notify(Notification::GameTimeImported { game_time });
    }

    fn game_time_import_failure(&self, game_id: &GameId, error: SyncError) {
        self.notify(Notification::GameTimeImportFailed {
            game_id: game_id.clone(),
            error: error.to_string(),
        });
    }
}

impl LocalGameSink for HostSink {
    fn local_game_changed(&self, change: LocalGame) {
        self.notify(Notification::LocalGameChanged { change });
    }
}

impl AuthSink for HostSink {
    fn authentication_lost(&self) {
        self.notify(Notification::AuthenticationLost);
    }
}

pub struct Host {
    importer: Arc<LibraryImporter>,
    source: Arc<dyn LibrarySource>,
    sink: HostSink,
}

impl Host {
    pub fn new(importer: LibraryImporter, source: Arc<dyn LibrarySource>, sink: HostSink) -> Self {
        Self {
            importer: Arc::new(importer),
            source,
            sink,
        }
    }

    /// Parse one input line. Blank lines yield `None`; bad ones are reported.
    pub fn parse_line(&self, line: &str) -> Option<Command> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str(line) {
            Ok(command) => Some(command),
            Err(e) => {
                warn!(error = %e, "Unreadable host command");
                self.sink.notify(Notification::Error {
                    command: line.to_string(),
                    error: e.to_string(),
                });
                None
            }
        }
    }

    /// Dispatch a command. Backend work runs on its own task so the tick
    /// loop is never held up.
    pub fn handle(&self, command: Command, poller: &LocalGamePoller) -> ControlFlow<()> {
        debug!(command = command.name(), "Host command");
        match command {
            Command::Shutdown => return ControlFlow::Break(()),
            Command::LocalGames => self.sink.notify(Notification::LocalGames {
                games: poller.local_games(),
            }),
            Command::ImportAchievements { game_ids } => {
                let started = self.importer.start_achievements_import(&game_ids);
                self.follow_import(ImportKind::Achievements, "import_achievements", started);
            }
            Command::ImportGameTimes { game_ids } => {
                let started = self.importer.start_game_times_import(&game_ids);
                self.follow_import(ImportKind::GameTimes, "import_game_times", started);
            }
            Command::Authenticate => {
                let importer = Arc::clone(&self.importer);
                let source = Arc::clone(&self.source);
                self.spawn_query("authenticate", async move {
                    let profile = importer.session().authenticate(source.as_ref()).await?;
                    Ok(Notification::Authenticated { profile })
                });
            }
            Command::OwnedGames => {
                let importer = Arc::clone(&self.importer);
                self.spawn_query("owned_games", async move {
                    let games = importer.owned_games().await?;
                    Ok(Notification::OwnedGames { games })
                });
            }
            Command::Friends => {
                let importer = Arc::clone(&self.importer);
                self.spawn_query("friends", async move {
                    let friends = importer.friends().await?;
                    Ok(Notification::Friends { friends })
                });
            }
            Command::UnlockedAchievements { game_id } => {
                let importer = Arc::clone(&self.importer);
                self.spawn_query("unlocked_achievements", async move {
                    let achievements = importer.unlocked_achievements(&game_id).await?;
                    Ok(Notification::UnlockedAchievements {
                        game_id,
                        achievements,
                    })
                });
            }
        }
        ControlFlow::Continue(())
    }

    /// Run a one-answer command in the background and report its outcome.
    fn spawn_query<F>(&self, name: &'static str, query: F)
    where
        F: Future<Output = Result<Notification, SyncError>> + Send + 'static,
    {
        let sink = self.sink.clone();
        tokio::spawn(async move {
            let notification = query.await.unwrap_or_else(|e| Notification::Error {
                command: name.to_string(),
                error: e.to_string(),
            });
            sink.notify(notification);
        });
    }

    fn follow_import(
        &self,
        kind: ImportKind,
        name: &str,
        started: Result<JoinHandle<ImportReport>, SyncError>,
    ) {
        let handle = match started {
            Ok(handle) => handle,
            Err(e) => {
                self.sink.notify(Notification::Error {
                    command: name.to_string(),
                    error: e.to_string(),
                });
                return;
            }
        };
        self.sink.notify(Notification::ImportStarted { kind });
        let sink = self.sink.clone();
        tokio::spawn(async move {
            match handle.await {
                Ok(report) => sink.notify(Notification::ImportFinished {
                    kind,
                    requested: report.requested,
                    succeeded: report.succeeded,
                    failed: report.failed,
                }),
                Err(e) => warn!(error = %e, "Import task failed"),
            }
        });
    }
}

/// Drain notifications to `out`, one JSON object per line, until
/// [`Notification::Stopped`] is written or every sender is gone.
pub async fn write_notifications<W>(mut out: W, mut rx: UnboundedReceiver<Notification>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(notification) = rx.recv().await {
        let mut line = match serde_json::to_string(&notification) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to encode notification");
                continue;
            }
        };
        line.push('\n');
        if let Err(e) = out.write_all(line.as_bytes()).await {
            warn!(error = %e, "Host output closed");
            return;
        }
        if let Err(e) = out.flush().await {
            warn!(error = %e, "Host output closed");
            return;
        }
        if matches!(notification, Notification::Stopped) {
            return;
        }
    }
}

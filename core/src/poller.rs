//! Tick-driven local game state tracking.
//!
//! Each tick asks the change signal whether the install store moved. Only
//! then is a fresh snapshot read (on the blocking pool), diffed against the
//! previous one, and the transitions pushed to the sink. The tick itself
//! only spawns; it never waits on the read.
//!
//! Refreshes are serialized: if a second tick fires while a refresh is
//! still reading, it queues behind the first so diffs always chain.

use gamesync_types::LocalGame;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::local::{LocalStateReader, Snapshot, state_changes};
use crate::signal::ChangeSignal;
use crate::source::LocalGameSink;

pub struct LocalGamePoller {
    signal: Box<dyn ChangeSignal>,
    state: Arc<PollerState>,
}

struct PollerState {
    reader: Arc<dyn LocalStateReader>,
    sink: Arc<dyn LocalGameSink>,
    current: RwLock<Arc<Snapshot>>,
    refresh_gate: Mutex<()>,
}

impl LocalGamePoller {
    /// Reads the initial snapshot right away. A failed read starts empty.
    pub fn new(
        signal: Box<dyn ChangeSignal>,
        reader: Arc<dyn LocalStateReader>,
        sink: Arc<dyn LocalGameSink>,
    ) -> Self {
        let initial = reader.read_snapshot().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read local games, starting empty");
            Snapshot::new()
        });
        debug!(games = initial.len(), "Initial local game snapshot");
        Self {
            signal,
            state: Arc::new(PollerState {
                reader,
                sink,
                current: RwLock::new(Arc::new(initial)),
                refresh_gate: Mutex::new(()),
            }),
        }
    }

    /// Ask the change signal and, if it fired, refresh in the background.
    ///
    /// Returns the refresh task, or `None` when nothing changed.
    pub fn tick(&mut self) -> Option<JoinHandle<()>> {
        if !self.signal.check_if_updated() {
            return None;
        }
        let state = Arc::clone(&self.state);
        Some(tokio::spawn(async move { state.refresh().await }))
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.state.snapshot()
    }

    pub fn local_games(&self) -> Vec<LocalGame> {
        self.snapshot().local_games()
    }
}

impl PollerState {
    fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    async fn refresh(&self) {
        let _gate = self.refresh_gate.lock().await;

        let reader = Arc::clone(&self.reader);
        let fresh = match tokio::task::spawn_blocking(move || reader.read_snapshot()).await {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(e)) => {
                warn!(error = %e, "Failed to read local games, keeping previous state");
                return;
            }
            Err(e) => {
                error!(error = %e, "Local game read task failed");
                return;
            }
        };

        let previous = self.snapshot();
        let changes = state_changes(&previous, &fresh);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(fresh);

        debug!(changes = changes.len(), "Local games refreshed");
        for change in changes {
            debug!(game_id = %change.game_id, state = %change.local_game_state, "Local game changed");
            self.sink.local_game_changed(change);
        }
    }
}

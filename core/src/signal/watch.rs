use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use tracing::{debug, warn};

use super::ChangeSignal;

type WatchEvent = notify::Result<Event>;

/// Event-driven signal backed by filesystem notifications.
///
/// Watches the file's directory and drains queued events without waiting.
/// When the file disappears the watch is dropped; the next call tries to
/// re-open it, and a successful re-open counts as a change.
pub struct WatchChangeSignal {
    path: PathBuf,
    watcher: Option<RecommendedWatcher>,
    tx: Sender<WatchEvent>,
    rx: Receiver<WatchEvent>,
}

impl WatchChangeSignal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (tx, rx) = mpsc::channel();
        let mut signal = Self {
            path: path.into(),
            watcher: None,
            tx,
            rx,
        };
        signal.open();
        signal
    }

    pub fn is_open(&self) -> bool {
        self.watcher.is_some()
    }

    fn open(&mut self) {
        if !self.path.is_file() {
            return;
        }
        let Some(dir) = self.path.parent() else {
            return;
        };
        match arm_watcher(dir, self.tx.clone()) {
            Ok(watcher) => {
                debug!(path = %self.path.display(), "Watching for changes");
                self.watcher = Some(watcher);
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to watch file");
            }
        }
    }

    fn concerns_file(&self, event: &Event) -> bool {
        let name = self.path.file_name();
        event.paths.iter().any(|p| p.file_name() == name)
    }
}

fn arm_watcher(dir: &Path, tx: Sender<WatchEvent>) -> notify::Result<RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(tx)?;
    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

/// Reads show up as access events; only writes, creates, renames and
/// removals count.
fn is_mutation(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

impl ChangeSignal for WatchChangeSignal {
    fn check_if_updated(&mut self) -> bool {
        if self.watcher.is_none() {
            self.open();
            return self.watcher.is_some();
        }

        let mut changed = false;
        let mut removed = false;
        loop {
            match self.rx.try_recv() {
                Ok(Ok(event)) => {
                    if !is_mutation(&event.kind) || !self.concerns_file(&event) {
                        continue;
                    }
                    changed = true;
                    if matches!(event.kind, EventKind::Remove(_)) {
                        removed = true;
                    }
                }
                Ok(Err(e)) => {
                    warn!(path = %self.path.display(), error = %e, "File watch error");
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!(path = %self.path.display(), "File watch channel closed");
                    break;
                }
            }
        }

        if removed && !self.path.is_file() {
            debug!(path = %self.path.display(), "Watched file removed");
            self.watcher = None;
        }
        changed
    }
}

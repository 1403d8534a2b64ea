use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use super::ChangeSignal;

/// Size and mtime of the backing file. A missing file reads as all zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct FileStamp {
    size: u64,
    modified_ns: u128,
}

impl FileStamp {
    fn read(path: &Path) -> Self {
        let Ok(meta) = fs::metadata(path) else {
            return Self::default();
        };
        let modified_ns = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        Self {
            size: meta.len(),
            modified_ns,
        }
    }
}

/// Polls a file's size and mtime on every call.
///
/// The first call always reports a change since there is nothing to
/// compare against yet.
#[derive(Debug)]
pub struct StatChangeSignal {
    path: PathBuf,
    last: Option<FileStamp>,
}

impl StatChangeSignal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last: None,
        }
    }
}

impl ChangeSignal for StatChangeSignal {
    fn check_if_updated(&mut self) -> bool {
        let current = FileStamp::read(&self.path);
        let changed = self.last != Some(current);
        self.last = Some(current);
        changed
    }
}

pub mod cache;
pub mod context;
pub mod error;
pub mod import;
pub mod local;
pub mod poller;
pub mod session;
pub mod signal;
pub mod source;

pub use cache::FreshnessCache;
pub use error::{LocalStateError, SyncError};
pub use import::{ImportReport, LibraryImporter};
pub use local::{LocalStateReader, Snapshot};
pub use poller::LocalGamePoller;
pub use session::Session;
pub use signal::ChangeSignal;
pub use source::{AuthSink, ImportSink, LibrarySource, LocalGameSink};

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_DIR_ENV: &str = "GAMESYNC_LOG_DIR";
const LOG_FILE_PREFIX: &str = "gamesync-agent.log";

/// Install the global subscriber.
///
/// `GAMESYNC_LOG_DIR` wins over the configured directory. With neither set,
/// logs go to stderr; stdout belongs to the host bridge. Keep the returned
/// guard alive until exit so buffered lines are flushed.
pub fn init_logging(configured_dir: Option<&str>) -> Option<WorkerGuard> {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    let dir = std::env::var(LOG_DIR_ENV)
        .ok()
        .or_else(|| configured_dir.map(str::to_owned));

    if let Some(dir) = dir
        && std::fs::create_dir_all(&dir).is_ok()
    {
        let appender = tracing_appender::rolling::daily(Path::new(&dir), LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_ansi(false)
            .with_writer(writer)
            .init();
        return Some(guard);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
    None
}

mod host;
mod logging;
mod source;

use clap::Parser;
use gamesync_core::context::{AgentConfigExt, change_signal, local_state_reader};
use gamesync_core::{LibraryImporter, LibrarySource, LocalGamePoller, Session};
use gamesync_types::{AgentConfig, ChangeSignalKind};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::host::{Host, HostSink, Notification, write_notifications};
use crate::source::JsonDirSource;

#[derive(Parser)]
#[command(version, about = "Game library sync agent")]
struct Cli {
    /// Read config from this file instead of the per-user location.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Offline library mirror directory.
    #[arg(short, long)]
    library_dir: Option<PathBuf>,

    /// Path to registry.vdf.
    #[arg(long)]
    registry: Option<PathBuf>,

    #[arg(long, value_enum)]
    signal: Option<SignalArg>,

    /// Milliseconds between local-state ticks.
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Write the effective config back before starting.
    #[arg(long)]
    save_config: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum SignalArg {
    Auto,
    Poll,
    Watch,
}

impl From<SignalArg> for ChangeSignalKind {
    fn from(arg: SignalArg) -> Self {
        match arg {
            SignalArg::Auto => ChangeSignalKind::Auto,
            SignalArg::Poll => ChangeSignalKind::Poll,
            SignalArg::Watch => ChangeSignalKind::Watch,
        }
    }
}

impl Cli {
    fn apply(&self, config: &mut AgentConfig) {
        if let Some(dir) = &self.library_dir {
            config.library_directory = Some(dir.clone());
        }
        if let Some(path) = &self.registry {
            config.registry_path = Some(path.clone());
        }
        if let Some(signal) = self.signal {
            config.change_signal = signal.into();
        }
        if let Some(ms) = self.tick_ms {
            config.tick_interval_ms = ms;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AgentConfig::load_from(path).map_err(|e| e.to_string())?,
        None => AgentConfig::load(),
    };
    cli.apply(&mut config);

    let _log_guard = logging::init_logging(config.log_directory.as_deref());

    if cli.save_config {
        match &cli.config {
            Some(path) => config.save_to(path).map_err(|e| e.to_string())?,
            None => config.save(),
        }
    }

    let Some(library_dir) = config.library_directory.clone() else {
        error!("No library directory configured");
        return Err("no library directory configured (use --library-dir)".to_string());
    };

    run(config, library_dir).await
}

async fn run(config: AgentConfig, library_dir: PathBuf) -> Result<(), String> {
    info!(
        library = %library_dir.display(),
        tick_ms = config.tick_interval_ms,
        "Starting gamesync agent"
    );

    let (tx, rx) = mpsc::unbounded_channel();
    let sink = HostSink::new(tx);
    let writer = tokio::spawn(write_notifications(tokio::io::stdout(), rx));

    let source: Arc<dyn LibrarySource> = Arc::new(JsonDirSource::new(library_dir));
    let session = Arc::new(Session::with_auth_sink(Arc::new(sink.clone())));
    let importer = LibraryImporter::new(session, Arc::clone(&source), Arc::new(sink.clone()));
    let mut poller = LocalGamePoller::new(
        change_signal(&config),
        local_state_reader(&config),
        Arc::new(sink.clone()),
    );
    let host = Host::new(importer, source, sink.clone());

    let mut ticks = tokio::time::interval(Duration::from_millis(config.tick_interval_ms.max(1)));
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = ticks.tick() => {
                let _ = poller.tick();
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if let Some(command) = host.parse_line(&line)
                        && host.handle(command, &poller).is_break()
                    {
                        info!("Shutdown requested");
                        break;
                    }
                }
                Ok(None) => {
                    info!("Host closed stdin");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Failed to read host input");
                    break;
                }
            },
        }
    }

    sink.notify(Notification::Stopped);
    writer.await.map_err(|e| e.to_string())?;
    Ok(())
}

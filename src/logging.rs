use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "friendsync=info";

/// Where log lines go
pub enum LogTarget {
  /// Plain stderr, for one-shot commands
  Stderr,
  /// A file in the data directory, so the terminal UI keeps the screen
  File,
}

/// Install the global tracing subscriber.
///
/// Respects `RUST_LOG`. The returned guard must be held until exit or
/// buffered file output is lost.
pub fn init(target: LogTarget) -> Result<Option<WorkerGuard>> {
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

  match target {
    LogTarget::Stderr => {
      let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();
      let _ = tracing::subscriber::set_global_default(subscriber);
      Ok(None)
    }
    LogTarget::File => {
      let dir = log_dir()?;
      std::fs::create_dir_all(&dir)
        .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

      let appender = tracing_appender::rolling::never(&dir, "friendsync.log");
      let (writer, guard) = tracing_appender::non_blocking(appender);
      let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(false)
        .finish();
      let _ = tracing::subscriber::set_global_default(subscriber);
      Ok(Some(guard))
    }
  }
}

fn log_dir() -> Result<PathBuf> {
  let data_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?;

  Ok(data_dir.join("friendsync"))
}

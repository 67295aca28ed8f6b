//! Tracing subscriber setup.

use color_eyre::{eyre::eyre, Result};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LogConfig;

/// Map a configured level name to a tracing level.
///
/// Accepts the level names of the original deployment (`fatal`, `log`, `verbose`)
/// alongside the tracing ones. Unknown names yield `None`.
pub fn parse_level(name: &str) -> Option<Level> {
  match name.trim().to_lowercase().as_str() {
    "fatal" | "error" => Some(Level::ERROR),
    "warn" => Some(Level::WARN),
    "log" | "info" => Some(Level::INFO),
    "debug" => Some(Level::DEBUG),
    "verbose" | "trace" => Some(Level::TRACE),
    _ => None,
  }
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. When a log file is
/// configured, the returned guard must be kept alive to flush it.
pub fn init(config: &LogConfig) -> Result<Option<WorkerGuard>> {
  let level = parse_level(&config.level).unwrap_or(Level::INFO);
  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(format!("warn,pokecache={}", level)));

  let stderr_layer = fmt::layer().with_writer(std::io::stderr);

  let (file_layer, guard) = match &config.file {
    Some(path) => {
      let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
      let file_name = path
        .file_name()
        .ok_or_else(|| eyre!("Log file path has no file name: {}", path.display()))?;

      std::fs::create_dir_all(dir)
        .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

      let appender = tracing_appender::rolling::never(dir, file_name);
      let (writer, guard) = tracing_appender::non_blocking(appender);
      let layer = fmt::layer().with_ansi(false).with_writer(writer);
      (Some(layer), Some(guard))
    }
    None => (None, None),
  };

  tracing_subscriber::registry()
    .with(filter)
    .with(stderr_layer)
    .with(file_layer)
    .try_init()
    .map_err(|e| eyre!("Failed to install tracing subscriber: {}", e))?;

  if parse_level(&config.level).is_none() {
    tracing::warn!(level = %config.level, "Unknown log level, using info");
  }

  Ok(guard)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_original_level_names() {
    assert_eq!(parse_level("fatal"), Some(Level::ERROR));
    assert_eq!(parse_level("log"), Some(Level::INFO));
    assert_eq!(parse_level("verbose"), Some(Level::TRACE));
  }

  #[test]
  fn test_tracing_level_names() {
    assert_eq!(parse_level("error"), Some(Level::ERROR));
    assert_eq!(parse_level("WARN"), Some(Level::WARN));
    assert_eq!(parse_level(" info "), Some(Level::INFO));
    assert_eq!(parse_level("debug"), Some(Level::DEBUG));
    assert_eq!(parse_level("trace"), Some(Level::TRACE));
  }

  #[test]
  fn test_unknown_level() {
    assert_eq!(parse_level("loud"), None);
    assert_eq!(parse_level(""), None);
  }
}

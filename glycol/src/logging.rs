//! Logging setup
//!
//! Installs a `tracing` subscriber with two outputs:
//!
//! - **Console** (stderr): compact, local wall-clock time, so stdout stays
//!   free for event output.
//! - **File** (optional): one file per day under the log directory, written
//!   from a background thread.
//!
//! The level filter defaults to `glycol=info` (`glycol=debug` when verbose)
//! and can be overridden with `RUST_LOG`.

use std::path::{Path, PathBuf};

use thiserror::Error;
use time::macros::format_description;
use time::UtcOffset;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Log file name prefix; the appender adds the date.
pub const LOG_FILE_PREFIX: &str = "glycol.log";

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to install log subscriber: {0}")]
    Init(String),
}

/// Keeps the file writer alive. Dropping it flushes pending log lines.
#[derive(Debug)]
pub struct LoggingGuard {
    _worker: Option<WorkerGuard>,
    directory: Option<PathBuf>,
}

impl LoggingGuard {
    /// Directory receiving log files, if file logging is enabled.
    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }
}

/// Default filter directive.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "glycol=debug,glycol_cli=debug"
    } else {
        "glycol=info,glycol_cli=info"
    }
}

/// Builds the level filter, preferring `RUST_LOG` when it is set and valid.
pub fn build_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

/// Installs the global subscriber.
///
/// Fails if a subscriber is already installed.
pub fn init_logging(directory: Option<&Path>, verbose: bool) -> Result<LoggingGuard, LoggingError> {
    // Must be read before any threads are spawned on some platforms.
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(OffsetTime::new(
            offset,
            format_description!("[hour]:[minute]:[second]"),
        ));

    let (file, worker) = match directory {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, worker) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_timer(OffsetTime::new(
                    offset,
                    format_description!(
                        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
                    ),
                ));
            (Some(layer), Some(worker))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(build_filter(verbose))
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(LoggingGuard {
        _worker: worker,
        directory: directory.map(Path::to_path_buf),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert!(default_directive(false).contains("glycol=info"));
        assert!(default_directive(true).contains("glycol=debug"));
    }

    #[test]
    fn test_create_dir_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        // A regular file cannot be a log directory.
        let result = init_logging(Some(&file.path().join("logs")), false);
        assert!(matches!(result, Err(LoggingError::CreateDir { .. })));
    }
}

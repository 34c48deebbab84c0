//! CLI error type.

use thiserror::Error;

use glycol::config::ConfigError;
use glycol::filter::FilterError;
use glycol::logging::LoggingError;
use glycol::monitor::MonitorError;
use glycol::reference::ReferenceError;

/// Errors surfaced to the user by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid command-line or configuration input.
    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Monitor(#[from] MonitorError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    /// Failed to set up the async runtime or the signal handler.
    #[error("{0}")]
    Runtime(String),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_)
            | CliError::ConfigFile(_)
            | CliError::Filter(_)
            | CliError::Monitor(MonitorError::Config(_))
            | CliError::Monitor(MonitorError::Filter(_)) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Config("bad".to_string()).exit_code(), 2);
        assert_eq!(CliError::Filter(FilterError::EmptyFilter).exit_code(), 2);
        assert_eq!(CliError::Runtime("boom".to_string()).exit_code(), 1);
        assert_eq!(CliError::Monitor(MonitorError::NotRunning).exit_code(), 1);
    }
}

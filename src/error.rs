use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Unified error type for git-autoversion operations
#[derive(Error, Debug)]
pub enum AutoVersionError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Working directory '{}' does not exist", .0.display())]
    WorkingDirectoryMissing(PathBuf),

    #[error("Failed to start '{tool}': {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Process error: {0}")]
    Process(String),

    #[error("'{tool}' did not finish within {}ms", .timeout.as_millis())]
    Timeout { tool: String, timeout: Duration },
}

/// Convenience type alias for Results in git-autoversion
pub type Result<T> = std::result::Result<T, AutoVersionError>;

impl AutoVersionError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        AutoVersionError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        AutoVersionError::Version(msg.into())
    }

    /// Create a process error with context
    pub fn process(msg: impl Into<String>) -> Self {
        AutoVersionError::Process(msg.into())
    }

    /// True when the error is the harness deadline rather than a tool failure
    pub fn is_timeout(&self) -> bool {
        matches!(self, AutoVersionError::Timeout { .. })
    }
}

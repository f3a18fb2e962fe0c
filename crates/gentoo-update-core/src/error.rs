//! Error types for gentoo-update-core

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using gentoo-update-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for gentoo-update
#[derive(Error, Debug)]
pub enum Error {
    /// The running program cannot be replaced in place
    #[error("Do not have write access to {}", path.display())]
    Permission { path: PathBuf },

    /// The self-update payload could not be downloaded
    #[error("Unable to connect to {host}: {message}")]
    Network { host: String, message: String },

    /// The downloaded payload does not carry the integrity line
    #[error("Unable to find our integrity line.\nPlease verify the data here: {url}")]
    Integrity { url: String },

    /// The payload passed the integrity check but has no usable revision
    #[error(
        "Unable to find the version on the newly downloaded program: {reason}\n\
         Previous program kept at {}, candidate left at {}",
        backup.display(),
        candidate.display()
    )]
    CorruptCandidate {
        reason: String,
        backup: PathBuf,
        candidate: PathBuf,
    },

    /// The update failed and the backup could not be put back
    #[error(
        "{cause}\nThe previous program could not be restored from {}: {source}",
        backup.display()
    )]
    RollbackFailed {
        cause: Box<Error>,
        backup: PathBuf,
        source: std::io::Error,
    },

    /// The pretend listing is shorter than its fixed header
    #[error(
        "Something has gone wrong when checking for available updates.\n\
         Length value given: {line_count} (expected at least {header_lines})\n\
         Values in list:\n\n{}",
        numbered(.raw_lines)
    )]
    Parse {
        line_count: usize,
        header_lines: usize,
        raw_lines: Vec<String>,
    },

    /// Portage reported blocking packages
    #[error(
        "Blocked packages found by portage! Update cannot proceed. Packages found:\n{}",
        .raw_lines.join("\n")
    )]
    Blocked { raw_lines: Vec<String> },

    /// The host does not satisfy a startup requirement
    #[error("{message}")]
    Precondition { message: String },

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// An external command is not installed
    #[error("Command not found: {program}")]
    CommandNotFound { program: String },

    /// An external command exited unsuccessfully
    #[error("'{command}' failed with {status}")]
    CommandFailed { command: String, status: String },

    /// The user interrupted the program
    #[error("Caught SIGINT, Exiting.")]
    Interrupted,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid regular expression
    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),
}

impl Error {
    /// Create a permission error
    pub fn permission(path: impl Into<PathBuf>) -> Self {
        Self::Permission { path: path.into() }
    }

    /// Create a network error
    pub fn network(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Create an integrity error
    pub fn integrity(url: impl Into<String>) -> Self {
        Self::Integrity { url: url.into() }
    }

    /// Create a corrupt candidate error
    pub fn corrupt_candidate(
        reason: impl Into<String>,
        backup: impl Into<PathBuf>,
        candidate: impl Into<PathBuf>,
    ) -> Self {
        Self::CorruptCandidate {
            reason: reason.into(),
            backup: backup.into(),
            candidate: candidate.into(),
        }
    }

    /// Create a rollback failure keeping the error that caused the rollback
    pub fn rollback_failed(
        cause: Error,
        backup: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::RollbackFailed {
            cause: Box::new(cause),
            backup: backup.into(),
            source,
        }
    }

    /// Create a precondition error
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    /// Create an invalid config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a command failure error
    pub fn command_failed(command: impl Into<String>, status: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            status: status.into(),
        }
    }

    /// Whether this error stands for a user interrupt
    pub fn is_interrupt(&self) -> bool {
        match self {
            Self::Interrupted => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::Interrupted,
            Self::RollbackFailed { cause, .. } => cause.is_interrupt(),
            _ => false,
        }
    }
}

fn numbered(lines: &[String]) -> String {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("Item #{}: {}", i + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}

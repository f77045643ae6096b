//! Error types for process runs.

use std::fmt;
use std::io;

use thiserror::Error;

/// Why a run was rejected.
///
/// Every variant except [`RunError::Launch`] carries the base name of the
/// executable so messages read the same no matter how the program was
/// addressed.
#[derive(Debug, Error)]
pub enum RunError {
    /// The process could not be started at all.
    #[error(transparent)]
    Launch(io::Error),

    /// The running process reported an error (wait failure, failed kill).
    #[error("Error returned from {program}: {source}")]
    Runtime {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The process was terminated because it exceeded its timeout.
    #[error("Process {program} timed out")]
    Timeout { program: String },

    /// The process exited on its own with a non-zero status.
    #[error("Process {program} failed with code {code}")]
    Failed { program: String, code: i32 },
}

impl RunError {
    /// Machine-checkable discriminator for branching on the failure kind.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Launch(err) => ErrorCode::Launch(err.kind()),
            Self::Runtime { source, .. } => ErrorCode::Runtime(source.kind()),
            Self::Timeout { .. } => ErrorCode::Timeout,
            Self::Failed { code, .. } => ErrorCode::Exit(*code),
        }
    }

    /// Whether the run was killed by its timeout.
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// The non-zero exit code, if the process failed that way.
    pub const fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Failed { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Base name of the executable, when known.
    pub fn program(&self) -> Option<&str> {
        match self {
            Self::Launch(_) => None,
            Self::Runtime { program, .. }
            | Self::Timeout { program }
            | Self::Failed { program, .. } => Some(program),
        }
    }
}

/// Discriminator attached to a [`RunError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Launch failed; carries the kind of the raw launch error.
    Launch(io::ErrorKind),
    /// Runtime error event; carries the kind of the underlying error.
    Runtime(io::ErrorKind),
    /// Killed after the timeout elapsed.
    Timeout,
    /// Exited with this non-zero code.
    Exit(i32),
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Launch(kind) | Self::Runtime(kind) => write!(f, "{kind}"),
            Self::Timeout => f.write_str("TIMEOUT"),
            Self::Exit(code) => write!(f, "{code}"),
        }
    }
}

/// Result type for process runs.
pub type Result<T> = std::result::Result<T, RunError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let timeout = RunError::Timeout {
            program: "node".to_string(),
        };
        assert_eq!(timeout.to_string(), "Process node timed out");
        assert_eq!(timeout.code().to_string(), "TIMEOUT");
        assert!(timeout.is_timeout());

        let failed = RunError::Failed {
            program: "node".to_string(),
            code: 2,
        };
        assert_eq!(failed.to_string(), "Process node failed with code 2");
        assert_eq!(failed.code(), ErrorCode::Exit(2));
        assert_eq!(failed.exit_code(), Some(2));

        let runtime = RunError::Runtime {
            program: "node".to_string(),
            source: io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"),
        };
        assert_eq!(runtime.to_string(), "Error returned from node: pipe closed");
        assert_eq!(runtime.code(), ErrorCode::Runtime(io::ErrorKind::BrokenPipe));
        assert_eq!(runtime.program(), Some("node"));
    }

    #[test]
    fn test_launch_is_transparent() {
        let err = RunError::Launch(io::Error::new(io::ErrorKind::NotFound, "no such file"));
        assert_eq!(err.to_string(), "no such file");
        assert_eq!(err.code(), ErrorCode::Launch(io::ErrorKind::NotFound));
        assert_eq!(err.program(), None);
        assert_eq!(err.exit_code(), None);
    }
}

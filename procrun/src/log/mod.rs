//! Logging collaborators for child process output.
//!
//! Output from a child is handed to a caller-supplied [`Logger`], one call
//! per chunk read from the stream, after passing through a [`LogFilter`].

mod filter;
mod output;

pub use filter::{LogFilter, Matcher};
pub(crate) use output::OutputLog;

/// Level a chunk of child output is logged at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Standard output.
    Info,
    /// Standard error.
    Warn,
    /// Errors reported for the process itself.
    Error,
}

impl Level {
    /// Lowercase name of the level.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Receiver of child process output.
///
/// Implementations are called from background tasks, so they must be
/// thread-safe. They should not panic.
pub trait Logger: Send + Sync {
    /// A chunk from standard output.
    fn info(&self, msg: &str);

    /// A chunk from standard error.
    fn warn(&self, msg: &str);

    /// An error raised while running the process.
    fn error(&self, msg: &str);

    /// Dispatch `msg` to the method matching `level`.
    fn log(&self, level: Level, msg: &str) {
        match level {
            Level::Info => self.info(msg),
            Level::Warn => self.warn(msg),
            Level::Error => self.error(msg),
        }
    }
}

/// A [`Logger`] that re-emits child output as `tracing` events.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    program: String,
}

impl TracingLogger {
    /// Create a logger that tags every event with `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Logger for TracingLogger {
    fn info(&self, msg: &str) {
        tracing::info!(program = %self.program, "{msg}");
    }

    fn warn(&self, msg: &str) {
        tracing::warn!(program = %self.program, "{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!(program = %self.program, "{msg}");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::{Level, Logger};

    /// Logger that records every call, for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingLogger {
        calls: Mutex<Vec<(Level, String)>>,
    }

    impl RecordingLogger {
        pub fn messages(&self, level: Level) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(l, _)| *l == level)
                .map(|(_, msg)| msg.clone())
                .collect()
        }

        fn push(&self, level: Level, msg: &str) {
            self.calls.lock().unwrap().push((level, msg.to_string()));
        }
    }

    impl Logger for RecordingLogger {
        fn info(&self, msg: &str) {
            self.push(Level::Info, msg);
        }

        fn warn(&self, msg: &str) {
            self.push(Level::Warn, msg);
        }

        fn error(&self, msg: &str) {
            self.push(Level::Error, msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingLogger;
    use super::*;

    #[test]
    fn test_level_names() {
        assert_eq!(Level::Info.to_string(), "info");
        assert_eq!(Level::Warn.as_str(), "warn");
        assert_eq!(Level::Error.as_str(), "error");
    }

    #[test]
    fn test_log_dispatches_by_level() {
        let logger = RecordingLogger::default();
        logger.log(Level::Warn, "careful");
        logger.log(Level::Info, "hello");

        assert_eq!(logger.messages(Level::Info), vec!["hello"]);
        assert_eq!(logger.messages(Level::Warn), vec!["careful"]);
        assert!(logger.messages(Level::Error).is_empty());
    }
}

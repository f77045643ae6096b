//! Adapter from raw output chunks to logger calls.

use std::sync::Arc;

use super::{Level, LogFilter, Logger};

/// Turns raw chunks into filtered logger calls.
///
/// Cheap to clone; each output reader task holds its own copy.
#[derive(Clone)]
pub(crate) struct OutputLog {
    logger: Option<Arc<dyn Logger>>,
    filter: LogFilter,
}

impl OutputLog {
    pub(crate) fn new(logger: Option<Arc<dyn Logger>>, filter: LogFilter) -> Self {
        Self { logger, filter }
    }

    /// Log a raw chunk. Invalid UTF-8 is replaced, never rejected.
    pub(crate) fn log(&self, level: Level, chunk: &[u8]) {
        if self.logger.is_none() {
            return;
        }
        self.log_text(level, &String::from_utf8_lossy(chunk));
    }

    /// Log already-decoded text.
    pub(crate) fn log_text(&self, level: Level, text: &str) {
        let Some(logger) = &self.logger else {
            return;
        };

        let msg = text.trim();
        if msg.is_empty() {
            return;
        }

        if self.filter.allows(level, msg) {
            logger.log(level, msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::testing::RecordingLogger;

    fn recording(filter: LogFilter) -> (Arc<RecordingLogger>, OutputLog) {
        let logger = Arc::new(RecordingLogger::default());
        let log = OutputLog::new(Some(logger.clone() as Arc<dyn Logger>), filter);
        (logger, log)
    }

    #[test]
    fn test_trims_and_skips_blank_chunks() {
        let (logger, log) = recording(LogFilter::Always);

        log.log(Level::Info, b"  hello world \n");
        log.log(Level::Info, b"\n\n   \t");
        log.log(Level::Info, b"");

        assert_eq!(logger.messages(Level::Info), vec!["hello world"]);
    }

    #[test]
    fn test_chunk_with_several_lines_is_one_call() {
        let (logger, log) = recording(LogFilter::Always);

        log.log(Level::Warn, b"first\nsecond\n");

        assert_eq!(logger.messages(Level::Warn), vec!["first\nsecond"]);
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let (logger, log) = recording(LogFilter::Always);

        log.log(Level::Info, b"ok \xff\xfe bytes");

        let messages = logger.messages(Level::Info);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("ok "));
        assert!(messages[0].ends_with(" bytes"));
    }

    #[test]
    fn test_filter_sees_trimmed_text() {
        let (logger, log) = recording(LogFilter::predicate(|_, msg| msg == "exact"));

        log.log(Level::Info, b"  exact\n");
        log.log(Level::Info, b"inexact");

        assert_eq!(logger.messages(Level::Info), vec!["exact"]);
    }

    #[test]
    fn test_without_logger_is_noop() {
        let log = OutputLog::new(None, LogFilter::predicate(|_, _| panic!("filter called")));
        log.log(Level::Info, b"ignored");
        log.log_text(Level::Error, "ignored");
    }
}

//! Log filters deciding which output chunks reach the logger.

use std::fmt;
use std::sync::Arc;

use regex::{Regex, RegexSet};

use super::Level;

/// Something that can test whether a message matches.
pub trait Matcher: Send + Sync {
    /// Whether `text` matches.
    fn test(&self, text: &str) -> bool;
}

impl Matcher for Regex {
    fn test(&self, text: &str) -> bool {
        self.is_match(text)
    }
}

impl Matcher for RegexSet {
    fn test(&self, text: &str) -> bool {
        self.is_match(text)
    }
}

type Predicate = dyn Fn(Level, &str) -> bool + Send + Sync;

/// Filter applied to every trimmed output chunk before logging.
#[derive(Clone, Default)]
pub enum LogFilter {
    /// Log everything.
    #[default]
    Always,
    /// Log when the predicate returns true for `(level, message)`.
    Predicate(Arc<Predicate>),
    /// Log when at least one matcher matches the message, at any level.
    AnyOf(Vec<Arc<dyn Matcher>>),
}

impl LogFilter {
    /// Build a predicate filter from a closure.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(Level, &str) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    /// Build a filter that logs messages matching any of `matchers`.
    pub fn any_of<I, M>(matchers: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Matcher + 'static,
    {
        Self::AnyOf(
            matchers
                .into_iter()
                .map(|m| Arc::new(m) as Arc<dyn Matcher>)
                .collect(),
        )
    }

    /// Whether a message at `level` should be logged.
    pub fn allows(&self, level: Level, msg: &str) -> bool {
        match self {
            Self::Always => true,
            Self::Predicate(f) => f(level, msg),
            Self::AnyOf(matchers) => matchers.iter().any(|m| m.test(msg)),
        }
    }
}

impl fmt::Debug for LogFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("Always"),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
            Self::AnyOf(matchers) => write!(f, "AnyOf({} matchers)", matchers.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Never;

    impl Matcher for Never {
        fn test(&self, _text: &str) -> bool {
            false
        }
    }

    #[test]
    fn test_default_always_logs() {
        let filter = LogFilter::default();
        assert!(filter.allows(Level::Info, "anything"));
        assert!(filter.allows(Level::Error, ""));
    }

    #[test]
    fn test_predicate_sees_level_and_message() {
        let filter = LogFilter::predicate(|level, msg| level != Level::Info && msg.len() > 2);
        assert!(!filter.allows(Level::Info, "stdout message"));
        assert!(filter.allows(Level::Warn, "stderr message"));
        assert!(!filter.allows(Level::Warn, "no"));
    }

    #[test]
    fn test_any_of_uses_or_semantics() {
        let filter = LogFilter::any_of([
            Regex::new("^error").unwrap(),
            Regex::new("done$").unwrap(),
        ]);
        assert!(filter.allows(Level::Info, "error: bad input"));
        assert!(filter.allows(Level::Warn, "all done"));
        assert!(!filter.allows(Level::Info, "progress 50%"));
    }

    #[test]
    fn test_any_of_mixed_matchers() {
        let matchers: Vec<Arc<dyn Matcher>> = vec![
            Arc::new(Never),
            Arc::new(RegexSet::new(["warn", "fail"]).unwrap()),
        ];
        let filter = LogFilter::AnyOf(matchers);
        assert!(filter.allows(Level::Info, "build failed"));
        assert!(!filter.allows(Level::Info, "build ok"));
    }

    #[test]
    fn test_empty_any_of_rejects_everything() {
        let filter = LogFilter::AnyOf(Vec::new());
        assert!(!filter.allows(Level::Info, "hello"));
    }
}

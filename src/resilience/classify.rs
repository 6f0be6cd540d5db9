//! Failure classification.
//!
//! # Responsibilities
//! - Let callers name the class of a failed call (e.g. a transport status code)
//! - Decide whether a failure counts against a breaker
//!
//! # Design Decisions
//! - The breaker knows nothing about transport error taxonomies; the error
//!   type reports its own class as a string
//! - An error that reports no class never matches a configured filter
//! - Without a filter every failure counts

use std::borrow::Cow;
use std::collections::HashSet;

/// Implemented by error types passed through a breaker.
pub trait FailureClass {
    /// Class of this failure, if it has one.
    fn failure_class(&self) -> Option<Cow<'_, str>> {
        None
    }
}

impl FailureClass for std::io::Error {
    fn failure_class(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Owned(format!("{:?}", self.kind())))
    }
}

impl FailureClass for String {}

impl FailureClass for &'static str {}

impl FailureClass for Box<dyn std::error::Error + Send + Sync> {}

/// Set of failure classes that count against a breaker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassFilter {
    classes: HashSet<String>,
}

impl ClassFilter {
    pub fn new<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
        }
    }

    /// True when `error`'s class is one of the configured classes.
    pub fn matches<E: FailureClass + ?Sized>(&self, error: &E) -> bool {
        error
            .failure_class()
            .is_some_and(|class| self.classes.contains(class.as_ref()))
    }

    pub fn contains(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Configured classes in sorted order.
    pub fn classes(&self) -> Vec<String> {
        let mut classes: Vec<String> = self.classes.iter().cloned().collect();
        classes.sort();
        classes
    }
}

/// Decide whether `error` counts, given an optional filter.
///
/// An absent or empty filter counts everything.
pub fn counts_against<E: FailureClass + ?Sized>(filter: Option<&ClassFilter>, error: &E) -> bool {
    match filter {
        Some(filter) if !filter.is_empty() => filter.matches(error),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct StatusError(&'static str);

    impl FailureClass for StatusError {
        fn failure_class(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.0))
        }
    }

    #[test]
    fn test_no_filter_counts_everything() {
        assert!(counts_against(None, &StatusError("internal")));
        assert!(counts_against(None, &"plain failure"));
        assert!(counts_against(Some(&ClassFilter::default()), &"plain failure"));
    }

    #[test]
    fn test_filter_membership() {
        let filter = ClassFilter::new(["internal"]);
        assert!(counts_against(Some(&filter), &StatusError("internal")));
        assert!(!counts_against(Some(&filter), &StatusError("invalid_argument")));
    }

    #[test]
    fn test_unclassified_never_matches_filter() {
        let filter = ClassFilter::new(["internal"]);
        assert!(!counts_against(Some(&filter), &String::from("boom")));
    }

    #[test]
    fn test_io_error_class_is_kind() {
        let filter = ClassFilter::new(["TimedOut"]);
        let timed_out = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "down");
        assert!(filter.matches(&timed_out));
        assert!(!filter.matches(&refused));
    }

    #[test]
    fn test_classes_sorted() {
        let filter = ClassFilter::new(["unavailable", "internal"]);
        assert_eq!(filter.classes(), vec!["internal", "unavailable"]);
    }
}

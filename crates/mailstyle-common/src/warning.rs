//! Non-fatal warnings collected during one inlining run.
//!
//! Provides deduplication to avoid reporting the same problem twice, and
//! mirrors every new warning to `tracing` so it also shows up in logs.

use std::collections::HashSet;

use tracing::warn;

/// An ordered, de-duplicated list of warning messages.
///
/// # Example
/// ```
/// use mailstyle_common::Warnings;
///
/// let mut warnings = Warnings::new();
/// warnings.push("CSS", "failed to load 'a.css'");
/// warnings.push("CSS", "failed to load 'a.css'");
/// assert_eq!(warnings.into_vec(), vec!["[CSS] failed to load 'a.css'".to_string()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Warnings {
    /// Messages we've already recorded.
    seen: HashSet<String>,
    /// Messages in the order they were first recorded.
    messages: Vec<String>,
}

impl Warnings {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning for `component` (kept once per unique message).
    pub fn push(&mut self, component: &str, message: &str) {
        let key = format!("[{component}] {message}");
        if self.seen.insert(key.clone()) {
            warn!(component, "{message}");
            self.messages.push(key);
        }
    }

    /// Number of distinct warnings recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether no warning has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Iterate over the recorded messages in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(String::as_str)
    }

    /// Consume the collector, returning the messages in order.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.messages
    }
}

// src/exec/classifier.rs

//! Streaming classification of console output into error categories.
//!
//! Every line drained from either stream of a child process is tested
//! against the configured patterns. The first category (in mapping order)
//! with a pattern contained in the line wins and is recorded in the run's
//! [`CategorySignal`]. Non-matching lines leave the signal untouched, so the
//! last match of a run is what the caller sees afterwards.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::types::ErrorCategory;

/// Ordered mapping from category to case-sensitive substring patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorCategoryMapping {
    entries: Vec<(ErrorCategory, Vec<String>)>,
}

impl ErrorCategoryMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a category with its patterns; order of insertion is match order.
    pub fn push<I, S>(&mut self, category: impl Into<ErrorCategory>, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.push((
            category.into(),
            patterns.into_iter().map(Into::into).collect(),
        ));
    }

    pub fn with<I, S>(mut self, category: impl Into<ErrorCategory>, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(category, patterns);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|(_, patterns)| patterns.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ErrorCategory, &[String])> {
        self.entries.iter().map(|(c, p)| (c, p.as_slice()))
    }

    /// First category with a pattern contained in `line`.
    pub fn classify(&self, line: &str) -> Option<&ErrorCategory> {
        self.entries
            .iter()
            .find(|(_, patterns)| {
                patterns
                    .iter()
                    .any(|p| !p.is_empty() && line.contains(p.as_str()))
            })
            .map(|(category, _)| category)
    }
}

/// Build a mapping from labels; iteration (and thus match) order is label order.
impl From<BTreeMap<String, Vec<String>>> for ErrorCategoryMapping {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        let mut mapping = ErrorCategoryMapping::new();
        for (label, patterns) in map {
            mapping.push(ErrorCategory::from(label), patterns);
        }
        mapping
    }
}

/// Lockable cell holding the most recently classified category.
#[derive(Debug, Clone, Default)]
pub struct CategorySignal {
    inner: Arc<Mutex<ErrorCategory>>,
}

impl CategorySignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> ErrorCategory {
        self.lock().clone()
    }

    pub fn set(&self, category: ErrorCategory) {
        *self.lock() = category;
    }

    /// Back to `Undefined`.
    pub fn reset(&self) {
        self.set(ErrorCategory::Undefined);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ErrorCategory> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Line observer fed by the drain tasks of one run.
#[derive(Debug, Clone)]
pub struct Classifier {
    mapping: Arc<ErrorCategoryMapping>,
    signal: CategorySignal,
    shared: Option<CategorySignal>,
}

impl Classifier {
    pub fn new(mapping: ErrorCategoryMapping, signal: CategorySignal) -> Self {
        Self {
            mapping: Arc::new(mapping),
            signal,
            shared: None,
        }
    }

    /// Also mirror every match into a signal that outlives the run.
    pub fn with_shared_signal(mut self, shared: Option<CategorySignal>) -> Self {
        self.shared = shared;
        self
    }

    pub fn signal(&self) -> &CategorySignal {
        &self.signal
    }

    /// Classify one line and record the category on a match.
    pub fn classify(&self, line: &str) -> Option<ErrorCategory> {
        let category = self.mapping.classify(line)?.clone();
        debug!(category = %category, line = %line, "classified console line");
        self.signal.set(category.clone());
        if let Some(shared) = &self.shared {
            shared.set(category.clone());
        }
        Some(category)
    }

    /// Raw line as read from a pipe, including its line terminator.
    pub fn observe_line(&self, raw: &[u8]) {
        if self.mapping.is_empty() {
            return;
        }
        let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = String::from_utf8_lossy(raw);
        self.classify(&line);
    }
}

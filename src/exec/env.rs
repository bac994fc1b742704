// src/exec/env.rs

//! Effective environment for child processes.
//!
//! Overrides are never merged by key. They are appended after the inherited
//! variables and the child sees the value of the *last* occurrence of each
//! key, which is the same contract the OS applies to a duplicated `envp`.

use std::collections::HashMap;
use std::ffi::OsString;

/// Split a `KEY=VALUE` override at the first `=`.
///
/// Returns `None` for entries without `=` or with an empty key.
pub fn parse_override(entry: &str) -> Option<(&str, &str)> {
    match entry.split_once('=') {
        Some((key, value)) if !key.is_empty() => Some((key, value)),
        _ => None,
    }
}

/// Compute the environment sequence for a child process.
///
/// - Empty `overrides`: `None`, the child inherits untouched.
/// - Otherwise: `inherited` followed by the parsed overrides, in order and
///   without deduplication.
///
/// Malformed overrides (see [`parse_override`]) are skipped and reported
/// back so the caller can log them.
pub fn effective_environment<I, K, V>(
    inherited: I,
    overrides: &[String],
) -> Option<EffectiveEnv>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<OsString>,
    V: Into<OsString>,
{
    if overrides.is_empty() {
        return None;
    }

    let mut entries: Vec<(OsString, OsString)> = inherited
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();
    let mut rejected = Vec::new();

    for entry in overrides {
        match parse_override(entry) {
            Some((key, value)) => entries.push((key.into(), value.into())),
            None => rejected.push(entry.clone()),
        }
    }

    Some(EffectiveEnv { entries, rejected })
}

/// Positional last-wins view of an environment sequence.
pub fn resolve<'a, I>(entries: I) -> HashMap<OsString, OsString>
where
    I: IntoIterator<Item = &'a (OsString, OsString)>,
{
    let mut map = HashMap::new();
    for (key, value) in entries {
        map.insert(key.clone(), value.clone());
    }
    map
}

/// Result of [`effective_environment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveEnv {
    /// Inherited entries followed by the accepted overrides.
    pub entries: Vec<(OsString, OsString)>,
    /// Overrides that were not of the form `KEY=VALUE`.
    pub rejected: Vec<String>,
}

impl EffectiveEnv {
    /// The value the child will observe for `key`.
    pub fn get(&self, key: &str) -> Option<&OsString> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k.as_os_str() == key)
            .map(|(_, v)| v)
    }
}

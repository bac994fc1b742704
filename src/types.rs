// src/types.rs

use std::fmt;
use std::str::FromStr;

/// Failure category derived from a command's console output.
///
/// This is an open set: the well-known categories have their own variants and
/// any other label configured by the caller is kept verbatim in `Other`.
/// `Undefined` is the "nothing classified" value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ErrorCategory {
    #[default]
    Undefined,
    Build,
    Compliance,
    Configuration,
    Custom,
    Infrastructure,
    Service,
    Test,
    Other(String),
}

impl ErrorCategory {
    /// Canonical label, as accepted by [`FromStr`].
    pub fn label(&self) -> &str {
        match self {
            ErrorCategory::Undefined => "undefined",
            ErrorCategory::Build => "build",
            ErrorCategory::Compliance => "compliance",
            ErrorCategory::Configuration => "config",
            ErrorCategory::Custom => "custom",
            ErrorCategory::Infrastructure => "infrastructure",
            ErrorCategory::Service => "service",
            ErrorCategory::Test => "test",
            ErrorCategory::Other(label) => label,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, ErrorCategory::Undefined)
    }
}

impl FromStr for ErrorCategory {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let category = match s.trim().to_lowercase().as_str() {
            "" | "undefined" => ErrorCategory::Undefined,
            "build" => ErrorCategory::Build,
            "compliance" => ErrorCategory::Compliance,
            "config" | "configuration" => ErrorCategory::Configuration,
            "custom" => ErrorCategory::Custom,
            "infrastructure" => ErrorCategory::Infrastructure,
            "service" => ErrorCategory::Service,
            "test" => ErrorCategory::Test,
            _ => ErrorCategory::Other(s.trim().to_string()),
        };
        Ok(category)
    }
}

impl From<String> for ErrorCategory {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(category) => category,
            Err(never) => match never {},
        }
    }
}

impl From<&str> for ErrorCategory {
    fn from(s: &str) -> Self {
        ErrorCategory::from(s.to_string())
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which of the two output streams of a child process something refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Stdout => f.write_str("stdout"),
            StreamKind::Stderr => f.write_str("stderr"),
        }
    }
}

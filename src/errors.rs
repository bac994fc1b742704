// src/errors.rs

//! Crate-wide error types.
//!
//! - [`ExecError`] is what the process execution layer returns.
//! - [`CmdrunError`] is the application-level error used by config loading
//!   and the CLI entry point.

use std::fmt;
use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

use crate::types::{ErrorCategory, StreamKind};

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("starting command '{program}' failed")]
    StartFailure {
        program: String,
        #[source]
        source: io::Error,
    },

    /// A started child came back without the requested pipe.
    ///
    /// The dispatcher always requests piped stdout and stderr, and failing to
    /// create a pipe is reported by the spawn itself as [`StartFailure`], so
    /// this is not expected in practice.
    ///
    /// [`StartFailure`]: ExecError::StartFailure
    #[error("getting {stream} pipe for command '{program}' failed")]
    PipeSetupFailure { program: String, stream: StreamKind },

    #[error("running command '{}' failed: failed to capture stdout/stderr", display_command(.program, .args))]
    StreamCopyFailure {
        program: String,
        args: Vec<String>,
        status: Option<ExitStatus>,
        category: ErrorCategory,
        #[source]
        source: CopyFailure,
    },

    #[error("running command '{}' failed: {status}", display_command(.program, .args))]
    NonZeroExit {
        program: String,
        args: Vec<String>,
        status: ExitStatus,
        category: ErrorCategory,
    },

    #[error("waiting for command '{program}' failed")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("command '{program}' was already joined")]
    AlreadyCompleted { program: String },

    #[error("command '{program}' timed out after {timeout:?}")]
    TimedOut {
        program: String,
        timeout: Duration,
        category: ErrorCategory,
    },

    #[error("command '{program}' was cancelled")]
    Cancelled {
        program: String,
        category: ErrorCategory,
    },

    /// Any failure of a script run through [`Command::run_shell`].
    ///
    /// [`Command::run_shell`]: crate::exec::Command::run_shell
    #[error("running shell script failed with {shell}")]
    ShellScript {
        shell: String,
        #[source]
        source: Box<ExecError>,
    },
}

impl ExecError {
    /// The failure of the command itself, looking through shell-script
    /// context.
    pub fn command_error(&self) -> &ExecError {
        match self {
            ExecError::ShellScript { source, .. } => source.command_error(),
            other => other,
        }
    }

    /// Category classified from the output of the failed run, if the process
    /// ran at all.
    pub fn category(&self) -> Option<&ErrorCategory> {
        match self.command_error() {
            ExecError::StreamCopyFailure { category, .. }
            | ExecError::NonZeroExit { category, .. }
            | ExecError::TimedOut { category, .. }
            | ExecError::Cancelled { category, .. } => Some(category),
            _ => None,
        }
    }

    /// Exit code of the process for `NonZeroExit`.
    pub fn exit_code(&self) -> Option<i32> {
        match self.command_error() {
            ExecError::NonZeroExit { status, .. } => status.code(),
            _ => None,
        }
    }
}

/// Copy errors of the two drain tasks, either or both of which may be set.
#[derive(Debug)]
pub struct CopyFailure {
    pub stdout: Option<io::Error>,
    pub stderr: Option<io::Error>,
}

impl fmt::Display for CopyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}'/'{}'",
            display_opt(&self.stdout),
            display_opt(&self.stderr)
        )
    }
}

impl std::error::Error for CopyFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.stdout
            .as_ref()
            .or(self.stderr.as_ref())
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

fn display_opt(err: &Option<io::Error>) -> String {
    match err {
        Some(e) => e.to_string(),
        None => "<nil>".to_string(),
    }
}

fn display_command(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

#[derive(Error, Debug)]
pub enum CmdrunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CmdrunError {
    /// Process exit code the CLI should terminate with.
    pub fn exit_code(&self) -> i32 {
        match self {
            CmdrunError::Exec(e) => e.exit_code().filter(|c| *c != 0).unwrap_or(1),
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, CmdrunError>;

// src/exec/mod.rs

//! Process execution layer.
//!
//! This module runs executables and shell scripts using
//! `tokio::process::Command`, streams their output live into caller-supplied
//! sinks, and classifies that output into error categories.
//!
//! - [`command`] holds the public entry point, [`Command`].
//! - [`execution`] is the joinable handle of a started process.
//! - [`pump`] drains stdout/stderr in two parallel tasks with a join barrier.
//! - [`classifier`] maps output lines to error categories.
//! - [`env`] computes the environment handed to the child.
//! - [`sink`] defines where output is written.
//! - [`launcher`] provides the `Launcher` trait so tests can replace how
//!   processes are created.

pub mod classifier;
pub mod command;
pub mod env;
pub mod execution;
pub mod launcher;
pub mod pump;
pub mod sink;

pub use classifier::{CategorySignal, Classifier, ErrorCategoryMapping};
pub use command::Command;
pub use execution::{Execution, RunOutcome};
pub use launcher::{Launcher, SystemLauncher};
pub use sink::{SharedBuffer, Sink};

pub use crate::errors::{CopyFailure, ExecError};

// src/exec/launcher.rs

//! Pluggable process launcher.
//!
//! The dispatcher never calls `tokio::process::Command::new` itself; it asks
//! its [`Launcher`] for a process command and then applies working directory,
//! environment and stdio on top. Production code uses [`SystemLauncher`];
//! tests can inject a launcher that routes program names to a stand-in
//! process.

use std::fmt::Debug;

use tokio::process::Command as ProcessCommand;

/// Trait abstracting how a program name and arguments become a process.
pub trait Launcher: Send + Sync + Debug {
    /// Build the (not yet spawned) process command for `program`.
    ///
    /// The returned command must not have its stdio configured; the
    /// dispatcher owns that.
    fn command(&self, program: &str, args: &[String]) -> ProcessCommand;
}

/// Launches `program` directly.
///
/// A relative program name is looked up in `PATH`; when environment
/// overrides are present that is the child's `PATH`, including any override.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn command(&self, program: &str, args: &[String]) -> ProcessCommand {
        let mut cmd = ProcessCommand::new(program);
        cmd.args(args);
        cmd
    }
}

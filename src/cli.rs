// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `cmdrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cmdrun",
    version,
    about = "Run an executable or shell script, stream its output and classify failures.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Cmdrun.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CMDRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Working directory for the command (overrides the config file).
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Environment override, appended after the config file's entries.
    #[arg(long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Kill the command after this long, e.g. `30s` or `10m`.
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Resolve and print the effective configuration, but run nothing.
    #[arg(long)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: RunCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum RunCommand {
    /// Run an executable with arguments.
    Exec {
        program: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Feed a script to a shell on its stdin.
    Shell {
        /// Shell to run; defaults to `[command].shell` from the config.
        shell: Option<String>,
        /// Read the script from this file instead of stdin.
        #[arg(long, value_name = "FILE")]
        script_file: Option<PathBuf>,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// `EnvFilter` directive for this level.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

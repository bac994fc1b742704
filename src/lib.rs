// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use std::path::PathBuf;

use anyhow::Context;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use crate::cli::{CliArgs, RunCommand};
use crate::config::{ConfigFile, load_or_default, parse_duration};
use crate::errors::{CmdrunError, Result};
use crate::exec::env::parse_override;
use crate::exec::{Command, RunOutcome};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading plus command-line overrides
/// - the `Command` dispatcher
/// - reading the script for `shell` runs
///
/// Returns `None` for `--dry-run`.
pub async fn run(args: CliArgs) -> Result<Option<RunOutcome>> {
    let cfg = load_or_default(args.config.as_deref())?;
    let cmd = build_command(&cfg, &args)?;

    if args.dry_run {
        print_dry_run(&cfg, &cmd, &args.command);
        return Ok(None);
    }

    let mut execution = match args.command {
        RunCommand::Exec { program, args } => cmd.run_executable_in_background(&program, &args)?,
        RunCommand::Shell { shell, script_file } => {
            let shell = shell.unwrap_or_else(|| cfg.shell().to_string());
            let script = read_script(script_file).await?;
            cmd.run_shell_in_background(&shell, &script)?
        }
    };
    debug!(program = %execution.program(), pid = ?execution.id(), "waiting for command");
    let outcome = execution.join_until(interrupted()).await?;

    info!(
        exit_code = ?outcome.status.code(),
        category = %outcome.category,
        "command finished"
    );
    Ok(Some(outcome))
}

/// Resolves on Ctrl-C. The child runs in its own process group and does not
/// see the terminal's interrupt, so it is stopped through the handle.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Apply the command-line overrides on top of the config file.
pub fn build_command(cfg: &ConfigFile, args: &CliArgs) -> Result<Command> {
    let mut cmd = cfg.to_command();

    if let Some(dir) = &args.dir {
        cmd.set_dir(dir.clone());
    }

    if !args.env.is_empty() {
        for entry in args.env.iter() {
            if parse_override(entry).is_none() {
                return Err(CmdrunError::ConfigError(format!(
                    "--env '{}' is not of the form KEY=VALUE",
                    entry
                )));
            }
        }
        let mut env = cfg.env().to_vec();
        env.extend(args.env.iter().cloned());
        cmd.set_env(env);
    }

    if let Some(timeout) = &args.timeout {
        let timeout = parse_duration(timeout)
            .map_err(|e| CmdrunError::ConfigError(format!("--timeout: {}", e)))?;
        cmd.set_timeout(Some(timeout));
    }

    Ok(cmd)
}

async fn read_script(script_file: Option<PathBuf>) -> Result<String> {
    match script_file {
        Some(path) => {
            let script = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("reading script file {:?}", path))?;
            Ok(script)
        }
        None => {
            let mut script = String::new();
            tokio::io::stdin().read_to_string(&mut script).await?;
            Ok(script)
        }
    }
}

/// Simple dry-run output: print what would be executed and how.
fn print_dry_run(cfg: &ConfigFile, cmd: &Command, run: &RunCommand) {
    println!("cmdrun dry-run");
    match run {
        RunCommand::Exec { program, args } => {
            println!("  exec: {} {}", program, args.join(" "));
        }
        RunCommand::Shell { shell, script_file } => {
            let shell = shell.as_deref().unwrap_or(cfg.shell());
            match script_file {
                Some(path) => println!("  shell: {} < {}", shell, path.display()),
                None => println!("  shell: {} < <stdin>", shell),
            }
        }
    }
    match cmd.dir() {
        Some(dir) => println!("  dir: {}", dir.display()),
        None => println!("  dir: <inherited>"),
    }
    if let Some(timeout) = cmd.timeout() {
        println!("  timeout: {:?}", timeout);
    }
    if !cmd.env().is_empty() {
        println!("  env overrides:");
        for entry in cmd.env() {
            println!("    {entry}");
        }
    }
    if !cfg.error_categories().is_empty() {
        println!("  error categories (in match order):");
        for (label, patterns) in cfg.error_categories() {
            println!("    {label}: {:?}", patterns);
        }
    }

    debug!("dry-run complete (no execution)");
}

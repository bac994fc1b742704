// src/exec/command.rs

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::errors::ExecError;
use crate::exec::classifier::{CategorySignal, Classifier, ErrorCategoryMapping};
use crate::exec::env::effective_environment;
use crate::exec::execution::{Execution, RunOutcome};
use crate::exec::launcher::{Launcher, SystemLauncher};
use crate::exec::pump::spawn_drains;
use crate::exec::sink::Sink;
use crate::types::StreamKind;

/// Everything needed to execute a shell script or an executable.
///
/// A `Command` is configured once and can then be used for any number of
/// runs, sequentially or concurrently; runs only borrow it. Each run gets its
/// own category signal, so concurrent runs never see each other's
/// classification.
#[derive(Debug, Clone)]
pub struct Command {
    dir: Option<PathBuf>,
    stdout: Option<Sink>,
    stderr: Option<Sink>,
    env: Vec<String>,
    error_categories: ErrorCategoryMapping,
    category_signal: Option<CategorySignal>,
    timeout: Option<Duration>,
    launcher: Arc<dyn Launcher>,
}

impl Default for Command {
    fn default() -> Self {
        Self::new()
    }
}

impl Command {
    pub fn new() -> Self {
        Self::with_launcher(Arc::new(SystemLauncher))
    }

    pub fn with_launcher(launcher: Arc<dyn Launcher>) -> Self {
        Self {
            dir: None,
            stdout: None,
            stderr: None,
            env: Vec::new(),
            error_categories: ErrorCategoryMapping::default(),
            category_signal: None,
            timeout: None,
            launcher,
        }
    }

    /// Working directory of the child. Not validated until launch; an empty
    /// path means "inherit ours".
    pub fn set_dir(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        self.dir = if dir.as_os_str().is_empty() {
            None
        } else {
            Some(dir)
        };
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Replace the output sinks. `None` means the standard stream of this
    /// process, decided when a run starts.
    pub fn set_output_sinks(&mut self, stdout: Option<Sink>, stderr: Option<Sink>) {
        self.stdout = stdout;
        self.stderr = stderr;
    }

    /// Replace the `KEY=VALUE` environment overrides.
    pub fn set_env(&mut self, env: Vec<String>) {
        self.env = env;
    }

    pub fn env(&self) -> &[String] {
        &self.env
    }

    /// Replace the classification patterns. An empty mapping disables
    /// classification.
    pub fn set_error_category_mapping(&mut self, mapping: ErrorCategoryMapping) {
        self.error_categories = mapping;
    }

    /// Also record every classification into `signal`, which outlives the
    /// runs. Concurrent runs race on this signal; the per-run category in
    /// [`RunOutcome`] / [`ExecError::category`] does not.
    pub fn set_category_signal(&mut self, signal: Option<CategorySignal>) {
        self.category_signal = signal;
    }

    /// Kill runs that have not finished after `timeout`.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run `shell` with `script` fed verbatim to its stdin and wait for it.
    ///
    /// Failures are wrapped in [`ExecError::ShellScript`].
    pub async fn run_shell(&self, shell: &str, script: &str) -> Result<RunOutcome, ExecError> {
        let mut execution = self.run_shell_in_background(shell, script)?;
        execution.join().await
    }

    /// Start `shell` with `script` on its stdin and return once it runs.
    pub fn run_shell_in_background(
        &self,
        shell: &str,
        script: &str,
    ) -> Result<Execution, ExecError> {
        info!(shell = %shell, script = %script, "running shell script");
        self.start(shell, Vec::new(), Some(script.to_string()))
            .map(|execution| execution.in_shell(shell))
            .map_err(|e| ExecError::ShellScript {
                shell: shell.to_string(),
                source: Box::new(e),
            })
    }

    /// Run `program` with `args` and wait for it.
    ///
    /// A `PATH` override given to [`set_env`](Self::set_env) also decides
    /// where a relative `program` is looked up.
    pub async fn run_executable<S: AsRef<str>>(
        &self,
        program: &str,
        args: &[S],
    ) -> Result<RunOutcome, ExecError> {
        let mut execution = self.run_executable_in_background(program, args)?;
        execution.join().await
    }

    /// Start `program` and return as soon as it runs with both output
    /// streams being drained.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn run_executable_in_background<S: AsRef<str>>(
        &self,
        program: &str,
        args: &[S],
    ) -> Result<Execution, ExecError> {
        let args: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();
        info!(program = %program, args = %args.join(" "), "running command");
        self.start(program, args, None)
    }

    fn start(
        &self,
        program: &str,
        args: Vec<String>,
        input: Option<String>,
    ) -> Result<Execution, ExecError> {
        let stdout_sink = self.stdout.clone().unwrap_or(Sink::Stdout);
        let stderr_sink = self.stderr.clone().unwrap_or(Sink::Stderr);

        let mut cmd = self.launcher.command(program, &args);

        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }

        self.apply_env(&mut cmd);

        // Pipes are requested before spawning so no early output is lost.
        cmd.stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

        // Own process group: timeouts and cancels signal the whole group.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|source| ExecError::StartFailure {
            program: program.to_string(),
            source,
        })?;
        debug!(program = %program, pid = ?child.id(), "process started");

        // Dropping the child on the error paths kills it (kill_on_drop).
        let stdout = child.stdout.take().ok_or_else(|| ExecError::PipeSetupFailure {
            program: program.to_string(),
            stream: StreamKind::Stdout,
        })?;
        let stderr = child.stderr.take().ok_or_else(|| ExecError::PipeSetupFailure {
            program: program.to_string(),
            stream: StreamKind::Stderr,
        })?;

        let stdin = match (input, child.stdin.take()) {
            (Some(script), Some(mut pipe)) => Some(tokio::spawn(async move {
                pipe.write_all(script.as_bytes()).await?;
                pipe.shutdown().await
            })),
            (Some(_), None) => {
                warn!(program = %program, "no stdin pipe available; script not delivered");
                None
            }
            (None, _) => None,
        };

        let signal = CategorySignal::new();
        let classifier = (!self.error_categories.is_empty()).then(|| {
            Classifier::new(self.error_categories.clone(), signal.clone())
                .with_shared_signal(self.category_signal.clone())
        });

        let drains = spawn_drains(stdout, stderr, stdout_sink, stderr_sink, classifier);

        Ok(Execution::new(
            program.to_string(),
            args,
            child,
            drains,
            stdin,
            signal,
            self.timeout,
        ))
    }

    fn apply_env(&self, cmd: &mut tokio::process::Command) {
        let Some(effective) = effective_environment(std::env::vars_os(), &self.env) else {
            return;
        };
        for entry in &effective.rejected {
            warn!(entry = %entry, "ignoring environment override not of the form KEY=VALUE");
        }
        // Applied in order: the last occurrence of a key is what the child sees.
        cmd.env_clear();
        for (key, value) in &effective.entries {
            cmd.env(key, value);
        }
    }
}

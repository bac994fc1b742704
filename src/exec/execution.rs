// src/exec/execution.rs

//! Handle for a started process and its drain tasks.

use std::future::Future;
use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::errors::{CopyFailure, ExecError};
use crate::exec::classifier::CategorySignal;
use crate::exec::pump::{DrainPair, DrainReport};
use crate::types::ErrorCategory;

/// Successful outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub status: ExitStatus,
    /// Last category classified from the output; `Undefined` if none.
    pub category: ErrorCategory,
    pub stdout_bytes: u64,
    pub stderr_bytes: u64,
}

/// Everything that is still in flight for a started process.
#[derive(Debug)]
struct Running {
    child: Child,
    drains: DrainPair,
    stdin: Option<JoinHandle<io::Result<()>>>,
}

/// How long the drains may keep running once the process was killed.
const KILL_DRAIN_GRACE: Duration = Duration::from_secs(2);

/// How waiting for the process ended.
enum Waited {
    Exited(io::Result<ExitStatus>),
    Cancelled,
    TimedOut(Duration),
}

/// A started process.
///
/// Obtained from [`Command::run_executable_in_background`]. The process is
/// already running and both output streams are being drained when the
/// handle is returned. Call [`Execution::join`] exactly once to wait for
/// process exit plus both drains; a second call returns
/// [`ExecError::AlreadyCompleted`].
///
/// A configured timeout counts from launch, not from the call to `join`.
///
/// Dropping an unjoined handle kills the process.
///
/// [`Command::run_executable_in_background`]: crate::exec::Command::run_executable_in_background
#[derive(Debug)]
pub struct Execution {
    program: String,
    args: Vec<String>,
    pid: Option<u32>,
    shell: Option<String>,
    signal: CategorySignal,
    started: Instant,
    timeout: Option<Duration>,
    running: Option<Running>,
}

impl Execution {
    pub(crate) fn new(
        program: String,
        args: Vec<String>,
        child: Child,
        drains: DrainPair,
        stdin: Option<JoinHandle<io::Result<()>>>,
        signal: CategorySignal,
        timeout: Option<Duration>,
    ) -> Self {
        let pid = child.id();
        Self {
            program,
            args,
            pid,
            shell: None,
            signal,
            started: Instant::now(),
            timeout,
            running: Some(Running {
                child,
                drains,
                stdin,
            }),
        }
    }

    /// Mark this run as a script fed to `shell`; failures are then wrapped
    /// in [`ExecError::ShellScript`].
    pub(crate) fn in_shell(mut self, shell: &str) -> Self {
        self.shell = Some(shell.to_string());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// OS process id, as observed right after start.
    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    /// Category classified so far for this run.
    pub fn category(&self) -> ErrorCategory {
        self.signal.get()
    }

    pub fn is_completed(&self) -> bool {
        self.running.is_none()
    }

    /// Wait for process exit and both drains, then aggregate the result.
    pub async fn join(&mut self) -> Result<RunOutcome, ExecError> {
        self.join_until(std::future::pending()).await
    }

    /// Like [`join`](Self::join), but kill the process once `cancel`
    /// resolves first.
    ///
    /// A kill hits the child's whole process group. Both drains are then
    /// still awaited for a short while, so everything written before the
    /// kill reaches the sinks.
    pub async fn join_until<F>(&mut self, cancel: F) -> Result<RunOutcome, ExecError>
    where
        F: Future<Output = ()>,
    {
        let Some(running) = self.running.take() else {
            return Err(ExecError::AlreadyCompleted {
                program: self.program.clone(),
            });
        };
        self.finish(running, cancel).await.map_err(|e| match &self.shell {
            Some(shell) => ExecError::ShellScript {
                shell: shell.clone(),
                source: Box::new(e),
            },
            None => e,
        })
    }

    async fn finish<F>(&self, running: Running, cancel: F) -> Result<RunOutcome, ExecError>
    where
        F: Future<Output = ()>,
    {
        let Running {
            mut child,
            drains,
            stdin,
        } = running;

        let (started, timeout) = (self.started, self.timeout);
        let deadline = async move {
            match timeout {
                Some(d) => tokio::time::sleep_until(started + d).await,
                None => std::future::pending::<()>().await,
            }
        };

        let waited = tokio::select! {
            status = child.wait() => Waited::Exited(status),
            _ = cancel => Waited::Cancelled,
            _ = deadline => Waited::TimedOut(timeout.unwrap_or_default()),
        };

        let report = if matches!(waited, Waited::Exited(_)) {
            drains.join().await
        } else {
            info!(program = %self.program, pid = ?self.pid, "stopping process");
            self.kill_process_group();
            if let Err(e) = child.kill().await {
                warn!(program = %self.program, error = %e, "failed to kill process");
            }
            drains.join_within(KILL_DRAIN_GRACE).await
        };

        if let Some(stdin) = stdin {
            join_stdin(&self.program, stdin).await;
        }

        let category = self.signal.get();
        debug!(
            program = %self.program,
            stdout_bytes = report.stdout.bytes,
            stderr_bytes = report.stderr.bytes,
            category = %category,
            "process and drains completed"
        );

        self.aggregate(waited, report, category)
    }

    /// SIGKILL everything in the child's process group, which the child
    /// leads.
    #[cfg(unix)]
    fn kill_process_group(&self) {
        let Some(pgid) = self.pid.and_then(|pid| libc::pid_t::try_from(pid).ok()) else {
            return;
        };
        // SAFETY: kill(2) has no memory-safety preconditions.
        let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
        if rc != 0 {
            let e = io::Error::last_os_error();
            debug!(program = %self.program, pgid, error = %e, "signalling process group failed");
        }
    }

    #[cfg(not(unix))]
    fn kill_process_group(&self) {}

    fn aggregate(
        &self,
        waited: Waited,
        report: DrainReport,
        category: ErrorCategory,
    ) -> Result<RunOutcome, ExecError> {
        let status = match waited {
            Waited::Cancelled => {
                return Err(ExecError::Cancelled {
                    program: self.program.clone(),
                    category,
                });
            }
            Waited::TimedOut(timeout) => {
                return Err(ExecError::TimedOut {
                    program: self.program.clone(),
                    timeout,
                    category,
                });
            }
            Waited::Exited(status) => status,
        };

        if report.has_errors() {
            return Err(ExecError::StreamCopyFailure {
                program: self.program.clone(),
                args: self.args.clone(),
                status: status.as_ref().ok().copied(),
                category,
                source: CopyFailure {
                    stdout: report.stdout.error,
                    stderr: report.stderr.error,
                },
            });
        }

        let status = status.map_err(|source| ExecError::Wait {
            program: self.program.clone(),
            source,
        })?;

        info!(
            program = %self.program,
            exit_code = ?status.code(),
            success = status.success(),
            "process exited"
        );

        if !status.success() {
            return Err(ExecError::NonZeroExit {
                program: self.program.clone(),
                args: self.args.clone(),
                status,
                category,
            });
        }

        Ok(RunOutcome {
            status,
            category,
            stdout_bytes: report.stdout.bytes,
            stderr_bytes: report.stderr.bytes,
        })
    }
}

/// Stdin feeding only fails the run through the exit status; a process that
/// never reads its input is not an error.
async fn join_stdin(program: &str, stdin: JoinHandle<io::Result<()>>) {
    match stdin.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {
            debug!(program = %program, "process closed stdin before reading all input");
        }
        Ok(Err(e)) => warn!(program = %program, error = %e, "writing stdin failed"),
        Err(e) => warn!(program = %program, error = %e, "stdin task did not complete"),
    }
}

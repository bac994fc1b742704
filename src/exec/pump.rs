// src/exec/pump.rs

//! Parallel copy of two streams into two sinks, with a join barrier.
//!
//! [`spawn_drains`] starts exactly two Tokio tasks, one per stream. Each task
//! copies its reader to its sink until end-of-stream, line by line. Byte
//! order within a stream is preserved; across streams only whole lines are
//! interleaved, never parts of them.
//!
//! [`DrainPair::join`] waits for both tasks and reports bytes copied and the
//! first error seen, independently for each stream.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::exec::classifier::Classifier;
use crate::exec::sink::Sink;
use crate::types::StreamKind;

const READ_CHUNK_BYTES: usize = 8 * 1024;

/// A partial line longer than this is forwarded without waiting for its
/// newline.
pub const MAX_PENDING_LINE_BYTES: usize = 64 * 1024;

/// Outcome of draining one stream.
#[derive(Debug, Default)]
pub struct StreamReport {
    /// Bytes read from the stream (all of them reached the sink unless
    /// `error` is set).
    pub bytes: u64,
    pub error: Option<io::Error>,
}

/// Outcome of draining both streams.
#[derive(Debug, Default)]
pub struct DrainReport {
    pub stdout: StreamReport,
    pub stderr: StreamReport,
}

impl DrainReport {
    pub fn has_errors(&self) -> bool {
        self.stdout.error.is_some() || self.stderr.error.is_some()
    }
}

/// The two running drain tasks of a process.
#[derive(Debug)]
pub struct DrainPair {
    stdout: JoinHandle<StreamReport>,
    stderr: JoinHandle<StreamReport>,
}

impl DrainPair {
    /// Barrier: resolves once both streams reached end-of-stream (or failed).
    pub async fn join(self) -> DrainReport {
        let (stdout, stderr) = tokio::join!(self.stdout, self.stderr);
        DrainReport {
            stdout: flatten(StreamKind::Stdout, stdout),
            stderr: flatten(StreamKind::Stderr, stderr),
        }
    }

    /// Like [`join`](Self::join), but give up after `grace`.
    ///
    /// Used once the process was killed: anything still holding the pipes
    /// open (a descendant that left the process group) would otherwise keep
    /// the drains alive indefinitely. Drains still running at the deadline
    /// are aborted and reported as failed.
    pub async fn join_within(mut self, grace: Duration) -> DrainReport {
        let deadline = tokio::time::sleep(grace);
        tokio::pin!(deadline);

        let mut stdout = None;
        let mut stderr = None;
        while stdout.is_none() || stderr.is_none() {
            tokio::select! {
                res = &mut self.stdout, if stdout.is_none() => {
                    stdout = Some(flatten(StreamKind::Stdout, res));
                }
                res = &mut self.stderr, if stderr.is_none() => {
                    stderr = Some(flatten(StreamKind::Stderr, res));
                }
                _ = &mut deadline => break,
            }
        }

        DrainReport {
            stdout: stdout.unwrap_or_else(|| abandon(StreamKind::Stdout, &self.stdout, grace)),
            stderr: stderr.unwrap_or_else(|| abandon(StreamKind::Stderr, &self.stderr, grace)),
        }
    }
}

fn abandon(stream: StreamKind, handle: &JoinHandle<StreamReport>, grace: Duration) -> StreamReport {
    warn!(%stream, grace = ?grace, "pipe still open after process was stopped; abandoning drain");
    handle.abort();
    StreamReport {
        bytes: 0,
        error: Some(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("{stream} still open after the process was stopped"),
        )),
    }
}

fn flatten(
    stream: StreamKind,
    res: Result<StreamReport, tokio::task::JoinError>,
) -> StreamReport {
    res.unwrap_or_else(|e| {
        warn!(%stream, error = %e, "drain task did not complete");
        StreamReport {
            bytes: 0,
            error: Some(io::Error::other(format!("{stream} drain task failed: {e}"))),
        }
    })
}

/// Spawn the two drain tasks.
///
/// `classifier`, when present, observes every line of both streams.
pub fn spawn_drains<O, E>(
    stdout: O,
    stderr: E,
    stdout_sink: Sink,
    stderr_sink: Sink,
    classifier: Option<Classifier>,
) -> DrainPair
where
    O: AsyncRead + Send + Unpin + 'static,
    E: AsyncRead + Send + Unpin + 'static,
{
    let out_classifier = classifier.clone();
    let stdout = tokio::spawn(async move {
        drain_stream(StreamKind::Stdout, stdout, stdout_sink, out_classifier).await
    });
    let stderr = tokio::spawn(async move {
        drain_stream(StreamKind::Stderr, stderr, stderr_sink, classifier).await
    });

    DrainPair { stdout, stderr }
}

/// Copy `reader` into `sink` until end-of-stream.
///
/// Output is forwarded one complete line at a time. A partial line is held
/// back until its newline arrives, the stream ends, or it grows past
/// [`MAX_PENDING_LINE_BYTES`].
///
/// A failed sink write is recorded and the stream keeps being read (and
/// discarded), so the writing process never stalls on a full pipe. A read
/// error ends the copy.
pub async fn drain_stream<R>(
    stream: StreamKind,
    mut reader: R,
    sink: Sink,
    classifier: Option<Classifier>,
) -> StreamReport
where
    R: AsyncRead + Unpin,
{
    let mut drain = Drain {
        stream,
        sink,
        classifier,
        report: StreamReport::default(),
    };
    let mut buf = vec![0u8; READ_CHUNK_BYTES];
    let mut pending: Vec<u8> = Vec::new();

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(%stream, error = %e, "reading from pipe failed");
                if drain.report.error.is_none() {
                    drain.report.error = Some(e);
                }
                break;
            }
        };
        drain.report.bytes += n as u64;
        pending.extend_from_slice(&buf[..n]);

        let mut start = 0;
        while let Some(pos) = pending[start..].iter().position(|&b| b == b'\n') {
            let end = start + pos + 1;
            drain.emit(&pending[start..end]).await;
            start = end;
        }
        pending.drain(..start);

        if pending.len() >= MAX_PENDING_LINE_BYTES {
            drain.emit(&pending).await;
            pending.clear();
        }
    }

    if !pending.is_empty() {
        drain.emit(&pending).await;
    }

    let report = drain.report;
    debug!(%stream, bytes = report.bytes, failed = report.error.is_some(), "drain finished");
    report
}

struct Drain {
    stream: StreamKind,
    sink: Sink,
    classifier: Option<Classifier>,
    report: StreamReport,
}

impl Drain {
    async fn emit(&mut self, line: &[u8]) {
        if self.report.error.is_none() {
            if let Err(e) = self.sink.write_chunk(line).await {
                warn!(stream = %self.stream, error = %e, "writing to sink failed; discarding rest of stream");
                self.report.error = Some(e);
            }
        }
        if let Some(classifier) = &self.classifier {
            classifier.observe_line(line);
        }
    }
}

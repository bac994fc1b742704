// src/exec/sink.rs

//! Writable destinations for child process output.

use std::fmt;
use std::io;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncWrite, AsyncWriteExt};

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Where a drained stream is written to.
///
/// A `Sink` is a cheap, cloneable handle so the same configuration can be
/// reused across runs, and the same sink can be given for both streams.
/// Every chunk is written under the sink's own lock; chunks coming from
/// different streams are therefore never interleaved with each other.
#[derive(Clone)]
pub enum Sink {
    /// The process-wide standard output of this process.
    Stdout,
    /// The process-wide standard error of this process.
    Stderr,
    /// In-memory capture.
    Buffer(SharedBuffer),
    /// Any async writer supplied by the caller.
    Writer(Arc<tokio::sync::Mutex<BoxedWriter>>),
}

impl Sink {
    pub fn from_writer<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Sink::Writer(Arc::new(tokio::sync::Mutex::new(Box::new(writer))))
    }

    /// Convenience: a fresh in-memory sink plus the buffer to read it back.
    pub fn buffer() -> (Self, SharedBuffer) {
        let buf = SharedBuffer::new();
        (Sink::Buffer(buf.clone()), buf)
    }

    /// Write one chunk and flush it.
    pub async fn write_chunk(&self, bytes: &[u8]) -> io::Result<()> {
        match self {
            Sink::Stdout => {
                let mut out = tokio::io::stdout();
                out.write_all(bytes).await?;
                out.flush().await
            }
            Sink::Stderr => {
                let mut err = tokio::io::stderr();
                err.write_all(bytes).await?;
                err.flush().await
            }
            Sink::Buffer(buf) => {
                buf.append(bytes);
                Ok(())
            }
            Sink::Writer(writer) => {
                let mut w = writer.lock().await;
                w.write_all(bytes).await?;
                w.flush().await
            }
        }
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sink::Stdout => f.write_str("Sink::Stdout"),
            Sink::Stderr => f.write_str("Sink::Stderr"),
            Sink::Buffer(buf) => f.debug_tuple("Sink::Buffer").field(&buf.len()).finish(),
            Sink::Writer(_) => f.write_str("Sink::Writer(..)"),
        }
    }
}

/// Growable byte buffer shared between a sink and whoever reads it back.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, bytes: &[u8]) {
        self.lock().extend_from_slice(bytes);
    }

    pub fn contents(&self) -> Vec<u8> {
        self.lock().clone()
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<u8>> {
        // A panic while appending leaves a valid Vec behind.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

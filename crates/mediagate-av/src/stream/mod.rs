//! Uniform streaming handles.
//!
//! A [`StreamHandle`] wraps exactly one [`StreamSource`]: a file on disk, the
//! in-memory output of a metadata handler, or the stdout pipe of a transcoder.
//! The handle enforces the open/closed state machine so sources only deal
//! with the I/O itself:
//!
//! - `open` on an open handle is an error; write mode is rejected before the
//!   source is touched.
//! - `read`, `seek` and `tell` require an open handle.
//! - `close` on a closed handle is a no-op, so cleanup paths may call it
//!   unconditionally.
//! - Dropping an open handle aborts the source (kills a transcoder).

mod file;
mod memory;
mod pipe;

pub use file::{stat_file, FileSource};
pub use memory::MemorySource;
pub use pipe::PipeSource;

use std::io::SeekFrom;

use async_trait::async_trait;
use mediagate_core::{Error, OpenMode, Result};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Copy buffer size used by [`StreamHandle::copy_to`].
const COPY_BUF_SIZE: usize = 64 * 1024;

/// What backs a stream handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    File,
    Memory,
    Pipe,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Memory => write!(f, "memory"),
            Self::Pipe => write!(f, "pipe"),
        }
    }
}

/// Length announced to the transport before streaming starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredLength {
    Known(u64),
    /// Sent with chunked transfer encoding.
    Chunked,
    /// No length; the stream runs until EOF.
    Unknown,
}

impl DeclaredLength {
    pub fn known(self) -> Option<u64> {
        match self {
            Self::Known(n) => Some(n),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeclaredLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Known(n) => write!(f, "{n}"),
            Self::Chunked => write!(f, "chunked"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Backing I/O of a [`StreamHandle`].
///
/// Implementations may assume the handle serializes calls: `open` is only
/// called while closed, everything else only while open.
#[async_trait]
pub trait StreamSource: Send {
    fn kind(&self) -> SourceKind;

    /// Short description for logs and errors.
    fn describe(&self) -> String;

    async fn open(&mut self) -> Result<()>;

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    async fn seek(&mut self, pos: SeekFrom) -> Result<u64>;

    async fn tell(&mut self) -> Result<u64>;

    async fn close(&mut self) -> Result<()>;

    /// Synchronous best-effort release, used when an open handle is dropped.
    fn abort(&mut self) {}

    /// OS process id, for sources backed by a child process.
    fn process_id(&self) -> Option<u32> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandleState {
    Closed,
    Open,
}

/// Scoped streaming resource over any [`StreamSource`].
pub struct StreamHandle {
    source: Box<dyn StreamSource>,
    state: HandleState,
}

impl StreamHandle {
    pub fn new(source: impl StreamSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            state: HandleState::Closed,
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.source.kind()
    }

    pub fn describe(&self) -> String {
        self.source.describe()
    }

    pub fn is_open(&self) -> bool {
        self.state == HandleState::Open
    }

    pub fn process_id(&self) -> Option<u32> {
        self.source.process_id()
    }

    /// Open the underlying source.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedWriteMode`] for [`OpenMode::Write`], checked
    ///   before anything else.
    /// - [`Error::HandleState`] if the handle is already open.
    pub async fn open(&mut self, mode: OpenMode) -> Result<()> {
        mode.ensure_read()?;
        if self.is_open() {
            return Err(Error::handle_state(self.describe(), "already open"));
        }
        self.source.open().await?;
        self.state = HandleState::Open;
        tracing::trace!(source = %self.describe(), "stream opened");
        Ok(())
    }

    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.ensure_open("read")?;
        self.source.read(buf).await
    }

    pub async fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.ensure_open("seek")?;
        self.source.seek(pos).await
    }

    pub async fn tell(&mut self) -> Result<u64> {
        self.ensure_open("tell")?;
        self.source.tell().await
    }

    /// Close the source. A no-op on a closed handle.
    ///
    /// The handle counts as closed afterwards even if the source reported an
    /// error while releasing.
    pub async fn close(&mut self) -> Result<()> {
        if !self.is_open() {
            return Ok(());
        }
        self.state = HandleState::Closed;
        let result = self.source.close().await;
        tracing::trace!(source = %self.describe(), ok = result.is_ok(), "stream closed");
        result
    }

    /// Determine the length by opening, seeking to the end, and reading the
    /// position. The handle is closed again on every path.
    pub async fn probe_length(&mut self) -> Result<u64> {
        self.open(OpenMode::Read).await?;
        let probed = match self.seek(SeekFrom::End(0)).await {
            Ok(_) => self.tell().await,
            Err(e) => Err(e),
        };
        let closed = self.close().await;
        let len = probed?;
        closed?;
        Ok(len)
    }

    /// Copy everything that is left in the stream into `writer`.
    pub async fn copy_to<W>(&mut self, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let mut buf = vec![0u8; COPY_BUF_SIZE];
        let mut total = 0u64;
        loop {
            let n = self.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            writer.write_all(&buf[..n]).await?;
            total += n as u64;
        }
        writer.flush().await?;
        Ok(total)
    }

    fn ensure_open(&self, op: &str) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(Error::handle_state(
                self.describe(),
                format!("{op} on a closed handle"),
            ))
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("source", &self.source.describe())
            .field("state", &self.state)
            .finish()
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        if self.is_open() {
            tracing::debug!(source = %self.source.describe(), "stream dropped while open; aborting");
            self.source.abort();
        }
    }
}

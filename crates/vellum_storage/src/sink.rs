//! Write handles for resources.

use async_trait::async_trait;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use vellum_error::{StorageError, StorageErrorKind, VellumResult};

/// Backend half of a [`ContentSink`].
///
/// Bytes written to the target are staged; [`commit`](SinkTarget::commit)
/// makes them the content of the resource. A target dropped without
/// committing must leave the resource as it was.
#[async_trait]
pub trait SinkTarget: AsyncWrite + Send + Unpin {
    /// Publish the staged bytes.
    async fn commit(&mut self) -> VellumResult<()>;
}

/// Byte sink replacing the content of one resource.
///
/// Writes are staged until [`finish`](ContentSink::finish) succeeds.
/// Dropping an unfinished sink (including when the task writing to it is
/// cancelled) releases the handle and abandons the write.
pub struct ContentSink {
    description: String,
    target: Box<dyn SinkTarget>,
    written: u64,
    finished: bool,
}

impl ContentSink {
    /// Wrap a backend target.
    pub fn new(description: impl Into<String>, target: Box<dyn SinkTarget>) -> Self {
        Self {
            description: description.into(),
            target,
            written: 0,
            finished: false,
        }
    }

    /// Bytes accepted so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Flush and publish the written bytes.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Fails with [`StorageErrorKind::FileWrite`] if flushing fails, or with
    /// the backend's error if publishing fails. The write is abandoned in
    /// both cases.
    pub async fn finish(mut self) -> VellumResult<u64> {
        self.target.shutdown().await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                self.description, e
            )))
        })?;
        self.target.commit().await?;
        self.finished = true;

        tracing::debug!(
            location = %self.description,
            bytes = self.written,
            "Committed content"
        );
        Ok(self.written)
    }
}

impl Drop for ContentSink {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!(
                location = %self.description,
                bytes = self.written,
                "Abandoning unfinished write"
            );
        }
    }
}

impl std::fmt::Debug for ContentSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentSink")
            .field("description", &self.description)
            .field("written", &self.written)
            .field("finished", &self.finished)
            .finish()
    }
}

impl AsyncWrite for ContentSink {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.target).poll_write(cx, buf);
        if let Poll::Ready(Ok(n)) = &poll {
            this.written += *n as u64;
        }
        poll
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().target).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().target).poll_shutdown(cx)
    }
}

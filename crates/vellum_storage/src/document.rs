//! Document-store content backend.
//!
//! Document stores (GridFS-style buckets) keep content as immutable
//! documents. Each upload creates a new document with its own id; the key
//! only names it. Overwriting a key therefore means deleting every document
//! filed under it and inserting a new one. Skipping the delete leaves a
//! duplicate that is never addressable again.

use crate::{
    BackendKind, ContentSink, ContentStream, ReplacePolicy, Resource, ResourceCapabilities,
    ResourceResolver, SinkTarget,
};
use async_trait::async_trait;
use derive_getters::Getters;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::AsyncWrite;
use uuid::Uuid;
use vellum_error::{StorageError, StorageErrorKind, VellumResult};

/// Identifier a document store assigns to one stored document.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display,
)]
#[display("{}", _0)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Allocate a fresh document id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

/// Descriptor of a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct DocumentInfo {
    /// Store-assigned document id
    id: DocumentId,
    /// Name the document is filed under (the content key)
    filename: String,
    /// Content length in bytes
    length: u64,
    /// Upload sequence number; later uploads have larger revisions
    revision: u64,
}

impl DocumentInfo {
    /// Create a descriptor.
    pub fn new(id: DocumentId, filename: impl Into<String>, length: u64, revision: u64) -> Self {
        Self {
            id,
            filename: filename.into(),
            length,
            revision,
        }
    }
}

/// Driver boundary for a document store bucket.
///
/// Mirrors what GridFS-style clients offer: lookup by filename, download
/// and delete by document id, upload creating a new document. Uploading
/// under a filename that is already taken creates a second document.
///
/// Transfers are whole-document: `upload` receives the complete content and
/// `download` returns it, so a document must fit in memory. The store still
/// copies in chunks, but on this backend the chunks accumulate in the upload
/// buffer until commit.
#[async_trait]
pub trait DocumentBucket: Send + Sync {
    /// Bucket name.
    fn name(&self) -> &str;

    /// Most recent document filed under `filename`.
    async fn find(&self, filename: &str) -> VellumResult<Option<DocumentInfo>>;

    /// Every document filed under `filename`, oldest first.
    async fn find_all(&self, filename: &str) -> VellumResult<Vec<DocumentInfo>>;

    /// Full content of a document.
    async fn download(&self, id: DocumentId) -> VellumResult<Vec<u8>>;

    /// Store a new document.
    async fn upload(&self, filename: &str, content: Vec<u8>) -> VellumResult<DocumentInfo>;

    /// Remove a document. Returns `false` if it did not exist.
    async fn delete(&self, id: DocumentId) -> VellumResult<bool>;
}

/// Resolver over a document store bucket.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use vellum_storage::{DocumentStoreResolver, MemoryBucket, ReplacePolicy, ResourceResolver};
///
/// let resolver = DocumentStoreResolver::new(Arc::new(MemoryBucket::new("claims")));
/// assert_eq!(resolver.replace_policy(), ReplacePolicy::DeleteBeforeWrite);
/// ```
#[derive(Clone)]
pub struct DocumentStoreResolver {
    bucket: Arc<dyn DocumentBucket>,
}

impl DocumentStoreResolver {
    /// Create a resolver over `bucket`.
    pub fn new(bucket: Arc<dyn DocumentBucket>) -> Self {
        tracing::info!(bucket = bucket.name(), "Created document store resolver");
        Self { bucket }
    }
}

impl std::fmt::Debug for DocumentStoreResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStoreResolver")
            .field("bucket", &self.bucket.name())
            .finish()
    }
}

#[async_trait]
impl ResourceResolver for DocumentStoreResolver {
    fn backend(&self) -> BackendKind {
        BackendKind::Document
    }

    fn replace_policy(&self) -> ReplacePolicy {
        ReplacePolicy::DeleteBeforeWrite
    }

    async fn resolve(&self, key: &str) -> VellumResult<Arc<dyn Resource>> {
        Ok(Arc::new(DocumentResource {
            key: key.to_string(),
            bucket: Arc::clone(&self.bucket),
        }))
    }
}

/// Content filed under one key in a document bucket.
#[derive(Clone)]
pub struct DocumentResource {
    key: String,
    bucket: Arc<dyn DocumentBucket>,
}

impl std::fmt::Debug for DocumentResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentResource")
            .field("bucket", &self.bucket.name())
            .field("key", &self.key)
            .finish()
    }
}

impl DocumentResource {
    async fn current(&self) -> VellumResult<DocumentInfo> {
        self.bucket
            .find(&self.key)
            .await?
            .ok_or_else(|| StorageError::new(StorageErrorKind::NotFound(self.description())).into())
    }
}

/// Delete every document filed under `key`. Returns how many were removed.
async fn purge(bucket: &dyn DocumentBucket, key: &str) -> VellumResult<usize> {
    let mut removed = 0;
    for document in bucket.find_all(key).await? {
        if bucket.delete(document.id).await? {
            removed += 1;
        }
    }
    Ok(removed)
}

#[async_trait]
impl Resource for DocumentResource {
    fn key(&self) -> &str {
        &self.key
    }

    fn description(&self) -> String {
        format!("{}/{}", self.bucket.name(), self.key)
    }

    fn capabilities(&self) -> ResourceCapabilities {
        ResourceCapabilities::READ_WRITE
    }

    #[tracing::instrument(skip(self), fields(bucket = self.bucket.name(), key = %self.key))]
    async fn exists(&self) -> VellumResult<bool> {
        Ok(self.bucket.find(&self.key).await?.is_some())
    }

    #[tracing::instrument(skip(self), fields(bucket = self.bucket.name(), key = %self.key))]
    async fn content_length(&self) -> VellumResult<u64> {
        Ok(self.current().await?.length)
    }

    #[tracing::instrument(skip(self), fields(bucket = self.bucket.name(), key = %self.key))]
    async fn open_read(&self) -> VellumResult<ContentStream> {
        let document = self.current().await?;
        let content = self.bucket.download(document.id).await?;

        tracing::debug!(document = %document.id, size = content.len(), "Downloaded document");
        Ok(Box::new(io::Cursor::new(content)))
    }

    #[tracing::instrument(skip(self), fields(bucket = self.bucket.name(), key = %self.key))]
    async fn open_write(&self) -> VellumResult<ContentSink> {
        Ok(ContentSink::new(
            self.description(),
            Box::new(DocumentUpload {
                bucket: Arc::clone(&self.bucket),
                key: self.key.clone(),
                buffer: Vec::new(),
            }),
        ))
    }

    #[tracing::instrument(skip(self), fields(bucket = self.bucket.name(), key = %self.key))]
    async fn delete(&self) -> VellumResult<bool> {
        let removed = purge(self.bucket.as_ref(), &self.key).await?;
        if removed > 0 {
            tracing::info!(removed, "Deleted documents");
        }
        Ok(removed > 0)
    }
}

/// Upload buffered until commit.
///
/// Nothing reaches the bucket before commit, and the whole content is held
/// in memory until then.
///
/// Commit deletes whatever is filed under the key, then inserts the new
/// document, so a direct write never leaves two documents behind.
struct DocumentUpload {
    bucket: Arc<dyn DocumentBucket>,
    key: String,
    buffer: Vec<u8>,
}

#[async_trait]
impl SinkTarget for DocumentUpload {
    async fn commit(&mut self) -> VellumResult<()> {
        let replaced = purge(self.bucket.as_ref(), &self.key).await?;
        let content = std::mem::take(&mut self.buffer);
        let document = self.bucket.upload(&self.key, content).await?;

        tracing::info!(
            bucket = self.bucket.name(),
            key = %self.key,
            document = %document.id,
            size = document.length,
            replaced,
            "Stored document"
        );
        Ok(())
    }
}

impl AsyncWrite for DocumentUpload {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.get_mut().buffer.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

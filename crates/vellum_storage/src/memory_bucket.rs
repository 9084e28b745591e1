//! In-process document bucket.

use crate::{DocumentBucket, DocumentId, DocumentInfo};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use vellum_error::{StorageError, StorageErrorKind, VellumResult};

/// Default chunk size, matching GridFS.
const DEFAULT_CHUNK_SIZE: usize = 255 * 1024;

#[derive(Debug)]
struct StoredDocument {
    info: DocumentInfo,
    chunks: Vec<Vec<u8>>,
}

/// Document bucket held in memory.
///
/// Behaves like a GridFS bucket: documents are immutable, split into
/// fixed-size chunks, and several documents may share a filename.
///
/// # Example
///
/// ```rust
/// use vellum_storage::{DocumentBucket, MemoryBucket};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let bucket = MemoryBucket::new("claims");
/// bucket.upload("form-1", b"v1".to_vec()).await?;
/// bucket.upload("form-1", b"v2".to_vec()).await?;
///
/// // Two documents, the newest wins lookups
/// assert_eq!(bucket.find_all("form-1").await?.len(), 2);
/// let latest = bucket.find("form-1").await?.unwrap();
/// assert_eq!(bucket.download(*latest.id()).await?, b"v2");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MemoryBucket {
    name: String,
    chunk_size: usize,
    documents: RwLock<HashMap<DocumentId, StoredDocument>>,
    revision: AtomicU64,
}

impl MemoryBucket {
    /// Create an empty bucket with the default chunk size.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_chunk_size(name, DEFAULT_CHUNK_SIZE)
    }

    /// Create an empty bucket splitting documents into `chunk_size` chunks.
    ///
    /// A zero chunk size is treated as one byte.
    pub fn with_chunk_size(name: impl Into<String>, chunk_size: usize) -> Self {
        Self {
            name: name.into(),
            chunk_size: chunk_size.max(1),
            documents: RwLock::new(HashMap::new()),
            revision: AtomicU64::new(0),
        }
    }

    /// Number of documents in the bucket.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Whether the bucket holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentBucket for MemoryBucket {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&self, filename: &str) -> VellumResult<Option<DocumentInfo>> {
        let documents = self.documents.read().await;
        Ok(documents
            .values()
            .filter(|document| document.info.filename() == filename)
            .max_by_key(|document| *document.info.revision())
            .map(|document| document.info.clone()))
    }

    async fn find_all(&self, filename: &str) -> VellumResult<Vec<DocumentInfo>> {
        let documents = self.documents.read().await;
        let mut matching: Vec<DocumentInfo> = documents
            .values()
            .filter(|document| document.info.filename() == filename)
            .map(|document| document.info.clone())
            .collect();
        matching.sort_by_key(|info| *info.revision());
        Ok(matching)
    }

    async fn download(&self, id: DocumentId) -> VellumResult<Vec<u8>> {
        let documents = self.documents.read().await;
        let document = documents.get(&id).ok_or_else(|| {
            StorageError::new(StorageErrorKind::NotFound(format!("{}/{}", self.name, id)))
        })?;
        Ok(document.chunks.concat())
    }

    #[tracing::instrument(skip(self, content), fields(bucket = %self.name, size = content.len()))]
    async fn upload(&self, filename: &str, content: Vec<u8>) -> VellumResult<DocumentInfo> {
        let id = DocumentId::new();
        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        let info = DocumentInfo::new(id, filename, content.len() as u64, revision);
        let chunks = content
            .chunks(self.chunk_size)
            .map(<[u8]>::to_vec)
            .collect();

        self.documents.write().await.insert(
            id,
            StoredDocument {
                info: info.clone(),
                chunks,
            },
        );

        tracing::debug!(document = %id, revision, "Inserted document");
        Ok(info)
    }

    async fn delete(&self, id: DocumentId) -> VellumResult<bool> {
        let removed = self.documents.write().await.remove(&id).is_some();
        tracing::debug!(document = %id, removed, "Deleted document");
        Ok(removed)
    }
}

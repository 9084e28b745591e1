//! Resource and resolver traits.

use crate::ContentSink;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::AsyncRead;
use vellum_error::{StorageError, StorageErrorKind, VellumResult};

/// Readable content stream handed out by a resource.
pub type ContentStream = Box<dyn AsyncRead + Send + Unpin>;

/// Kind of storage backend behind a resolver.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::EnumIter,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Hierarchical filesystem
    #[default]
    #[display("filesystem")]
    Filesystem,
    /// Immutable-document blob store
    #[display("document")]
    Document,
}

impl BackendKind {
    /// Convert to string representation for configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Filesystem => "filesystem",
            BackendKind::Document => "document",
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "filesystem" => Ok(BackendKind::Filesystem),
            "document" => Ok(BackendKind::Document),
            _ => Err(format!("Unknown backend: {}", s)),
        }
    }
}

/// How a backend replaces content that already exists under a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ReplacePolicy {
    /// Writes overwrite the existing bytes at the same location
    #[display("in-place")]
    InPlace,
    /// Content is immutable per document; the old one must be removed first
    #[display("delete-before-write")]
    DeleteBeforeWrite,
}

/// Operations a resource supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceCapabilities {
    /// Content can be opened for writing
    pub writable: bool,
    /// Content can be deleted
    pub deletable: bool,
    /// Locations are nested in parent containers that may need creating
    pub hierarchical: bool,
}

impl ResourceCapabilities {
    /// Read-only access.
    pub const READ_ONLY: Self = Self {
        writable: false,
        deletable: false,
        hierarchical: false,
    };

    /// Writable and deletable, flat key space.
    pub const READ_WRITE: Self = Self {
        writable: true,
        deletable: true,
        hierarchical: false,
    };

    /// Same capabilities with nested locations.
    pub const fn hierarchical(self) -> Self {
        Self {
            hierarchical: true,
            ..self
        }
    }
}

/// Handle to one content location in a backend.
///
/// A resource may not exist yet. Not every resource supports every
/// operation: check [`capabilities`](Resource::capabilities) before writing
/// or deleting; the default implementations fail with
/// [`StorageErrorKind::Unsupported`].
#[async_trait]
pub trait Resource: Send + Sync + std::fmt::Debug {
    /// Backend key this resource was resolved from.
    fn key(&self) -> &str;

    /// Human-readable location for logs and errors.
    fn description(&self) -> String;

    /// Supported operations.
    fn capabilities(&self) -> ResourceCapabilities;

    /// Check whether content exists at this location.
    async fn exists(&self) -> VellumResult<bool>;

    /// Length of the stored content in bytes.
    ///
    /// # Errors
    ///
    /// Fails with [`StorageErrorKind::NotFound`] when no content exists.
    async fn content_length(&self) -> VellumResult<u64>;

    /// Open the content for reading.
    ///
    /// # Errors
    ///
    /// Fails with [`StorageErrorKind::NotFound`] when no content exists.
    async fn open_read(&self) -> VellumResult<ContentStream>;

    /// Open a sink replacing the content at this location.
    ///
    /// The new content becomes visible once [`ContentSink::finish`] succeeds.
    async fn open_write(&self) -> VellumResult<ContentSink> {
        Err(StorageError::new(StorageErrorKind::Unsupported(format!(
            "{} is not writable",
            self.description()
        )))
        .into())
    }

    /// Delete the content. Returns `false` when there was nothing to delete.
    async fn delete(&self) -> VellumResult<bool> {
        Err(StorageError::new(StorageErrorKind::Unsupported(format!(
            "{} is not deletable",
            self.description()
        )))
        .into())
    }

    /// Create the parent container of this location if it is missing.
    ///
    /// A no-op for flat backends.
    async fn ensure_parent(&self) -> VellumResult<()> {
        Ok(())
    }
}

/// Maps backend keys to resources.
///
/// One implementation per backend; the choice of resolver is the only point
/// where a backend is selected.
#[async_trait]
pub trait ResourceResolver: Send + Sync {
    /// Backend this resolver addresses.
    fn backend(&self) -> BackendKind;

    /// How existing content is replaced.
    fn replace_policy(&self) -> ReplacePolicy;

    /// Resolve a key to a resource handle. The resource may not exist.
    ///
    /// # Errors
    ///
    /// Fails with a [`ResolutionError`](vellum_error::ResolutionError) when
    /// the key is not addressable in this backend.
    async fn resolve(&self, key: &str) -> VellumResult<Arc<dyn Resource>>;
}

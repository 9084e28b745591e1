//! Filesystem content backend.
//!
//! Keys map to paths below a root directory. A `/` in a key nests the
//! content in subdirectories, which are created on first write.

use crate::{
    BackendKind, ContentSink, ContentStream, ReplacePolicy, Resource, ResourceCapabilities,
    ResourceResolver, SinkTarget,
};
use async_trait::async_trait;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::AsyncWrite;
use uuid::Uuid;
use vellum_error::{
    ResolutionError, ResolutionErrorKind, StorageError, StorageErrorKind, VellumResult,
};

/// Filesystem resource resolver.
///
/// Content for key `claims/2024/form-1` lives at `{root}/claims/2024/form-1`.
/// Writes are staged in a temporary file next to the target and renamed into
/// place when the sink finishes, so readers never observe a partial write.
///
/// # Example Structure
///
/// ```text
/// /var/vellum/content/
/// ├── 67e55044-10b1-426f-9247-bb680e5fe0c8
/// └── claims/
///     └── 2024/
///         └── form-1
/// ```
#[derive(Debug, Clone)]
pub struct FileSystemResolver {
    root: PathBuf,
    read_only: bool,
}

impl FileSystemResolver {
    /// Create a new filesystem resolver.
    ///
    /// Creates the root directory if it doesn't exist.
    ///
    /// # Arguments
    ///
    /// * `root` - Directory under which all content is stored
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or accessed.
    #[tracing::instrument(skip(root))]
    pub fn new(root: impl Into<PathBuf>) -> VellumResult<Self> {
        let root = root.into();

        std::fs::create_dir_all(&root).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                root.display(),
                e
            )))
        })?;

        tracing::info!(root = %root.display(), "Created filesystem resolver");
        Ok(Self {
            root,
            read_only: false,
        })
    }

    /// Serve existing content without allowing writes or deletes.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path for a key, rejecting keys that would escape the root.
    pub fn path_for(&self, key: &str) -> VellumResult<PathBuf> {
        let invalid = |reason: &str| {
            ResolutionError::new(ResolutionErrorKind::InvalidKey {
                key: key.to_string(),
                reason: reason.to_string(),
            })
        };

        if key.is_empty() {
            return Err(invalid("key is empty").into());
        }
        if key.ends_with('/') {
            return Err(invalid("key names a directory").into());
        }

        let relative = Path::new(key);
        for component in relative.components() {
            match component {
                Component::Normal(_) => {}
                Component::ParentDir => return Err(invalid("parent references are not allowed").into()),
                Component::CurDir => return Err(invalid("current directory references are not allowed").into()),
                Component::RootDir | Component::Prefix(_) => {
                    return Err(invalid("absolute keys are not allowed").into());
                }
            }
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ResourceResolver for FileSystemResolver {
    fn backend(&self) -> BackendKind {
        BackendKind::Filesystem
    }

    fn replace_policy(&self) -> ReplacePolicy {
        ReplacePolicy::InPlace
    }

    async fn resolve(&self, key: &str) -> VellumResult<Arc<dyn Resource>> {
        let path = self.path_for(key)?;
        Ok(Arc::new(FileResource {
            key: key.to_string(),
            path,
            read_only: self.read_only,
        }))
    }
}

/// A file below the resolver root.
#[derive(Debug, Clone)]
pub struct FileResource {
    key: String,
    path: PathBuf,
    read_only: bool,
}

impl FileResource {
    /// Absolute location of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unsupported(&self, operation: &str) -> StorageError {
        StorageError::new(StorageErrorKind::Unsupported(format!(
            "{} on read-only {}",
            operation,
            self.path.display()
        )))
    }

    async fn metadata(&self) -> VellumResult<Option<std::fs::Metadata>> {
        match tokio::fs::metadata(&self.path).await {
            Ok(metadata) if metadata.is_file() => Ok(Some(metadata)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::from_io(
                &self.path.display().to_string(),
                &e,
                StorageErrorKind::FileRead,
            )
            .into()),
        }
    }
}

#[async_trait]
impl Resource for FileResource {
    fn key(&self) -> &str {
        &self.key
    }

    fn description(&self) -> String {
        self.path.display().to_string()
    }

    fn capabilities(&self) -> ResourceCapabilities {
        if self.read_only {
            ResourceCapabilities::READ_ONLY.hierarchical()
        } else {
            ResourceCapabilities::READ_WRITE.hierarchical()
        }
    }

    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    async fn exists(&self) -> VellumResult<bool> {
        Ok(self.metadata().await?.is_some())
    }

    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    async fn content_length(&self) -> VellumResult<u64> {
        self.metadata()
            .await?
            .map(|metadata| metadata.len())
            .ok_or_else(|| StorageError::new(StorageErrorKind::NotFound(self.description())).into())
    }

    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    async fn open_read(&self) -> VellumResult<ContentStream> {
        let file = tokio::fs::File::open(&self.path).await.map_err(|e| {
            StorageError::from_io(&self.description(), &e, StorageErrorKind::FileRead)
        })?;

        tracing::debug!("Opened content for reading");
        Ok(Box::new(file))
    }

    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    async fn open_write(&self) -> VellumResult<ContentSink> {
        if self.read_only {
            return Err(self.unsupported("write").into());
        }
        self.ensure_parent().await?;

        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let staged = self
            .path
            .with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()));

        let file = tokio::fs::File::create(&staged).await.map_err(|e| {
            StorageError::from_io(
                &staged.display().to_string(),
                &e,
                StorageErrorKind::FileWrite,
            )
        })?;

        tracing::debug!(staged = %staged.display(), "Opened staged file for writing");
        Ok(ContentSink::new(
            self.description(),
            Box::new(StagedFile {
                file,
                staged,
                target: self.path.clone(),
                committed: false,
            }),
        ))
    }

    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    async fn delete(&self) -> VellumResult<bool> {
        if self.read_only {
            return Err(self.unsupported("delete").into());
        }

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::info!("Deleted content file");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("Content file already absent");
                Ok(false)
            }
            Err(e) => Err(
                StorageError::from_io(&self.description(), &e, StorageErrorKind::Delete).into(),
            ),
        }
    }

    async fn ensure_parent(&self) -> VellumResult<()> {
        let Some(parent) = self.path.parent() else {
            return Ok(());
        };

        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                parent.display(),
                e
            )))
        })?;
        Ok(())
    }
}

/// Temporary file renamed over the target on commit.
struct StagedFile {
    file: tokio::fs::File,
    staged: PathBuf,
    target: PathBuf,
    committed: bool,
}

#[async_trait]
impl SinkTarget for StagedFile {
    async fn commit(&mut self) -> VellumResult<()> {
        self.file.sync_all().await.map_err(|e| {
            StorageError::from_io(
                &self.staged.display().to_string(),
                &e,
                StorageErrorKind::FileWrite,
            )
        })?;

        tokio::fs::rename(&self.staged, &self.target)
            .await
            .map_err(|e| {
                StorageError::new(StorageErrorKind::FileWrite(format!(
                    "rename {} to {}: {}",
                    self.staged.display(),
                    self.target.display(),
                    e
                )))
            })?;

        self.committed = true;
        tracing::info!(path = %self.target.display(), "Stored content file");
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            // Drop cannot await; this unlink blocks the executor thread briefly
            if let Err(e) = std::fs::remove_file(&self.staged) {
                tracing::debug!(
                    staged = %self.staged.display(),
                    error = %e,
                    "Could not remove abandoned staged file"
                );
            }
        }
    }
}

impl AsyncWrite for StagedFile {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().file).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().file).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().file).poll_shutdown(cx)
    }
}

//! Content store orchestration.

use crate::{ContentOperation, ContentReporter, KeyGuard, KeyLocks, TracingReporter};
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info};
use vellum_core::{ContentMetadata, IdentifierCodec};
use vellum_error::{
    BookkeepingError, ConfigError, StorageError, StorageErrorKind, VellumError, VellumResult,
};
use vellum_storage::{
    ContentSink, ContentStream, ReplacePolicy, Resource, ResourceResolver, VellumConfig,
};

const DEFAULT_COPY_CHUNK_SIZE: usize = 64 * 1024;

/// Attaches content to entities of type `E`.
///
/// The store is backend-agnostic: the resolver chosen at construction is the
/// only place a backend is selected.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use tokio::io::AsyncReadExt;
/// use vellum_core::{ContentFields, ContentMetadata, JsonRecord};
/// use vellum_storage::{DocumentStoreResolver, MemoryBucket};
/// use vellum_store::ContentStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let resolver = DocumentStoreResolver::new(Arc::new(MemoryBucket::new("claims")));
/// let store: ContentStore<JsonRecord> = ContentStore::new(Arc::new(resolver));
///
/// let mut claim = JsonRecord::empty(ContentFields::default());
/// store.set_content(&mut claim, &b"hello"[..]).await?;
/// assert_eq!(claim.content_length()?, 5);
///
/// let mut content = String::new();
/// if let Some(mut stream) = store.content(&claim).await? {
///     stream.read_to_string(&mut content).await?;
/// }
/// assert_eq!(content, "hello");
/// # Ok(())
/// # }
/// ```
pub struct ContentStore<E> {
    resolver: Arc<dyn ResourceResolver>,
    codec: IdentifierCodec,
    reporter: Arc<dyn ContentReporter>,
    locks: Option<Arc<KeyLocks>>,
    copy_chunk_size: usize,
    _entity: PhantomData<fn(&mut E)>,
}

impl<E> Clone for ContentStore<E> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            codec: self.codec.clone(),
            reporter: Arc::clone(&self.reporter),
            locks: self.locks.clone(),
            copy_chunk_size: self.copy_chunk_size,
            _entity: PhantomData,
        }
    }
}

impl<E> std::fmt::Debug for ContentStore<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStore")
            .field("backend", &self.resolver.backend())
            .field("codec", &self.codec)
            .field("serialize_writes", &self.locks.is_some())
            .field("copy_chunk_size", &self.copy_chunk_size)
            .finish()
    }
}

impl<E: ContentMetadata> ContentStore<E> {
    /// Create a store with default identifier codec and reporting.
    pub fn new(resolver: Arc<dyn ResourceResolver>) -> Self {
        Self {
            resolver,
            codec: IdentifierCodec::default(),
            reporter: Arc::new(TracingReporter),
            locks: None,
            copy_chunk_size: DEFAULT_COPY_CHUNK_SIZE,
            _entity: PhantomData,
        }
    }

    /// Creates a new store builder.
    pub fn builder() -> ContentStoreBuilder<E> {
        ContentStoreBuilder::default()
    }

    /// Create a store for the backend and behaviour described by `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or the backend cannot
    /// be initialised.
    pub fn from_config(config: &VellumConfig) -> VellumResult<Self> {
        Self::builder()
            .resolver(config.build_resolver()?)
            .serialize_writes(config.store.serialize_writes)
            .copy_chunk_size(config.store.copy_chunk_size)
            .build()
    }

    /// The resolver content is stored through.
    pub fn resolver(&self) -> &Arc<dyn ResourceResolver> {
        &self.resolver
    }

    /// Resolve the resource addressed by a content identifier.
    ///
    /// The resource may not exist.
    #[tracing::instrument(skip(self), fields(backend = %self.resolver.backend()))]
    pub async fn resource_for_id(&self, id: &E::Id) -> VellumResult<Arc<dyn Resource>> {
        let key = self.codec.to_backend_key(id)?;
        debug!(key = %key, "Resolving content key");
        self.resolver.resolve(&key).await
    }

    /// Resolve the resource for an entity, minting an identifier if it has
    /// none.
    ///
    /// A minted identifier is written back to the entity; the content length
    /// is left alone. Calling this again returns the same resource.
    #[tracing::instrument(skip(self, entity), fields(backend = %self.resolver.backend()))]
    pub async fn resource_for(&self, entity: &mut E) -> VellumResult<Arc<dyn Resource>> {
        let (id, _) = self.ensure_content_id(entity)?;
        self.resource_for_id(&id).await
    }

    /// Attach an entity to content that already exists under `id`.
    ///
    /// Once `id` resolves, the identifier is set whether or not content
    /// exists. If it does, the entity's length is taken from the backend. A
    /// failure to read the length is reported and leaves the length
    /// unchanged; it does not fail the call.
    ///
    /// # Errors
    ///
    /// Returns error if `id` cannot be resolved, leaving the entity
    /// untouched, or if the entity's metadata cannot be written.
    #[tracing::instrument(skip(self, entity), fields(backend = %self.resolver.backend()))]
    pub async fn associate(&self, entity: &mut E, id: E::Id) -> VellumResult<()> {
        let resource = self.resource_for_id(&id).await?;
        entity.set_content_id(Some(id))?;

        let length = match resource.exists().await {
            Ok(true) => resource.content_length().await.map(Some),
            Ok(false) => Ok(None),
            Err(e) => Err(e),
        };

        match length {
            Ok(Some(length)) => {
                entity.set_content_length(length)?;
                debug!(key = resource.key(), length, "Associated entity with content");
            }
            Ok(None) => {
                debug!(key = resource.key(), "Associated entity with absent content");
            }
            Err(e) => {
                self.reporter
                    .bookkeeping_failed(ContentOperation::Associate, resource.key(), &e);
            }
        }
        Ok(())
    }

    /// Detach an entity from its content without touching the backend.
    ///
    /// The identifier is cleared unless it is the entity's primary key; the
    /// length is always reset to zero.
    ///
    /// # Errors
    ///
    /// Returns error if the entity's metadata cannot be written.
    pub fn unassociate(&self, entity: &mut E) -> VellumResult<()> {
        let cleared = entity.clear_content_id()?;
        entity.set_content_length(0)?;
        debug!(identifier_cleared = cleared, "Unassociated entity");
        Ok(())
    }

    /// Replace the entity's content with everything read from `content`.
    ///
    /// Mints an identifier if needed, makes room according to the backend's
    /// replace policy, streams the bytes in chunks, then records the length
    /// the backend reports. Returns that length.
    ///
    /// # Errors
    ///
    /// - [`StorageError`] if the content could not be written; an identifier
    ///   minted by this call is removed again so the entity is unchanged
    /// - [`BookkeepingError`] if the content was written but the length
    ///   could not be read back or recorded
    #[tracing::instrument(
        skip(self, entity, content),
        fields(backend = %self.resolver.backend(), key = tracing::field::Empty)
    )]
    pub async fn set_content<R>(&self, entity: &mut E, mut content: R) -> VellumResult<u64>
    where
        R: AsyncRead + Unpin + Send,
    {
        let (id, generated) = self.ensure_content_id(entity)?;

        // Held until the length is recorded
        let (resource, bytes, _guard) = match self.write_content(&id, &mut content).await {
            Ok(written) => written,
            Err(e) => {
                if generated {
                    self.discard_generated_id(entity, &id);
                }
                return Err(e);
            }
        };

        let length = match resource.content_length().await {
            Ok(length) => length,
            Err(e) => return Err(self.stale_metadata(resource.key(), e)),
        };
        if let Err(e) = entity.set_content_length(length) {
            return Err(self.stale_metadata(resource.key(), e));
        }

        info!(bytes, length, "Set content");
        Ok(length)
    }

    /// Open the entity's content for reading.
    ///
    /// Returns `None` when the entity has no identifier (without consulting
    /// the backend) or no content exists for it. Never creates anything.
    #[tracing::instrument(skip(self, entity), fields(backend = %self.resolver.backend()))]
    pub async fn content(&self, entity: &E) -> VellumResult<Option<ContentStream>> {
        let Some(id) = entity.content_id()? else {
            debug!("Entity has no content identifier");
            return Ok(None);
        };

        let resource = self.resource_for_id(&id).await?;
        if !resource.exists().await? {
            debug!(key = resource.key(), "No content for entity");
            return Ok(None);
        }

        match resource.open_read().await {
            Ok(stream) => Ok(Some(stream)),
            // Deleted between the existence check and the open
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Delete the entity's content and reset its metadata.
    ///
    /// Does nothing for an entity without an identifier. Metadata is reset
    /// even when the content was already gone, so repeating the call is
    /// harmless. Content on a backend that does not allow deletion is left
    /// in place.
    ///
    /// # Errors
    ///
    /// Returns error if the delete fails; the entity is unchanged then.
    #[tracing::instrument(
        skip(self, entity),
        fields(backend = %self.resolver.backend(), key = tracing::field::Empty)
    )]
    pub async fn unset_content(&self, entity: &mut E) -> VellumResult<()> {
        let Some(id) = entity.content_id()? else {
            debug!("Entity has no content identifier");
            return Ok(());
        };

        let key = self.codec.to_backend_key(&id)?;
        tracing::Span::current().record("key", key.as_str());
        let _guard = self.lock(&key).await;

        let resource = self.resolver.resolve(&key).await?;
        if resource.exists().await? {
            if resource.capabilities().deletable {
                resource.delete().await?;
                info!("Deleted content");
            } else {
                debug!(location = %resource.description(), "Resource is not deletable, keeping content");
            }
        }

        self.unassociate(entity)
    }

    fn ensure_content_id(&self, entity: &mut E) -> VellumResult<(E::Id, bool)> {
        if let Some(id) = entity.content_id()? {
            return Ok((id, false));
        }

        let id: E::Id = self.codec.generate()?;
        entity.set_content_id(Some(id.clone()))?;
        debug!(id = %id, "Generated content identifier");
        Ok((id, true))
    }

    fn discard_generated_id(&self, entity: &mut E, id: &E::Id) {
        match entity.set_content_id(None) {
            Ok(()) => debug!(id = %id, "Discarded generated content identifier"),
            Err(e) => self.reporter.bookkeeping_failed(
                ContentOperation::SetContent,
                &id.to_string(),
                &e,
            ),
        }
    }

    fn stale_metadata(&self, key: &str, error: VellumError) -> VellumError {
        self.reporter
            .bookkeeping_failed(ContentOperation::SetContent, key, &error);
        BookkeepingError::new(key, error.to_string()).into()
    }

    async fn lock(&self, key: &str) -> Option<KeyGuard> {
        match &self.locks {
            Some(locks) => Some(locks.lock(key).await),
            None => None,
        }
    }

    /// Steps up to and including the committed write.
    ///
    /// Returns the key guard still held, so the caller can finish its
    /// bookkeeping before another writer gets the key.
    async fn write_content<R>(
        &self,
        id: &E::Id,
        content: &mut R,
    ) -> VellumResult<(Arc<dyn Resource>, u64, Option<KeyGuard>)>
    where
        R: AsyncRead + Unpin + Send,
    {
        let key = self.codec.to_backend_key(id)?;
        tracing::Span::current().record("key", key.as_str());
        let guard = self.lock(&key).await;

        let resource = self.resolver.resolve(&key).await?;
        let capabilities = resource.capabilities();
        if !capabilities.writable {
            return Err(StorageError::new(StorageErrorKind::Unsupported(format!(
                "{} is not writable",
                resource.description()
            )))
            .into());
        }

        let exists = resource.exists().await?;
        if !exists && capabilities.hierarchical {
            resource.ensure_parent().await?;
        }
        if exists && self.resolver.replace_policy() == ReplacePolicy::DeleteBeforeWrite {
            if !capabilities.deletable {
                return Err(StorageError::new(StorageErrorKind::Unsupported(format!(
                    "{} cannot be replaced without deleting it",
                    resource.description()
                )))
                .into());
            }
            resource.delete().await?;
            debug!("Deleted previous content before write");
        }

        let mut sink = resource.open_write().await?;
        let bytes = copy_chunked(content, &mut sink, self.copy_chunk_size).await?;
        sink.finish().await?;

        Ok((resource, bytes, guard))
    }
}

/// Copy `source` into `sink` one chunk at a time, yielding between chunks.
async fn copy_chunked<R>(
    source: &mut R,
    sink: &mut ContentSink,
    chunk_size: usize,
) -> VellumResult<u64>
where
    R: AsyncRead + Unpin + Send,
{
    let mut buffer = vec![0u8; chunk_size.max(1)];
    let mut copied = 0u64;

    loop {
        let read = source.read(&mut buffer).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!("content source: {}", e)))
        })?;
        if read == 0 {
            break;
        }

        sink.write_all(&buffer[..read]).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!("content sink: {}", e)))
        })?;
        copied += read as u64;

        tokio::task::yield_now().await;
    }

    Ok(copied)
}

/// Builder for [`ContentStore`].
pub struct ContentStoreBuilder<E> {
    resolver: Option<Arc<dyn ResourceResolver>>,
    codec: Option<IdentifierCodec>,
    reporter: Option<Arc<dyn ContentReporter>>,
    serialize_writes: bool,
    copy_chunk_size: Option<usize>,
    _entity: PhantomData<fn(&mut E)>,
}

impl<E> Default for ContentStoreBuilder<E> {
    fn default() -> Self {
        Self {
            resolver: None,
            codec: None,
            reporter: None,
            serialize_writes: false,
            copy_chunk_size: None,
            _entity: PhantomData,
        }
    }
}

impl<E: ContentMetadata> ContentStoreBuilder<E> {
    /// Sets the resolver selecting the backend.
    pub fn resolver(mut self, resolver: Arc<dyn ResourceResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Sets the identifier codec.
    pub fn codec(mut self, codec: IdentifierCodec) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Sets the bookkeeping reporter.
    pub fn reporter(mut self, reporter: Arc<dyn ContentReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Serialize writes and deletes per content key.
    pub fn serialize_writes(mut self, enabled: bool) -> Self {
        self.serialize_writes = enabled;
        self
    }

    /// Sets the number of bytes copied per chunk.
    pub fn copy_chunk_size(mut self, bytes: usize) -> Self {
        self.copy_chunk_size = Some(bytes);
        self
    }

    /// Builds the `ContentStore`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if no resolver was set or the chunk size is
    /// zero.
    pub fn build(self) -> VellumResult<ContentStore<E>> {
        let resolver = self
            .resolver
            .ok_or_else(|| ConfigError::new("ContentStore requires a resolver"))?;

        let copy_chunk_size = self.copy_chunk_size.unwrap_or(DEFAULT_COPY_CHUNK_SIZE);
        if copy_chunk_size == 0 {
            return Err(ConfigError::new("copy_chunk_size must be positive").into());
        }

        debug!(
            backend = %resolver.backend(),
            serialize_writes = self.serialize_writes,
            copy_chunk_size,
            "Building content store"
        );

        Ok(ContentStore {
            resolver,
            codec: self.codec.unwrap_or_default(),
            reporter: self.reporter.unwrap_or_else(|| Arc::new(TracingReporter)),
            locks: self
                .serialize_writes
                .then(|| Arc::new(KeyLocks::default())),
            copy_chunk_size,
            _entity: PhantomData,
        })
    }
}

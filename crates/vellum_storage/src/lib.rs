//! Pluggable content backends for Vellum.
//!
//! Content bytes never live in the entity's own persistence layer. They live
//! in a backend, addressed by a string key, behind the [`ResourceResolver`]
//! trait. Each backend hands out [`Resource`] handles exposing the same
//! capability surface: existence, length, read, write and delete.
//!
//! # Backends
//!
//! - [`FileSystemResolver`]: hierarchical, overwrites in place
//! - [`DocumentStoreResolver`]: immutable documents addressed by filename;
//!   replacing content deletes the old document before inserting a new one
//!
//! Choosing a resolver is the only backend decision. Everything above this
//! crate is backend-agnostic.
//!
//! # Example
//!
//! ```rust
//! use tokio::io::{AsyncReadExt, AsyncWriteExt};
//! use vellum_storage::{FileSystemResolver, ResourceResolver};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = FileSystemResolver::new("/tmp/vellum")?;
//! let resource = resolver.resolve("claims/form-1").await?;
//!
//! let mut sink = resource.open_write().await?;
//! sink.write_all(b"hello").await?;
//! sink.finish().await?;
//!
//! let mut content = String::new();
//! resource.open_read().await?.read_to_string(&mut content).await?;
//! assert_eq!(content, "hello");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod document;
mod filesystem;
mod memory_bucket;
mod resource;
mod sink;

pub use config::{DocumentSettings, FileSystemSettings, StoreSettings, VellumConfig};
pub use document::{DocumentBucket, DocumentId, DocumentInfo, DocumentResource, DocumentStoreResolver};
pub use filesystem::{FileResource, FileSystemResolver};
pub use memory_bucket::MemoryBucket;
pub use resource::{
    BackendKind, ContentStream, ReplacePolicy, Resource, ResourceCapabilities, ResourceResolver,
};
pub use sink::{ContentSink, SinkTarget};
pub use vellum_error::{StorageError, StorageErrorKind};

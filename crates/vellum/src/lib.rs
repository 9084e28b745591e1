//! Vellum - content attached to entities
//!
//! Vellum lets a structured entity (a database row, a JSON record, a domain
//! struct) carry an opaque binary payload that lives in a separate storage
//! backend. The entity only records two facts about its content: an
//! identifier and a length in bytes. Vellum keeps those facts consistent with
//! what the backend actually holds.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use tokio::io::AsyncReadExt;
//! use vellum::{ContentFields, ContentMetadata, ContentStore, FileSystemResolver, JsonRecord};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = FileSystemResolver::new("/var/vellum/content")?;
//! let store: ContentStore<JsonRecord> = ContentStore::new(Arc::new(resolver));
//!
//! let mut claim = JsonRecord::empty(ContentFields::default());
//! store.set_content(&mut claim, &b"scanned form"[..]).await?;
//! assert_eq!(claim.content_length()?, 12);
//!
//! if let Some(mut stream) = store.content(&claim).await? {
//!     let mut bytes = Vec::new();
//!     stream.read_to_end(&mut bytes).await?;
//! }
//!
//! store.unset_content(&mut claim).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! Vellum is organized as a workspace with focused crates:
//!
//! - `vellum_error` - Error types
//! - `vellum_core` - Entity metadata access, identifier generation and key derivation
//! - `vellum_storage` - Resource abstraction, filesystem and document backends, configuration
//! - `vellum_store` - The content store operations
//!
//! This crate (`vellum`) re-exports everything for convenience.

pub use vellum_core::*;
pub use vellum_error::*;
pub use vellum_storage::*;
pub use vellum_store::*;

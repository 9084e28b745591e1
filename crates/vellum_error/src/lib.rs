//! Error types for the Vellum content store.
//!
//! This crate provides the error taxonomy shared by every Vellum crate.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! The content store distinguishes four failure families:
//! - [`MetadataError`]: the entity does not expose the content fields
//! - [`ResolutionError`]: an identifier cannot become a backend key
//! - [`StorageError`]: the backend failed a read, write or delete
//! - [`BookkeepingError`]: content was written but the entity metadata is stale
//!
//! # Examples
//!
//! ```
//! use vellum_error::{StorageError, StorageErrorKind, VellumErrorKind, VellumResult};
//!
//! fn read_blob() -> VellumResult<Vec<u8>> {
//!     Err(StorageError::new(StorageErrorKind::NotFound("blobs/a1".to_string())))?
//! }
//!
//! let err = read_blob().unwrap_err();
//! assert!(matches!(err.kind(), VellumErrorKind::Storage(_)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bookkeeping;
mod config;
mod error;
mod metadata;
mod resolution;
mod storage;

pub use bookkeeping::BookkeepingError;
pub use config::ConfigError;
pub use error::{VellumError, VellumErrorKind, VellumResult};
pub use metadata::{MetadataError, MetadataErrorKind};
pub use resolution::{ResolutionError, ResolutionErrorKind};
pub use storage::{StorageError, StorageErrorKind};

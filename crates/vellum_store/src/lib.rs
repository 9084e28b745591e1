//! The Vellum content store.
//!
//! [`ContentStore`] attaches content to entities: it mints content
//! identifiers, resolves them to backend resources, moves the bytes, and
//! keeps each entity's identifier and length in step with what the backend
//! actually holds.
//!
//! Per entity the state machine is `no content -> has content -> no content`.
//! Every operation either completes or leaves the entity's metadata as it
//! was, with one exception reported distinctly: a
//! [`BookkeepingError`](vellum_error::BookkeepingError) means the bytes were
//! written but the length could not be recorded.
//!
//! # Concurrency
//!
//! The store holds no mutable state and can be shared freely between tasks
//! working on distinct entities. Two writers targeting the same content key
//! rely on the backend's atomicity for a single write or delete. Enable
//! [`ContentStoreBuilder::serialize_writes`] to serialize writes and deletes
//! of one key within the process through [`KeyLocks`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod locks;
mod reporter;
mod store;

pub use locks::{KeyGuard, KeyLocks};
pub use reporter::{ContentOperation, ContentReporter, TracingReporter};
pub use store::{ContentStore, ContentStoreBuilder};

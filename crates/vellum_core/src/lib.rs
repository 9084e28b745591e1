//! Entity-side building blocks for the Vellum content store.
//!
//! An entity never holds its content bytes. It holds two pieces of metadata,
//! a content identifier and a content length, and this crate defines how the
//! store reads and writes them:
//!
//! - [`ContentMetadata`] is the accessor contract entity types implement
//! - [`JsonRecord`] implements it for schemaless JSON records
//! - [`IdentifierCodec`] mints identifiers and turns them into backend keys,
//!   using the explicit conversions registered in a [`ConversionService`]

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod conversion;
mod identifier;
mod metadata;
mod record;
mod telemetry;

pub use conversion::ConversionService;
pub use identifier::{IdGenerator, IdentifierCodec, RandomIdGenerator};
pub use metadata::{ContentId, ContentMetadata};
pub use record::{ContentFields, JsonRecord};
pub use telemetry::{init_json_tracing, init_tracing};

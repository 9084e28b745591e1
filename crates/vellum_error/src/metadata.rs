//! Entity metadata access errors.

/// Why the content fields of an entity could not be read or written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum MetadataErrorKind {
    /// The entity has no field with this name
    #[display("Entity has no content field '{}'", _0)]
    MissingField(String),
    /// The field exists but holds an incompatible value
    #[display("Content field '{}' is not a {}", field, expected)]
    FieldType {
        /// The field name
        field: String,
        /// Description of the expected type
        expected: String,
    },
}

/// Metadata access error with location tracking.
///
/// These are configuration faults of the entity type, not data errors.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Metadata Error: {} at line {} in {}", kind, line, file)]
pub struct MetadataError {
    kind: MetadataErrorKind,
    line: u32,
    file: &'static str,
}

impl MetadataError {
    /// Create a new metadata error with caller location tracking.
    #[track_caller]
    pub fn new(kind: MetadataErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &MetadataErrorKind {
        &self.kind
    }
}

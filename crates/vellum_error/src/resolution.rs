//! Identifier resolution errors.

/// Why an identifier could not be mapped to a backend location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ResolutionErrorKind {
    /// No conversion path between the two types
    #[display("Cannot convert {} to {}", from, to)]
    Conversion {
        /// Source type name
        from: &'static str,
        /// Target type name
        to: &'static str,
    },
    /// A registered conversion rejected the value
    #[display("Conversion failed: {}", _0)]
    ConversionFailed(String),
    /// The key is not addressable in the backend
    #[display("Invalid key '{}': {}", key, reason)]
    InvalidKey {
        /// The offending key
        key: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Resolution error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Resolution Error: {} at line {} in {}", kind, line, file)]
pub struct ResolutionError {
    kind: ResolutionErrorKind,
    line: u32,
    file: &'static str,
}

impl ResolutionError {
    /// Create a new resolution error with caller location tracking.
    #[track_caller]
    pub fn new(kind: ResolutionErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ResolutionErrorKind {
        &self.kind
    }
}

//! Top-level error wrapper types.

use crate::{
    BookkeepingError, ConfigError, MetadataError, ResolutionError, StorageError, StorageErrorKind,
};

/// Every failure a Vellum operation can report.
///
/// # Examples
///
/// ```
/// use vellum_error::{ConfigError, VellumError};
///
/// let err: VellumError = ConfigError::new("unknown backend").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum VellumErrorKind {
    /// Entity does not expose the content metadata fields
    #[from(MetadataError)]
    Metadata(MetadataError),
    /// Identifier could not be turned into a backend key
    #[from(ResolutionError)]
    Resolution(ResolutionError),
    /// Backend read, write or delete failed
    #[from(StorageError)]
    Storage(StorageError),
    /// Content reached the backend but entity metadata was not updated
    #[from(BookkeepingError)]
    Bookkeeping(BookkeepingError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Vellum error with kind discrimination.
///
/// # Examples
///
/// ```
/// use vellum_error::{MetadataError, MetadataErrorKind, VellumResult};
///
/// fn content_length() -> VellumResult<u64> {
///     Err(MetadataError::new(MetadataErrorKind::MissingField("size".to_string())))?
/// }
///
/// assert!(content_length().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Vellum Error: {}", _0)]
pub struct VellumError(Box<VellumErrorKind>);

impl VellumError {
    /// Create a new error from a kind.
    pub fn new(kind: VellumErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &VellumErrorKind {
        &self.0
    }

    /// Storage error kind, if this is a backend failure.
    pub fn storage_kind(&self) -> Option<&StorageErrorKind> {
        match self.kind() {
            VellumErrorKind::Storage(err) => Some(&err.kind),
            _ => None,
        }
    }

    /// Whether the backend reported the resource as absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self.storage_kind(), Some(StorageErrorKind::NotFound(_)))
    }
}

// Generic From implementation for any type that converts to VellumErrorKind
impl<T> From<T> for VellumError
where
    T: Into<VellumErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Vellum operations.
pub type VellumResult<T> = std::result::Result<T, VellumError>;

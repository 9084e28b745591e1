//! Stale metadata after a successful backend write.

/// Content reached the backend but the entity's length could not be updated.
///
/// Callers can tell this apart from a [`StorageError`](crate::StorageError)
/// raised before anything was written: the bytes are in place and a retry of
/// the metadata step alone is enough.
///
/// # Examples
///
/// ```
/// use vellum_error::BookkeepingError;
///
/// let err = BookkeepingError::new("claims/42", "length unavailable");
/// assert_eq!(err.key, "claims/42");
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Bookkeeping Error: content for '{}' written but metadata stale: {} at line {} in {}", key, message, line, file)]
pub struct BookkeepingError {
    /// Backend key whose content was written
    pub key: String,
    /// What went wrong while updating metadata
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl BookkeepingError {
    /// Create a new bookkeeping error at the current location.
    #[track_caller]
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            key: key.into(),
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}

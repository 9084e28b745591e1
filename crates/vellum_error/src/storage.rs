//! Storage backend error types.

/// Kinds of backend failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Failed to create a parent directory
    #[display("Failed to create storage directory: {}", _0)]
    DirectoryCreation(String),
    /// Failed to write content
    #[display("Failed to write content: {}", _0)]
    FileWrite(String),
    /// Failed to read content
    #[display("Failed to read content: {}", _0)]
    FileRead(String),
    /// Failed to delete content
    #[display("Failed to delete content: {}", _0)]
    Delete(String),
    /// No content at the specified location
    #[display("Content not found: {}", _0)]
    NotFound(String),
    /// Permission denied when accessing storage
    #[display("Permission denied: {}", _0)]
    PermissionDenied(String),
    /// Resource does not offer the requested capability
    #[display("Unsupported operation: {}", _0)]
    Unsupported(String),
    /// Storage backend is unavailable
    #[display("Storage unavailable: {}", _0)]
    Unavailable(String),
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use vellum_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::NotFound("claims/42".to_string()));
/// assert!(format!("{}", err).contains("not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Classify an I/O failure against `target`.
    ///
    /// `NotFound` and `PermissionDenied` keep their meaning; everything else
    /// is reported through `fallback`.
    #[track_caller]
    pub fn from_io(
        target: &str,
        err: &std::io::Error,
        fallback: fn(String) -> StorageErrorKind,
    ) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => StorageErrorKind::NotFound(target.to_string()),
            std::io::ErrorKind::PermissionDenied => {
                StorageErrorKind::PermissionDenied(format!("{}: {}", target, err))
            }
            _ => fallback(format!("{}: {}", target, err)),
        };
        Self::new(kind)
    }
}

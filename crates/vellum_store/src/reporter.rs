//! Reporting of non-fatal bookkeeping failures.

use vellum_error::VellumError;

/// Content store operations that can leave metadata behind the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ContentOperation {
    /// Attach an entity to existing content
    #[display("associate")]
    Associate,
    /// Write content for an entity
    #[display("set-content")]
    SetContent,
}

/// Sink for failures the store tolerates or reports alongside its result.
///
/// Injected at construction instead of a process-wide logger.
pub trait ContentReporter: Send + Sync {
    /// Entity metadata could not be brought in line with the backend.
    fn bookkeeping_failed(&self, operation: ContentOperation, key: &str, error: &VellumError);
}

/// Reports through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ContentReporter for TracingReporter {
    fn bookkeeping_failed(&self, operation: ContentOperation, key: &str, error: &VellumError) {
        tracing::warn!(
            operation = %operation,
            key,
            error = %error,
            "Content metadata not updated"
        );
    }
}

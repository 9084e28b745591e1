//! Tracing subscriber initialisation.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use vellum_error::{ConfigError, VellumResult};

/// Install a human-readable tracing subscriber.
///
/// The subscriber respects the `RUST_LOG` environment variable and defaults
/// to `info` when it is unset.
///
/// # Errors
///
/// Returns error if a global subscriber is already installed.
pub fn init_tracing() -> VellumResult<()> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt_layer)
        .try_init()
        .map_err(|e| ConfigError::new(format!("Failed to initialise tracing: {}", e)))?;

    Ok(())
}

/// Install a JSON tracing subscriber for log aggregation.
///
/// # Errors
///
/// Returns error if a global subscriber is already installed.
pub fn init_json_tracing() -> VellumResult<()> {
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(json_layer)
        .try_init()
        .map_err(|e| ConfigError::new(format!("Failed to initialise tracing: {}", e)))?;

    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

//! Process telemetry
//!
//! Structured logging setup shared by every pipeline binary. The filter
//! comes from `RUST_LOG`, falling back to `info` when unset.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install the global tracing subscriber.
///
/// Returns an error if a subscriber is already installed, so tests that
/// call this more than once can ignore the failure.
pub fn init_tracing() -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}

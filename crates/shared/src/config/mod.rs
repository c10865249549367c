//! Configuration module for the Tavolo event pipeline
//!
//! Centralized configuration loading, validation, and Data Transfer Objects
//! (DTOs) for the outbox processor, maintenance workers and consumer side.
//!
//! # Architecture
//!
//! 1. **Single Source of Truth**: configuration is loaded once at startup
//! 2. **Fail Fast**: errors are reported immediately, no silent fallbacks
//! 3. **DTO Pattern**: configuration is immutable and passed via dependency injection
//! 4. **Env File Priority**: `.env` file > environment variables > error
//!
//! # Environment Variables
//!
//! ## Required
//!
//! - `TAVOLO_DATABASE_URL`: PostgreSQL connection string
//!
//! ## Optional
//!
//! - `TAVOLO_OUTBOX_BATCH_SIZE`: events claimed per pass (default: 10)
//! - `TAVOLO_OUTBOX_POLL_INTERVAL_MS`: processor cadence (default: 60000)
//! - `TAVOLO_OUTBOX_MAX_RETRIES`: retries before DEAD (default: 5)
//! - `TAVOLO_PUBLISH_TIMEOUT_SECS`: per-publish bound (default: 10)
//! - `TAVOLO_OUTBOX_RETENTION_DAYS`: processed-row retention (default: 7)
//! - `TAVOLO_STALE_CLAIM_SECS`: PROCESSING reclaim timeout (default: 300)
//! - `TAVOLO_CLEANUP_INTERVAL_SECS`: cleanup cadence (default: 3600)
//! - `TAVOLO_CLEANUP_BATCH_SIZE`: rows deleted per sweep (default: 1000)
//! - `TAVOLO_EVENT_SOURCE`: envelope source tag (default: "tavolo.platform")
//! - `RUST_LOG`: log level (default: "info")

pub mod dto;
pub mod error;
pub mod loader;
pub mod validator;

pub use dto::{
    DatabaseConfig, LoggingConfig, MaintenanceConfig, OutboxProcessorConfig, PipelineConfigDto,
};
pub use error::{ConfigError, Result};
pub use loader::ConfigLoader;
pub use validator::{validate_database_url, validate_pipeline_config};

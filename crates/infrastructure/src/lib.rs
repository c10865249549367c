//! Tavolo Event Pipeline - Infrastructure Layer
//!
//! PostgreSQL-backed implementations of the domain persistence traits,
//! background maintenance workers and process telemetry.

pub mod bootstrap;
pub mod maintenance;
pub mod persistence;
pub mod telemetry;

pub use bootstrap::{Pipeline, start_pipeline};
pub use persistence::outbox::PostgresOutboxRepository;
pub use persistence::processed_events::PostgresProcessedEventStore;

//! Tavolo Event Pipeline - Shared Layer
//!
//! - config: centralized configuration loading and validation
//! - ids: typed identifiers shared across crates

pub mod config;
pub mod ids;

pub use ids::{AggregateId, EventId};

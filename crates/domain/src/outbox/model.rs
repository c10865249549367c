//! Outbox Event Model
//!
//! Domain model for outbox events used in the Transactional Outbox Pattern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tavolo_shared::ids::{AggregateId, EventId};

/// Status of an outbox event
///
/// Transitions only move forward: `Pending -> Processing -> {Processed |
/// Failed}`. `Failed -> Pending` happens only through the retry sweep, and
/// `Failed -> Dead` parks events that exhausted their retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboxStatus {
    /// Created, not yet claimed by a processor pass
    Pending,
    /// Claimed by a processor pass, publish in flight
    Processing,
    /// Published to the bus; `processed_at` is set
    Processed,
    /// Publish failed; eligible for the retry sweep
    Failed,
    /// Retries exhausted; parked for manual investigation
    Dead,
}

impl OutboxStatus {
    /// Whether the transition `self -> to` is one the pipeline performs.
    pub fn can_transition_to(self, to: OutboxStatus) -> bool {
        use OutboxStatus::*;
        matches!(
            (self, to),
            (Pending, Processing)
                | (Processing, Processed)
                | (Processing, Failed)
                // stale-claim reclaim
                | (Processing, Pending)
                // explicit retry sweep only
                | (Failed, Pending)
                | (Failed, Dead)
        )
    }
}

impl std::fmt::Display for OutboxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutboxStatus::Pending => write!(f, "PENDING"),
            OutboxStatus::Processing => write!(f, "PROCESSING"),
            OutboxStatus::Processed => write!(f, "PROCESSED"),
            OutboxStatus::Failed => write!(f, "FAILED"),
            OutboxStatus::Dead => write!(f, "DEAD"),
        }
    }
}

/// Error types for outbox operations
#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Duplicate idempotency key: {0}")]
    DuplicateIdempotencyKey(String),

    #[error("Event not found: {0}")]
    NotFound(EventId),

    #[error("Event bus error: {0}")]
    EventBus(String),

    #[error("Infrastructure error: {message}")]
    Infrastructure { message: String },
}

/// Type of aggregate an outbox event is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateType {
    User,
    Restaurant,
    Dish,
    ImportJob,
}

impl std::fmt::Display for AggregateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregateType::User => write!(f, "USER"),
            AggregateType::Restaurant => write!(f, "RESTAURANT"),
            AggregateType::Dish => write!(f, "DISH"),
            AggregateType::ImportJob => write!(f, "IMPORT_JOB"),
        }
    }
}

/// An outbox event ready to be inserted into the database
#[derive(Debug, Clone)]
pub struct OutboxEventInsert {
    pub aggregate_id: AggregateId,
    pub aggregate_type: AggregateType,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub metadata: Option<serde_json::Value>,
    pub idempotency_key: Option<String>,
}

impl OutboxEventInsert {
    pub fn new(
        aggregate_id: AggregateId,
        aggregate_type: AggregateType,
        event_type: String,
        payload: serde_json::Value,
        metadata: Option<serde_json::Value>,
        idempotency_key: Option<String>,
    ) -> Self {
        Self {
            aggregate_id,
            aggregate_type,
            event_type,
            payload,
            metadata,
            idempotency_key,
        }
    }

    /// Create a user-related event
    pub fn for_user(
        user_id: impl Into<AggregateId>,
        event_type: String,
        payload: serde_json::Value,
        metadata: Option<serde_json::Value>,
        idempotency_key: Option<String>,
    ) -> Self {
        Self::new(
            user_id.into(),
            AggregateType::User,
            event_type,
            payload,
            metadata,
            idempotency_key,
        )
    }

    /// Create a restaurant-related event
    pub fn for_restaurant(
        restaurant_id: impl Into<AggregateId>,
        event_type: String,
        payload: serde_json::Value,
        metadata: Option<serde_json::Value>,
        idempotency_key: Option<String>,
    ) -> Self {
        Self::new(
            restaurant_id.into(),
            AggregateType::Restaurant,
            event_type,
            payload,
            metadata,
            idempotency_key,
        )
    }

    /// Create an import-job event
    pub fn for_import_job(
        job_id: impl Into<AggregateId>,
        event_type: String,
        payload: serde_json::Value,
        metadata: Option<serde_json::Value>,
        idempotency_key: Option<String>,
    ) -> Self {
        Self::new(
            job_id.into(),
            AggregateType::ImportJob,
            event_type,
            payload,
            metadata,
            idempotency_key,
        )
    }
}

/// A view of an outbox event from the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEventView {
    pub id: EventId,
    pub aggregate_id: AggregateId,
    pub aggregate_type: AggregateType,
    pub event_type: String,
    pub event_version: i32,
    pub payload: serde_json::Value,
    pub metadata: Option<serde_json::Value>,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
    pub status: OutboxStatus,
    pub retry_count: i32,
    pub last_error: Option<String>,
}

impl OutboxEventView {
    pub fn is_pending(&self) -> bool {
        matches!(self.status, OutboxStatus::Pending)
    }

    pub fn is_processed(&self) -> bool {
        matches!(self.status, OutboxStatus::Processed)
    }

    /// Failed and out of retries
    pub fn is_exhausted(&self, max_retries: i32) -> bool {
        matches!(self.status, OutboxStatus::Failed) && self.retry_count >= max_retries
    }

    pub fn age(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.created_at)
    }
}

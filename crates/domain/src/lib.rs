//! Tavolo Event Pipeline - Domain Layer
//!
//! - outbox: transactional outbox model, repository traits, processor, backoff
//! - classifier: event type -> category/bus routing
//! - event_bus: publish seam consumed by the outbox processor
//! - events: typed domain event schemas with an unknown fallback
//! - consumer: inbound dispatch and the processed-event audit trail

pub mod classifier;
pub mod consumer;
pub mod event_bus;
pub mod events;
pub mod outbox;

pub use classifier::{ClassifierTable, EventBusKind, EventCategory};
pub use event_bus::{EventBus, EventBusError, EventEnvelope, PublishReceipt};
pub use events::DomainEvent;
pub use outbox::{
    AggregateType, OutboxError, OutboxEventInsert, OutboxEventView, OutboxProcessor,
    OutboxRepository, OutboxRepositoryTx, OutboxStats, OutboxStatus, PassReport,
    TransactionalOutbox,
};

//! Downstream event consumption
//!
//! The consumer side of the pipeline: events arriving from the bus are
//! dispatched to registered handlers, and every attempt, successful or
//! not, is recorded as an audit row.

pub mod audit;
pub mod dispatcher;

pub use audit::{
    AuditError, ProcessedEvent, ProcessedEventStore, ProcessingError, ProcessingStatus,
};
pub use dispatcher::{DispatchError, EventDispatcher, EventHandler, InboundEvent};

//! PostgreSQL outbox repository
//!
//! `postgres` holds the pool-based repository used by the processor and
//! maintenance workers; `postgres_tx` adds the transaction-scoped writes
//! used by business code staging events.

mod postgres;
mod postgres_tx;

pub use postgres::PostgresOutboxRepository;

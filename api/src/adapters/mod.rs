//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod postgres;

pub use postgres::{connect_with_retry, run_migrations, PostgresSubscriptionRepository};

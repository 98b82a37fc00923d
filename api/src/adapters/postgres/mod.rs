//! PostgreSQL adapters
//!
//! Implementations of repository traits using SeaORM and PostgreSQL, plus
//! pool setup and embedded schema migrations.

pub mod connection;
pub mod migrations;
pub mod subscription_repo;


pub use connection::connect_with_retry;
pub use migrations::run_migrations;
pub use subscription_repo::PostgresSubscriptionRepository;

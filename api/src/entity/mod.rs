//! SeaORM entity definitions
//!
//! Row-level models for the PostgreSQL schema in `api/migrations`.

pub mod subscriptions;

//! Domain layer
//!
//! Subscription rules with no knowledge of HTTP or SQL.
//! - `entities`: the `Subscription` aggregate and its identifiers
//! - `ports`: the repository contract adapters implement

pub mod entities;
pub mod ports;

//! HTTP handlers
//!
//! Axum request handlers for the API endpoints.

pub mod subscriptions;

pub use subscriptions::{
    create_subscription, delete_subscription, get_subscription, list_subscriptions, total_cost,
    update_subscription,
};

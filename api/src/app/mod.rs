//! Application layer
//!
//! Services orchestrating domain entities and repository ports.

pub mod subscription_service;

pub use subscription_service::{
    CreateSubscription, SubscriptionService, TotalCostQuery, UpdateSubscription,
};

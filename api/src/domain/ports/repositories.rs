//! Repository port traits
//!
//! These traits define the interface for data persistence.
//! Implementations are provided by adapters (e.g., PostgreSQL).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::{Subscription, SubscriptionId, UserId};
use crate::error::DomainError;

/// Optional constraints narrowing a subscription query.
///
/// Unset fields do not filter; the default value matches every live row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionFilter {
    pub owner: Option<UserId>,
    /// Exact match; empty means any service
    pub service_name: String,
    /// Keeps rows whose start time is at or after this instant
    pub start: Option<DateTime<Utc>>,
    /// Keeps rows whose *start* time is at or before this instant
    pub end: Option<DateTime<Utc>>,
}

/// Repository for Subscription entities
///
/// Deleted rows are invisible to every operation.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Persist a new subscription
    async fn add(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Replace every mutable field of a live subscription
    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Soft-delete a live subscription
    async fn remove_by_id(&self, id: &SubscriptionId) -> Result<(), DomainError>;

    /// Find a live subscription, `DomainError::NotFound` if there is none
    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Subscription, DomainError>;

    /// List live subscriptions matching the filter, ordered by id
    async fn find(&self, filter: &SubscriptionFilter) -> Result<Vec<Subscription>, DomainError>;
}

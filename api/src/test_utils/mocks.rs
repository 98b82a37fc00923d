//! Mock implementations of port traits
//!
//! These are in-memory implementations that can be configured for testing.
//! They store data in memory and allow tests to verify behavior.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::domain::entities::{Subscription, SubscriptionId};
use crate::domain::ports::{SubscriptionFilter, SubscriptionRepository};
use crate::error::DomainError;

// ============================================================================
// In-Memory Subscription Repository
// ============================================================================

struct StoredSubscription {
    subscription: Subscription,
    is_deleted: bool,
}

/// Soft-deleting repository keyed by id, so iteration follows id order
#[derive(Default)]
pub struct InMemorySubscriptionRepository {
    subscriptions: Arc<RwLock<BTreeMap<SubscriptionId, StoredSubscription>>>,
    failing: bool,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a subscription for testing
    pub fn with_subscription(self, subscription: Subscription) -> Self {
        self.subscriptions.write().unwrap().insert(
            subscription.id(),
            StoredSubscription {
                subscription,
                is_deleted: false,
            },
        );
        self
    }

    /// Make every call fail with a database error
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Number of stored rows, soft-deleted ones included
    pub fn len(&self) -> usize {
        self.subscriptions.read().unwrap().len()
    }

    fn check(&self) -> Result<(), DomainError> {
        if self.failing {
            Err(DomainError::Database("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Mirrors the SQL predicates of the PostgreSQL adapter.
///
/// A nil owner does not filter, and the end bound compares the start time.
fn filter_matches(filter: &SubscriptionFilter, sub: &Subscription) -> bool {
    if let Some(owner) = filter.owner {
        if !owner.is_nil() && sub.owner() != owner {
            return false;
        }
    }
    if !filter.service_name.is_empty() && sub.service_name() != filter.service_name {
        return false;
    }
    if matches!(filter.start, Some(start) if sub.started_at() < start) {
        return false;
    }
    if matches!(filter.end, Some(end) if sub.started_at() > end) {
        return false;
    }
    true
}

fn not_found(id: &SubscriptionId) -> DomainError {
    DomainError::NotFound(format!("subscription {}", id))
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn add(&self, subscription: &Subscription) -> Result<(), DomainError> {
        self.check()?;
        let mut subscriptions = self.subscriptions.write().unwrap();
        if subscriptions.contains_key(&subscription.id()) {
            return Err(DomainError::Database(format!(
                "duplicate key {}",
                subscription.id()
            )));
        }
        subscriptions.insert(
            subscription.id(),
            StoredSubscription {
                subscription: subscription.clone(),
                is_deleted: false,
            },
        );
        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        self.check()?;
        let mut subscriptions = self.subscriptions.write().unwrap();
        match subscriptions.get_mut(&subscription.id()) {
            Some(stored) if !stored.is_deleted => {
                stored.subscription = subscription.clone();
                Ok(())
            }
            _ => Err(not_found(&subscription.id())),
        }
    }

    async fn remove_by_id(&self, id: &SubscriptionId) -> Result<(), DomainError> {
        self.check()?;
        let mut subscriptions = self.subscriptions.write().unwrap();
        match subscriptions.get_mut(id) {
            Some(stored) if !stored.is_deleted => {
                stored.is_deleted = true;
                Ok(())
            }
            _ => Err(not_found(id)),
        }
    }

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Subscription, DomainError> {
        self.check()?;
        let subscriptions = self.subscriptions.read().unwrap();
        subscriptions
            .get(id)
            .filter(|stored| !stored.is_deleted)
            .map(|stored| stored.subscription.clone())
            .ok_or_else(|| not_found(id))
    }

    async fn find(&self, filter: &SubscriptionFilter) -> Result<Vec<Subscription>, DomainError> {
        self.check()?;
        let subscriptions = self.subscriptions.read().unwrap();
        Ok(subscriptions
            .values()
            .filter(|stored| !stored.is_deleted && filter_matches(filter, &stored.subscription))
            .map(|stored| stored.subscription.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::UserId;
    use crate::test_utils::utc;
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    fn sub(owner: UserId, service: &str, start: DateTime<Utc>) -> Subscription {
        Subscription::create(owner, 100, service, start, None).unwrap()
    }

    #[test]
    fn default_filter_matches_everything() {
        let s = sub(UserId(Uuid::new_v4()), "Netflix", utc(2023, 1, 1));
        assert!(filter_matches(&SubscriptionFilter::default(), &s));
    }

    #[test]
    fn filter_by_owner_and_service() {
        let owner = UserId(Uuid::new_v4());
        let s = sub(owner, "Netflix", utc(2023, 1, 1));

        let filter = SubscriptionFilter {
            owner: Some(owner),
            service_name: "Netflix".into(),
            ..Default::default()
        };
        assert!(filter_matches(&filter, &s));

        let other_owner = SubscriptionFilter {
            owner: Some(UserId(Uuid::new_v4())),
            ..Default::default()
        };
        assert!(!filter_matches(&other_owner, &s));

        let other_service = SubscriptionFilter {
            service_name: "Spotify".into(),
            ..Default::default()
        };
        assert!(!filter_matches(&other_service, &s));
    }

    #[test]
    fn nil_owner_does_not_filter() {
        let s = sub(UserId(Uuid::new_v4()), "Netflix", utc(2023, 1, 1));
        let filter = SubscriptionFilter {
            owner: Some(UserId(Uuid::nil())),
            ..Default::default()
        };
        assert!(filter_matches(&filter, &s));
    }

    #[test]
    fn window_bounds_compare_start_time() {
        let s = Subscription::create(
            UserId(Uuid::new_v4()),
            100,
            "Netflix",
            utc(2023, 3, 1),
            Some(utc(2023, 12, 1)),
        )
        .unwrap();

        let inside = SubscriptionFilter {
            start: Some(utc(2023, 3, 1)),
            end: Some(utc(2023, 3, 1)),
            ..Default::default()
        };
        assert!(filter_matches(&inside, &s));

        // The end bound looks at the start time, not the completion time
        let ends_before_completion = SubscriptionFilter {
            end: Some(utc(2023, 4, 1)),
            ..Default::default()
        };
        assert!(filter_matches(&ends_before_completion, &s));

        let starts_later = SubscriptionFilter {
            start: Some(utc(2023, 3, 2)),
            ..Default::default()
        };
        assert!(!filter_matches(&starts_later, &s));

        let ends_earlier = SubscriptionFilter {
            end: Some(utc(2023, 2, 28)),
            ..Default::default()
        };
        assert!(!filter_matches(&ends_earlier, &s));
    }

    #[tokio::test]
    async fn find_hides_deleted_rows() {
        let s = sub(UserId(Uuid::new_v4()), "Netflix", utc(2023, 1, 1));
        let repo = InMemorySubscriptionRepository::new().with_subscription(s.clone());

        repo.remove_by_id(&s.id()).await.unwrap();

        assert!(repo
            .find(&SubscriptionFilter::default())
            .await
            .unwrap()
            .is_empty());
        assert_eq!(repo.len(), 1);
    }
}

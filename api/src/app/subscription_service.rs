//! Subscription service
//!
//! Orchestrates entity validation, repository calls and the total-cost
//! aggregation. Repository failures other than "not found" are logged here
//! and surface to callers only as a generic `AppError::Internal`.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::entities::{Subscription, SubscriptionId, UserId};
use crate::domain::ports::{SubscriptionFilter, SubscriptionRepository};
use crate::error::{AppError, DomainError};

/// Input for creating a subscription
#[derive(Debug, Clone)]
pub struct CreateSubscription {
    pub owner: UserId,
    pub service_name: String,
    pub price_rub: i64,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

/// Input for replacing a subscription's fields.
///
/// Omitting `end` clears the completion date.
#[derive(Debug, Clone)]
pub struct UpdateSubscription {
    pub id: SubscriptionId,
    pub owner: UserId,
    pub service_name: String,
    pub price_rub: i64,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

/// Parameters of the total-cost aggregation
#[derive(Debug, Clone)]
pub struct TotalCostQuery {
    pub owner: UserId,
    pub service_name: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Service for managing subscriptions
pub struct SubscriptionService<SR>
where
    SR: SubscriptionRepository,
{
    subscriptions: Arc<SR>,
}

impl<SR> SubscriptionService<SR>
where
    SR: SubscriptionRepository,
{
    pub fn new(subscriptions: Arc<SR>) -> Self {
        Self { subscriptions }
    }

    /// Validate and persist a new subscription
    pub async fn create(&self, input: CreateSubscription) -> Result<Subscription, AppError> {
        let subscription = Subscription::create(
            input.owner,
            input.price_rub,
            &input.service_name,
            input.start,
            input.end,
        )
        .map_err(|e| invalid_input("create", e))?;

        self.subscriptions
            .add(&subscription)
            .await
            .map_err(|e| internal("create", "failed to create subscription", e))?;

        tracing::info!(subscription_id = %subscription.id(), "subscription created");
        Ok(subscription)
    }

    /// Replace owner, dates, price and service name of an existing subscription.
    ///
    /// Nothing is persisted unless every change validates.
    pub async fn update(&self, input: UpdateSubscription) -> Result<Subscription, AppError> {
        let mut subscription = self
            .subscriptions
            .find_by_id(&input.id)
            .await
            .map_err(|e| lookup_failed("update", "failed to update subscription", e))?;

        subscription
            .change_owner(input.owner)
            .map_err(|e| invalid_input("update", e))?;
        subscription.reset_end_time();
        subscription
            .change_start_time(input.start)
            .map_err(|e| invalid_input("update", e))?;
        if let Some(end) = input.end {
            subscription
                .change_end_time(end)
                .map_err(|e| invalid_input("update", e))?;
        }
        subscription
            .change_price(input.price_rub)
            .map_err(|e| invalid_input("update", e))?;
        subscription
            .change_service_name(&input.service_name)
            .map_err(|e| invalid_input("update", e))?;

        self.subscriptions
            .update(&subscription)
            .await
            .map_err(|e| lookup_failed("update", "failed to update subscription", e))?;

        tracing::info!(subscription_id = %subscription.id(), "subscription updated");
        Ok(subscription)
    }

    pub async fn find_by_id(&self, id: &SubscriptionId) -> Result<Subscription, AppError> {
        self.subscriptions
            .find_by_id(id)
            .await
            .map_err(|e| lookup_failed("find_by_id", "failed to fetch subscription", e))
    }

    /// List every live subscription.
    ///
    /// A repository failure is logged and yields an empty list.
    pub async fn list_all(&self) -> Vec<Subscription> {
        match self.subscriptions.find(&SubscriptionFilter::default()).await {
            Ok(subscriptions) => {
                tracing::debug!(count = subscriptions.len(), "subscriptions listed");
                subscriptions
            }
            Err(e) => {
                tracing::error!(op = "list_all", error = %e, "failed to fetch subscriptions");
                Vec::new()
            }
        }
    }

    /// Soft-delete a subscription
    pub async fn remove(&self, id: &SubscriptionId) -> Result<(), AppError> {
        self.subscriptions
            .remove_by_id(id)
            .await
            .map_err(|e| lookup_failed("remove", "failed to remove subscription", e))?;

        tracing::info!(subscription_id = %id, "subscription removed");
        Ok(())
    }

    /// Sum of prices of the owner's live subscriptions to one service,
    /// optionally limited to those started inside a window.
    pub async fn total_cost(&self, query: TotalCostQuery) -> Result<i64, AppError> {
        if query.owner.is_nil() {
            return Err(AppError::InvalidInput("user_id is required".to_string()));
        }
        if query.service_name.is_empty() {
            return Err(AppError::InvalidInput("service_name is required".to_string()));
        }
        if let (Some(start), Some(end)) = (query.start, query.end) {
            if end <= start {
                return Err(AppError::InvalidInput(
                    "end time must be after start time".to_string(),
                ));
            }
        }

        let filter = SubscriptionFilter {
            owner: Some(query.owner),
            service_name: query.service_name,
            start: query.start,
            end: query.end,
        };

        let subscriptions = self
            .subscriptions
            .find(&filter)
            .await
            .map_err(|e| internal("total_cost", "failed to calculate total cost", e))?;

        let total = subscriptions
            .iter()
            .try_fold(0i64, |acc, sub| acc.checked_add(sub.price_rub()))
            .ok_or_else(|| {
                tracing::error!(
                    op = "total_cost",
                    owner = %query.owner,
                    count = subscriptions.len(),
                    "total cost overflows i64"
                );
                AppError::Internal("failed to calculate total cost".to_string())
            })?;

        tracing::info!(owner = %query.owner, total_cost = total, "total cost calculated");
        Ok(total)
    }
}

fn invalid_input(op: &'static str, e: DomainError) -> AppError {
    tracing::debug!(op, error = %e, "validation failed");
    match e {
        DomainError::Validation(msg) => AppError::InvalidInput(msg),
        other => AppError::InvalidInput(other.to_string()),
    }
}

/// Map a repository error, translating "not found" and hiding everything else
fn lookup_failed(op: &'static str, public: &str, e: DomainError) -> AppError {
    match e {
        DomainError::NotFound(detail) => {
            tracing::warn!(op, %detail, "subscription not found");
            AppError::NotFound("subscription not found".to_string())
        }
        other => internal(op, public, other),
    }
}

fn internal(op: &'static str, public: &str, e: DomainError) -> AppError {
    tracing::error!(op, error = %e, "repository failure");
    AppError::Internal(public.to_string())
}

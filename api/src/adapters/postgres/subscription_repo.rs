//! PostgreSQL adapter for SubscriptionRepository
//!
//! Rows are never physically deleted: `is_deleted` marks a removed
//! subscription and every query filters on it.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::domain::entities::{Subscription, SubscriptionId, UserId};
use crate::domain::ports::{SubscriptionFilter, SubscriptionRepository};
use crate::entity::subscriptions;
use crate::error::DomainError;

/// PostgreSQL implementation of SubscriptionRepository
pub struct PostgresSubscriptionRepository {
    db: DatabaseConnection,
}

impl PostgresSubscriptionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Give back the connection, e.g. to inspect a mock's transaction log
    #[cfg(test)]
    pub fn into_inner(self) -> DatabaseConnection {
        self.db
    }
}

fn not_found(id: &SubscriptionId) -> DomainError {
    DomainError::NotFound(format!("Subscription {} not found", id))
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn add(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let model = subscriptions::ActiveModel {
            id: Set(subscription.id().0),
            owner_id: Set(subscription.owner().0),
            service_name: Set(subscription.service_name().to_string()),
            price: Set(subscription.price_rub()),
            is_deleted: Set(false),
            start_time: Set(subscription.started_at().fixed_offset()),
            end_time: Set(subscription.completed_at().map(|t| t.fixed_offset())),
        };

        subscriptions::Entity::insert(model)
            .exec_without_returning(&txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        tracing::debug!(subscription_id = %subscription.id(), "subscription inserted");
        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let changes = subscriptions::ActiveModel {
            owner_id: Set(subscription.owner().0),
            service_name: Set(subscription.service_name().to_string()),
            price: Set(subscription.price_rub()),
            start_time: Set(subscription.started_at().fixed_offset()),
            end_time: Set(subscription.completed_at().map(|t| t.fixed_offset())),
            ..Default::default()
        };

        let result = subscriptions::Entity::update_many()
            .set(changes)
            .filter(subscriptions::Column::Id.eq(subscription.id().0))
            .filter(subscriptions::Column::IsDeleted.eq(false))
            .exec(&txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        // Dropping the transaction without commit rolls it back
        if result.rows_affected == 0 {
            return Err(not_found(&subscription.id()));
        }

        txn.commit()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        tracing::debug!(subscription_id = %subscription.id(), "subscription updated");
        Ok(())
    }

    async fn remove_by_id(&self, id: &SubscriptionId) -> Result<(), DomainError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let result = subscriptions::Entity::update_many()
            .col_expr(subscriptions::Column::IsDeleted, Expr::value(true))
            .filter(subscriptions::Column::Id.eq(id.0))
            .filter(subscriptions::Column::IsDeleted.eq(false))
            .exec(&txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(not_found(id));
        }

        txn.commit()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        tracing::debug!(subscription_id = %id, "subscription marked deleted");
        Ok(())
    }

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Subscription, DomainError> {
        let result = subscriptions::Entity::find_by_id(id.0)
            .filter(subscriptions::Column::IsDeleted.eq(false))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        result.map(Into::into).ok_or_else(|| not_found(id))
    }

    async fn find(&self, filter: &SubscriptionFilter) -> Result<Vec<Subscription>, DomainError> {
        let mut query =
            subscriptions::Entity::find().filter(subscriptions::Column::IsDeleted.eq(false));

        if let Some(owner) = filter.owner.filter(|o| !o.is_nil()) {
            query = query.filter(subscriptions::Column::OwnerId.eq(owner.0));
        }
        if !filter.service_name.is_empty() {
            query = query.filter(subscriptions::Column::ServiceName.eq(filter.service_name.as_str()));
        }
        if let Some(start) = filter.start {
            query = query.filter(subscriptions::Column::StartTime.gte(start.fixed_offset()));
        }
        if let Some(end) = filter.end {
            query = query.filter(subscriptions::Column::StartTime.lte(end.fixed_offset()));
        }

        let results = query
            .order_by_asc(subscriptions::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        tracing::debug!(count = results.len(), "subscriptions fetched");
        Ok(results.into_iter().map(|m| m.into()).collect())
    }
}

/// Convert SeaORM model to domain entity
impl From<subscriptions::Model> for Subscription {
    fn from(model: subscriptions::Model) -> Self {
        Subscription::restore(
            SubscriptionId(model.id),
            UserId(model.owner_id),
            model.service_name,
            model.price,
            model.start_time.with_timezone(&Utc),
            model.end_time.map(|dt| dt.with_timezone(&Utc)),
        )
    }
}

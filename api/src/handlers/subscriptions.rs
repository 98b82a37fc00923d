//! Subscription handlers
//!
//! CRUD endpoints plus the total-cost aggregation. Dates travel as
//! `YYYY-MM-DD` and are interpreted as midnight UTC.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::{CreateSubscription, TotalCostQuery, UpdateSubscription};
use crate::domain::entities::{Subscription, SubscriptionId, UserId};
use crate::domain::ports::SubscriptionRepository;
use crate::error::AppError;
use crate::AppState;

/// Subscription as returned by every endpoint
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SubscriptionResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub service_name: String,
    pub price: i64,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(sub: Subscription) -> Self {
        Self {
            id: sub.id().0,
            user_id: sub.owner().0,
            service_name: sub.service_name().to_string(),
            price: sub.price_rub(),
            start_date: sub.started_at().date_naive(),
            end_date: sub.completed_at().map(|end| end.date_naive()),
        }
    }
}

/// Body of POST and PATCH requests
#[derive(Debug, Deserialize)]
pub struct SubscriptionRequest {
    pub user_id: Uuid,
    pub service_name: String,
    pub price: i64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

/// Query parameters for the total-cost endpoint
#[derive(Debug, Deserialize)]
pub struct TotalCostParams {
    pub user_id: Option<Uuid>,
    pub service_name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TotalCostResponse {
    pub total_cost: i64,
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// GET /subscriptions
///
/// List all live subscriptions.
pub async fn list_subscriptions<SR>(
    State(state): State<AppState<SR>>,
) -> Json<Vec<SubscriptionResponse>>
where
    SR: SubscriptionRepository + 'static,
{
    let subscriptions = state.subscription_service.list_all().await;

    Json(subscriptions.into_iter().map(Into::into).collect())
}

/// POST /subscriptions
pub async fn create_subscription<SR>(
    State(state): State<AppState<SR>>,
    payload: Result<Json<SubscriptionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubscriptionResponse>), AppError>
where
    SR: SubscriptionRepository + 'static,
{
    let Json(request) = payload?;

    let subscription = state
        .subscription_service
        .create(CreateSubscription {
            owner: UserId(request.user_id),
            service_name: request.service_name,
            price_rub: request.price,
            start: midnight_utc(request.start_date),
            end: request.end_date.map(midnight_utc),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(subscription.into())))
}

/// GET /subscriptions/:id
pub async fn get_subscription<SR>(
    State(state): State<AppState<SR>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SubscriptionResponse>, AppError>
where
    SR: SubscriptionRepository + 'static,
{
    let Path(id) = id?;

    let subscription = state
        .subscription_service
        .find_by_id(&SubscriptionId(id))
        .await?;

    Ok(Json(subscription.into()))
}

/// PATCH /subscriptions/:id
///
/// Replace every field; a missing `end_date` reopens the subscription.
pub async fn update_subscription<SR>(
    State(state): State<AppState<SR>>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<SubscriptionRequest>, JsonRejection>,
) -> Result<Json<SubscriptionResponse>, AppError>
where
    SR: SubscriptionRepository + 'static,
{
    let Path(id) = id?;
    let Json(request) = payload?;

    let subscription = state
        .subscription_service
        .update(UpdateSubscription {
            id: SubscriptionId(id),
            owner: UserId(request.user_id),
            service_name: request.service_name,
            price_rub: request.price,
            start: midnight_utc(request.start_date),
            end: request.end_date.map(midnight_utc),
        })
        .await?;

    Ok(Json(subscription.into()))
}

/// DELETE /subscriptions/:id
pub async fn delete_subscription<SR>(
    State(state): State<AppState<SR>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError>
where
    SR: SubscriptionRepository + 'static,
{
    let Path(id) = id?;

    state
        .subscription_service
        .remove(&SubscriptionId(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /subscriptions/total-cost
///
/// Sum of prices for one user and service, optionally restricted to
/// subscriptions started between `start_date` and `end_date`.
pub async fn total_cost<SR>(
    State(state): State<AppState<SR>>,
    params: Result<Query<TotalCostParams>, QueryRejection>,
) -> Result<Json<TotalCostResponse>, AppError>
where
    SR: SubscriptionRepository + 'static,
{
    let Query(params) = params?;

    let total_cost = state
        .subscription_service
        .total_cost(TotalCostQuery {
            owner: UserId(params.user_id.unwrap_or_else(Uuid::nil)),
            service_name: params.service_name.unwrap_or_default(),
            start: params.start_date.map(midnight_utc),
            end: params.end_date.map(midnight_utc),
        })
        .await?;

    Ok(Json(TotalCostResponse { total_cost }))
}

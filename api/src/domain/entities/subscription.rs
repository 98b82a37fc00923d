//! Subscription domain entity
//!
//! A user's paid subscription to an external service. Every mutator validates
//! its own concern and leaves the entity untouched when it fails.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::error::DomainError;

/// Unique identifier for a subscription (UUID v7, creation-ordered)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for SubscriptionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the subscribing user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

const CREATE: &str = "can not create subscription";
const UPDATE: &str = "can not update subscription";

fn invalid(prefix: &str, reason: &str) -> DomainError {
    DomainError::Validation(format!("{}: {}", prefix, reason))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    id: SubscriptionId,
    service_name: String,
    price_rub: i64,
    owner: UserId,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl Subscription {
    /// Create a validated subscription with a fresh id.
    ///
    /// Rules are checked in a fixed order and the first violation is returned:
    /// start date, owner, service name, price, end date.
    pub fn create<Tz: TimeZone>(
        owner: UserId,
        price_rub: i64,
        service_name: &str,
        start: DateTime<Tz>,
        end: Option<DateTime<Tz>>,
    ) -> Result<Self, DomainError> {
        let started_at = start.with_timezone(&Utc);
        if started_at > Utc::now() {
            return Err(invalid(CREATE, "date has not come yet"));
        }

        if owner.is_nil() {
            return Err(invalid(CREATE, "user id was not provided"));
        }

        let service_name = service_name.trim();
        if service_name.is_empty() {
            return Err(invalid(CREATE, "subscribed service is not provided"));
        }

        if price_rub < 0 {
            return Err(invalid(CREATE, "invalid subscription price"));
        }

        let completed_at = end.map(|e| e.with_timezone(&Utc));
        if matches!(completed_at, Some(end) if end < started_at) {
            return Err(invalid(CREATE, "start time must be less than end time"));
        }

        Ok(Self {
            id: SubscriptionId::new(),
            service_name: service_name.to_string(),
            price_rub,
            owner,
            started_at,
            completed_at,
        })
    }

    /// Rebuild a subscription from persisted state without re-validating it.
    pub fn restore(
        id: SubscriptionId,
        owner: UserId,
        service_name: String,
        price_rub: i64,
        started_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            service_name,
            price_rub,
            owner,
            started_at,
            completed_at,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn price_rub(&self) -> i64 {
        self.price_rub
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Unlike `create`, the name is taken as given (no trimming).
    pub fn change_service_name(&mut self, name: &str) -> Result<(), DomainError> {
        if name.is_empty() {
            return Err(invalid(UPDATE, "subscribed service is not provided"));
        }

        self.service_name = name.to_string();
        Ok(())
    }

    pub fn reset_end_time(&mut self) {
        self.completed_at = None;
    }

    pub fn change_start_time<Tz: TimeZone>(&mut self, start: DateTime<Tz>) -> Result<(), DomainError> {
        let start = start.with_timezone(&Utc);
        if matches!(self.completed_at, Some(end) if start > end) {
            return Err(invalid(UPDATE, "start time must be less than end time"));
        }
        if start > Utc::now() {
            return Err(invalid(UPDATE, "date has not come yet"));
        }

        self.started_at = start;
        Ok(())
    }

    pub fn change_end_time<Tz: TimeZone>(&mut self, end: DateTime<Tz>) -> Result<(), DomainError> {
        let end = end.with_timezone(&Utc);
        if end < self.started_at {
            return Err(invalid(UPDATE, "start time must be less than end time"));
        }

        self.completed_at = Some(end);
        Ok(())
    }

    pub fn change_owner(&mut self, owner: UserId) -> Result<(), DomainError> {
        if owner.is_nil() {
            return Err(invalid(UPDATE, "user id was not provided"));
        }

        self.owner = owner;
        Ok(())
    }

    pub fn change_price(&mut self, price_rub: i64) -> Result<(), DomainError> {
        if price_rub < 0 {
            return Err(invalid(UPDATE, "invalid subscription price"));
        }

        self.price_rub = price_rub;
        Ok(())
    }
}

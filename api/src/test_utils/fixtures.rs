//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use crate::domain::entities::{Subscription, UserId};

/// Midnight UTC on the given date
pub fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

pub fn days_ago(days: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(days)
}

/// Create an open-ended 500 RUB Netflix subscription for a fresh user
pub fn test_subscription() -> Subscription {
    test_subscription_for(UserId(Uuid::new_v4()), "Netflix", 500)
}

/// Create an open-ended subscription started on 2023-01-01
pub fn test_subscription_for(owner: UserId, service_name: &str, price_rub: i64) -> Subscription {
    Subscription::create(owner, price_rub, service_name, utc(2023, 1, 1), None).unwrap()
}

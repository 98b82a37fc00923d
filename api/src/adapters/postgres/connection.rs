//! Connection pool setup
//!
//! The pool is established once at startup. A failed attempt is retried with
//! a delay that grows linearly with the attempt number.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use crate::config::DatabaseConfig;

/// Delay before the second attempt; later attempts wait `n * BASE_RETRY_DELAY`
const BASE_RETRY_DELAY: Duration = Duration::from_secs(5);

pub async fn connect_with_retry(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.connection_string());
    options
        .connect_timeout(config.connect_timeout)
        .sqlx_logging(false);

    retry_with_backoff(config.connect_attempts, BASE_RETRY_DELAY, || {
        Database::connect(options.clone())
    })
    .await
}

/// Run `op` up to `attempts` times (at least once), sleeping
/// `base_delay * attempt` between failures. Returns the last error.
pub async fn retry_with_backoff<T, E, F, Fut>(
    attempts: u32,
    base_delay: Duration,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                let delay = base_delay * attempt;
                tracing::warn!(
                    attempt,
                    attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(attempts, error = %e, "giving up after final attempt");
                return Err(e);
            }
        }
    }
}

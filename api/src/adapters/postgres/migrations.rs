//! Embedded schema migrations
//!
//! SQL files under `api/migrations` are compiled into the binary by
//! `sqlx::migrate!` and applied through sea-orm's underlying PostgreSQL pool.
//! Applied versions are tracked by sqlx in `_sqlx_migrations`.

use sea_orm::DatabaseConnection;
use sqlx::migrate::Migrator;

use crate::error::DomainError;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Apply every migration not yet recorded.
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), DomainError> {
    tracing::info!("Running database migrations");
    MIGRATOR
        .run(db.get_postgres_connection_pool())
        .await
        .map_err(|e| DomainError::Database(format!("migration failed: {}", e)))?;
    tracing::info!(
        known = MIGRATOR.iter().count(),
        "Database migrations completed"
    );
    Ok(())
}

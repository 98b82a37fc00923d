//! Subscriptions API Server
//!
//! CRUD service for users' paid online subscriptions, with total-cost
//! aggregation over a date window.
//! Uses hexagonal (ports & adapters) architecture for clean separation of concerns.

use std::future::IntoFuture;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    body::Body,
    http::{header, Request},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod adapters;
mod app;
mod config;
mod domain;
mod entity;
mod error;
mod handlers;

#[cfg(test)]
mod test_utils;


use adapters::{connect_with_retry, run_migrations, PostgresSubscriptionRepository};
use app::SubscriptionService;
use config::Config;
use domain::ports::SubscriptionRepository;

const OPENAPI_SPEC: &str = include_str!("../openapi.yml");

/// Application state shared across all handlers
pub struct AppState<SR>
where
    SR: SubscriptionRepository,
{
    pub subscription_service: Arc<SubscriptionService<SR>>,
}

impl<SR> AppState<SR>
where
    SR: SubscriptionRepository,
{
    pub fn new(subscriptions: SR) -> Self {
        Self {
            subscription_service: Arc::new(SubscriptionService::new(Arc::new(subscriptions))),
        }
    }
}

impl<SR> Clone for AppState<SR>
where
    SR: SubscriptionRepository,
{
    fn clone(&self) -> Self {
        Self {
            subscription_service: self.subscription_service.clone(),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn openapi_spec() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/yaml")], OPENAPI_SPEC)
}

pub fn build_router<SR>(state: AppState<SR>) -> Router
where
    SR: SubscriptionRepository + 'static,
{
    Router::new()
        // Health check
        .route("/health", get(health))
        .route("/swagger.yml", get(openapi_spec))
        // Subscriptions
        .route(
            "/subscriptions",
            get(handlers::list_subscriptions::<SR>).post(handlers::create_subscription::<SR>),
        )
        .route("/subscriptions/total-cost", get(handlers::total_cost::<SR>))
        .route(
            "/subscriptions/:id",
            get(handlers::get_subscription::<SR>)
                .patch(handlers::update_subscription::<SR>)
                .delete(handlers::delete_subscription::<SR>),
        )
        // Middleware
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,subscriptions_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Subscriptions API...");

    // Load configuration
    let config = Config::from_env().context("failed to load configuration")?;

    // Connect to PostgreSQL
    tracing::info!("Connecting to database...");
    let db = connect_with_retry(&config.database)
        .await
        .context("failed to connect to database")?;
    tracing::info!("Database connected");

    if config.should_migrate {
        run_migrations(&db)
            .await
            .context("failed to apply migrations")?;
    }

    // Handle for closing the pool once serving stops
    let pool = db.get_postgres_connection_pool().clone();

    // Create app state
    let state = AppState::new(PostgresSubscriptionRepository::new(db));
    let app = build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.http_address)
        .await
        .with_context(|| format!("failed to bind {}", config.http_address))?;
    tracing::info!("Listening on {}", config.http_address);

    let (stopping_tx, stopping_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = stopping_tx.send(());
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result.context("server error")?,
        _ = stopping_rx => {
            // In-flight requests get a bounded window to finish
            match tokio::time::timeout(config.shutdown_timeout, &mut server).await {
                Ok(result) => result.context("server error")?,
                Err(_) => tracing::warn!(
                    timeout_secs = config.shutdown_timeout.as_secs(),
                    "shutdown timed out, dropping open connections"
                ),
            }
        }
    }

    pool.close().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}

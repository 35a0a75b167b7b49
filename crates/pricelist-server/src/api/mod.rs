pub mod response;

use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::db;
use crate::features;
use crate::middleware;
use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tower_http::compression::CompressionLayer;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
}

/// Build the application router with all routes and middleware
pub fn create_router(db: PgPool, config: &Config) -> Router {
    let feature_routes = features::router(features::FeatureState { db: db.clone() });

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(AppState { db })
        .nest("/api/v0", feature_routes)
        .layer(DefaultBodyLimit::max(config.upload.max_upload_bytes))
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

/// Serve `app` until `signal` resolves, then drain for at most `drain_timeout`
///
/// The listener stops accepting as soon as the signal fires. Connections still open when the
/// drain window closes are dropped.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    signal: F,
    drain_timeout: Duration,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let draining = Arc::new(Notify::new());
    let notify = draining.clone();

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            signal.await;
            tracing::info!(
                timeout_secs = drain_timeout.as_secs(),
                "Stopped accepting, waiting for connections to close"
            );
            notify.notify_one();
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result,
        _ = async {
            draining.notified().await;
            tokio::time::sleep(drain_timeout).await;
        } => {
            tracing::warn!(
                timeout_secs = drain_timeout.as_secs(),
                "Connections still open after shutdown timeout, closing them"
            );
            Ok(())
        }
    }
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Pricelist Server",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn health(State(state): State<AppState>) -> Response {
    match db::health_check(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "database": "connected"
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Database health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "database": "unreachable"
                })),
            )
                .into_response()
        },
    }
}

//! Feature modules implementing the pricelist API
//!
//! Each feature is a vertical slice:
//! - `commands/` - write operations
//! - `queries/` - read operations
//! - `routes.rs` - HTTP route definitions
//!
//! Every command and query exposes an async `handle(pool, request)` plus a `validate()` on
//! the request type.

pub mod prices;

use axum::Router;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// PostgreSQL connection pool for database operations
    pub db: sqlx::PgPool,
}

/// Creates the API router with all feature routes mounted
///
/// - `/prices` - price list upload, export and statistics
pub fn router(state: FeatureState) -> Router<()> {
    Router::new().nest("/prices", prices::prices_routes().with_state(state.db))
}

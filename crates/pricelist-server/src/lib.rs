//! Pricelist Server Library
//!
//! HTTP service that loads CSV price lists from uploaded archives into PostgreSQL and exports
//! them back as zipped CSV.
//!
//! # Overview
//!
//! - **Ingestion** ([`ingest`]): archive extraction, row validation, duplicate accounting, and
//!   the insert-plus-aggregates transaction
//! - **API** ([`api`], [`features`]): `POST`/`GET /api/v0/prices`, `GET /api/v0/prices/stats`,
//!   `GET /health`
//! - **Database** ([`db`]): pool creation, startup retry, embedded migrations
//! - **Configuration** ([`config`]): environment variables with defaults
//! - **Middleware** ([`middleware`]): CORS and request tracing
//!
//! # Architecture
//!
//! Features are vertical slices split into commands (writes) and queries (reads), each with a
//! `handle(pool, request)` entry point. Concurrent uploads are serialized by a PostgreSQL
//! advisory lock held for the length of the ingest transaction, so the server keeps no
//! in-process locks.
//!
//! # Example
//!
//! ```no_run
//! use pricelist_server::{api, config::Config, db};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::connect_with_retry(&config.database).await?;
//!     db::run_migrations(&pool).await?;
//!     let app = api::create_router(pool, &config);
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod features;
pub mod ingest;
pub mod middleware;

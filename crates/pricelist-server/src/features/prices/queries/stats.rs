use sqlx::PgPool;

use crate::ingest::{stats, TableStats};

#[derive(Debug, thiserror::Error)]
pub enum GetPriceStatsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read-only aggregates, computed without the ingest lock
#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool) -> Result<TableStats, GetPriceStatsError> {
    Ok(stats::collect(&pool).await?)
}

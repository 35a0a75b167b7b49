//! Ingestion transaction
//!
//! Inserts a validated batch and reads the aggregates back as one unit. Every ingest takes
//! the same transaction-scoped advisory lock first, so concurrent uploads run one after the
//! other on the database side and see each other's committed rows when classifying
//! duplicates.

use std::collections::HashSet;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use tracing::{debug, info};

use super::dedup::classify;
use super::models::{BatchReport, IdentityKey, PriceRecord};
use super::stats;

/// Key for `pg_advisory_xact_lock` shared by every ingest
pub const INGEST_LOCK_KEY: i64 = 0x7072_6963_6573;

/// Failures while writing a batch
///
/// Any of these leaves the table exactly as it was before the batch.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to start transaction: {0}")]
    TransactionStartFailed(#[source] sqlx::Error),

    #[error("Failed to insert row from CSV line {line}: {source}")]
    InsertFailed {
        line: u64,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to commit transaction: {0}")]
    CommitFailed(#[source] sqlx::Error),

    #[error("Query failed: {0}")]
    QueryFailed(#[from] sqlx::Error),
}

/// Insert the unique records of a batch and return the resulting aggregates
#[tracing::instrument(skip(pool, records), fields(records = records.len()))]
pub async fn ingest_batch(pool: &PgPool, records: Vec<PriceRecord>) -> Result<BatchReport, StoreError> {
    let mut tx = pool.begin().await.map_err(StoreError::TransactionStartFailed)?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(INGEST_LOCK_KEY)
        .execute(&mut *tx)
        .await?;

    let persisted = load_persisted_keys(&mut tx, &records).await?;
    let classification = classify(records, &persisted);
    debug!(
        unique = classification.unique.len(),
        duplicates = classification.duplicates,
        "Classified batch"
    );

    let mut inserted = 0u64;
    for record in &classification.unique {
        sqlx::query(
            r#"
            INSERT INTO prices (name, category, price, create_date)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&record.name)
        .bind(&record.category)
        .bind(&record.price)
        .bind(record.create_date)
        .execute(&mut *tx)
        .await
        .map_err(|source| StoreError::InsertFailed {
            line: record.line,
            source,
        })?;
        inserted += 1;
    }

    let stats = stats::collect(&mut *tx).await?;

    tx.commit().await.map_err(StoreError::CommitFailed)?;

    info!(
        inserted,
        duplicates = classification.duplicates,
        total_items = stats.total_items,
        "Batch committed"
    );

    Ok(BatchReport {
        inserted,
        duplicates: classification.duplicates,
        stats,
    })
}

/// Fetch the stored identity keys that also occur in the batch
async fn load_persisted_keys(
    tx: &mut Transaction<'_, Postgres>,
    records: &[PriceRecord],
) -> Result<HashSet<IdentityKey>, sqlx::Error> {
    if records.is_empty() {
        return Ok(HashSet::new());
    }

    let mut names: Vec<String> = Vec::with_capacity(records.len());
    let mut categories: Vec<String> = Vec::with_capacity(records.len());
    let mut prices: Vec<BigDecimal> = Vec::with_capacity(records.len());
    let mut dates: Vec<NaiveDate> = Vec::with_capacity(records.len());
    for record in records {
        names.push(record.name.clone());
        categories.push(record.category.clone());
        prices.push(record.price.clone());
        dates.push(record.create_date);
    }

    let keys = sqlx::query_as::<_, IdentityKey>(
        r#"
        SELECT DISTINCT p.name, p.category, p.price, p.create_date
        FROM prices p
        JOIN UNNEST($1::text[], $2::text[], $3::numeric[], $4::date[])
            AS b(name, category, price, create_date)
          ON p.name = b.name
         AND p.category = b.category
         AND p.price = b.price
         AND p.create_date = b.create_date
        "#,
    )
    .bind(&names)
    .bind(&categories)
    .bind(&prices)
    .bind(&dates)
    .fetch_all(&mut **tx)
    .await?;

    Ok(keys.into_iter().collect())
}

//! Price list ingestion pipeline
//!
//! ```text
//! upload bytes ─► archive::extract ─► parser::parse ─► storage::ingest_batch ─► IngestOutcome
//!                                                       (dedup + insert + stats, one tx)
//! ```
//!
//! Archive and CSV failures are the client's fault; store failures are ours.

pub mod archive;
pub mod dedup;
pub mod models;
pub mod parser;
pub mod stats;
pub mod storage;

use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

pub use archive::{ArchiveError, ArchiveKind};
pub use models::{IngestOutcome, PriceRecord, TableStats};
pub use parser::CsvStructureError;
pub use storage::StoreError;

/// Errors from a full ingest run
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Csv(#[from] CsvStructureError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IngestError {
    /// Whether the upload itself was at fault
    pub fn is_client_fault(&self) -> bool {
        matches!(self, IngestError::Archive(_) | IngestError::Csv(_))
    }
}

/// Run the whole pipeline on one uploaded archive
#[tracing::instrument(skip(pool, upload), fields(kind = %kind, bytes = upload.len()))]
pub async fn run(pool: &PgPool, upload: &[u8], kind: ArchiveKind) -> Result<IngestOutcome, IngestError> {
    let payload = archive::extract(upload, kind)?;
    let batch = parser::parse(&payload)?;
    let total_count = batch.total_count;

    let report = storage::ingest_batch(pool, batch.records).await?;
    let outcome = IngestOutcome::new(total_count, report);

    info!(
        total_count = outcome.total_count,
        inserted = outcome.inserted,
        duplicates_count = outcome.duplicates_count,
        "Price list ingested"
    );

    Ok(outcome)
}

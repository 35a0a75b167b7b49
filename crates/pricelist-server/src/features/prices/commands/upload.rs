use serde::Deserialize;
use sqlx::PgPool;

use crate::ingest::{self, ArchiveError, ArchiveKind, IngestError, IngestOutcome};

#[derive(Debug, Clone, Deserialize)]
pub struct UploadPricesCommand {
    /// Raw `type` query value; absent or empty means zip
    #[serde(rename = "type")]
    pub archive_type: Option<String>,
    #[serde(skip)]
    pub content: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadPricesError {
    #[error("Multipart field 'file' is required and cannot be empty")]
    FileRequired,
    #[error(transparent)]
    Ingest(#[from] IngestError),
}

impl From<ArchiveError> for UploadPricesError {
    fn from(err: ArchiveError) -> Self {
        Self::Ingest(IngestError::Archive(err))
    }
}

impl UploadPricesCommand {
    pub fn archive_kind(&self) -> Result<ArchiveKind, UploadPricesError> {
        match self.archive_type.as_deref().map(str::trim) {
            None | Some("") => Ok(ArchiveKind::default()),
            Some(raw) => Ok(raw.parse::<ArchiveKind>()?),
        }
    }

    pub fn validate(&self) -> Result<(), UploadPricesError> {
        self.archive_kind()?;
        if self.content.is_empty() {
            return Err(UploadPricesError::FileRequired);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, command), fields(archive_type = ?command.archive_type, bytes = command.content.len()))]
pub async fn handle(
    pool: PgPool,
    command: UploadPricesCommand,
) -> Result<IngestOutcome, UploadPricesError> {
    command.validate()?;
    let kind = command.archive_kind()?;

    Ok(ingest::run(&pool, &command.content, kind).await?)
}

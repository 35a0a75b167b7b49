//! Price list routes
//!
//! - `POST /prices?type=zip|tar` upload an archive (multipart field `file`)
//! - `GET /prices?start=&end=&min=&max=` download stored rows as `data.zip`
//! - `GET /prices/stats` table-wide aggregates

use axum::{
    extract::{multipart::MultipartError, Multipart, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use sqlx::PgPool;

use crate::api::response::ErrorResponse;
use crate::ingest::IngestError;

use super::{
    commands::{UploadPricesCommand, UploadPricesError},
    queries::{ExportPricesError, ExportPricesQuery, GetPriceStatsError},
};

/// Multipart field carrying the archive
pub const UPLOAD_FIELD: &str = "file";

/// Create price routes
pub fn prices_routes() -> Router<PgPool> {
    Router::new()
        .route("/", get(export_prices).post(upload_prices))
        .route("/stats", get(price_stats))
}

#[tracing::instrument(skip(db, command, multipart))]
async fn upload_prices(
    State(db): State<PgPool>,
    Query(mut command): Query<UploadPricesCommand>,
    mut multipart: Multipart,
) -> Result<Response, PriceApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            command.content = field.bytes().await?.to_vec();
            break;
        }
    }

    let outcome = super::commands::upload::handle(db, command).await?;

    Ok((StatusCode::OK, Json(outcome)).into_response())
}

#[tracing::instrument(skip(db))]
async fn export_prices(
    State(db): State<PgPool>,
    Query(query): Query<ExportPricesQuery>,
) -> Result<Response, PriceApiError> {
    let response = super::queries::export::handle(db, query).await?;

    tracing::debug!(rows = response.rows, "Prices exported via API");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/zip"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"data.zip\""),
        ],
        response.archive,
    )
        .into_response())
}

#[tracing::instrument(skip(db))]
async fn price_stats(State(db): State<PgPool>) -> Result<Response, PriceApiError> {
    let stats = super::queries::stats::handle(db).await?;
    Ok((StatusCode::OK, Json(stats)).into_response())
}

#[derive(Debug, thiserror::Error)]
enum PriceApiError {
    #[error("Failed to read multipart upload: {0}")]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Upload(#[from] UploadPricesError),
    #[error(transparent)]
    Export(#[from] ExportPricesError),
    #[error(transparent)]
    Stats(#[from] GetPriceStatsError),
}

impl IntoResponse for PriceApiError {
    fn into_response(self) -> Response {
        match self {
            PriceApiError::Multipart(ref err) => {
                let status = err.status();
                ErrorResponse::new("INVALID_UPLOAD", self.to_string()).with_status(status)
            },
            PriceApiError::Upload(UploadPricesError::FileRequired) => {
                ErrorResponse::new("VALIDATION_ERROR", self.to_string())
                    .with_status(StatusCode::BAD_REQUEST)
            },
            PriceApiError::Upload(UploadPricesError::Ingest(IngestError::Archive(_))) => {
                ErrorResponse::new("INVALID_ARCHIVE", self.to_string())
                    .with_status(StatusCode::BAD_REQUEST)
            },
            PriceApiError::Upload(UploadPricesError::Ingest(IngestError::Csv(_))) => {
                ErrorResponse::new("INVALID_CSV", self.to_string())
                    .with_status(StatusCode::BAD_REQUEST)
            },
            PriceApiError::Upload(UploadPricesError::Ingest(IngestError::Store(ref err))) => {
                tracing::error!(error = %err, "Price list ingestion failed");
                ErrorResponse::new("INGESTION_FAILED", "Ingestion failed")
                    .with_status(StatusCode::INTERNAL_SERVER_ERROR)
            },

            PriceApiError::Export(
                ExportPricesError::InvalidDate { .. }
                | ExportPricesError::InvalidPrice { .. }
                | ExportPricesError::DateRangeInverted
                | ExportPricesError::PriceRangeInverted,
            ) => ErrorResponse::new("VALIDATION_ERROR", self.to_string())
                .with_status(StatusCode::BAD_REQUEST),
            PriceApiError::Export(ref err) => {
                tracing::error!(error = %err, "Price export failed");
                ErrorResponse::new("EXPORT_FAILED", "Export failed")
                    .with_status(StatusCode::INTERNAL_SERVER_ERROR)
            },

            PriceApiError::Stats(ref err) => {
                tracing::error!(error = %err, "Price stats query failed");
                ErrorResponse::new("INTERNAL_ERROR", "A database error occurred")
                    .with_status(StatusCode::INTERNAL_SERVER_ERROR)
            },
        }
    }
}

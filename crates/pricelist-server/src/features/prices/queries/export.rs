//! Export stored prices as a zipped CSV
//!
//! `GET /prices?start=&end=&min=&max=`, every bound optional and inclusive.

use std::io::{Cursor, Write};

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use pricelist_common::types::{format_date, format_price, parse_amount, parse_date};
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

/// Name of the CSV entry inside the export archive
pub const EXPORT_ENTRY_NAME: &str = "data.csv";

/// Header row of the exported CSV
pub const EXPORT_HEADER: [&str; 5] = ["id", "name", "category", "price", "create_date"];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportPricesQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
}

/// Parsed, checked filter bounds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub min: Option<BigDecimal>,
    pub max: Option<BigDecimal>,
}

/// Zip archive ready to send
#[derive(Debug, Clone)]
pub struct ExportPricesResponse {
    pub archive: Vec<u8>,
    pub rows: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportPricesError {
    #[error("Invalid '{field}' date '{value}': expected YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },
    #[error("Invalid '{field}' price '{value}': expected a number below 100000000")]
    InvalidPrice { field: &'static str, value: String },
    #[error("'start' must not be after 'end'")]
    DateRangeInverted,
    #[error("'min' must not be greater than 'max'")]
    PriceRangeInverted,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Failed to build export archive: {0}")]
    Archive(String),
}

impl From<csv::Error> for ExportPricesError {
    fn from(err: csv::Error) -> Self {
        Self::Archive(err.to_string())
    }
}

impl From<zip::result::ZipError> for ExportPricesError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Archive(err.to_string())
    }
}

impl From<std::io::Error> for ExportPricesError {
    fn from(err: std::io::Error) -> Self {
        Self::Archive(err.to_string())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PriceRow {
    id: i64,
    name: String,
    category: String,
    price: BigDecimal,
    create_date: NaiveDate,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn date_bound(field: &'static str, value: &Option<String>) -> Result<Option<NaiveDate>, ExportPricesError> {
    present(value)
        .map(|raw| {
            parse_date(raw).map_err(|_| ExportPricesError::InvalidDate {
                field,
                value: raw.to_string(),
            })
        })
        .transpose()
}

fn price_bound(field: &'static str, value: &Option<String>) -> Result<Option<BigDecimal>, ExportPricesError> {
    present(value)
        .map(|raw| {
            parse_amount(raw).map_err(|_| ExportPricesError::InvalidPrice {
                field,
                value: raw.to_string(),
            })
        })
        .transpose()
}

impl ExportPricesQuery {
    /// Parse the bounds; empty values count as absent
    pub fn validate(&self) -> Result<PriceFilter, ExportPricesError> {
        let filter = PriceFilter {
            start: date_bound("start", &self.start)?,
            end: date_bound("end", &self.end)?,
            min: price_bound("min", &self.min)?,
            max: price_bound("max", &self.max)?,
        };

        if let (Some(start), Some(end)) = (&filter.start, &filter.end) {
            if start > end {
                return Err(ExportPricesError::DateRangeInverted);
            }
        }
        if let (Some(min), Some(max)) = (&filter.min, &filter.max) {
            if min > max {
                return Err(ExportPricesError::PriceRangeInverted);
            }
        }

        Ok(filter)
    }
}

impl PriceFilter {
    fn build_query(&self) -> QueryBuilder<'_, Postgres> {
        let mut builder =
            QueryBuilder::new("SELECT id, name, category, price, create_date FROM prices");
        let mut keyword = " WHERE ";

        if let Some(start) = self.start {
            builder.push(keyword).push("create_date >= ").push_bind(start);
            keyword = " AND ";
        }
        if let Some(end) = self.end {
            builder.push(keyword).push("create_date <= ").push_bind(end);
            keyword = " AND ";
        }
        if let Some(ref min) = self.min {
            builder.push(keyword).push("price >= ").push_bind(min);
            keyword = " AND ";
        }
        if let Some(ref max) = self.max {
            builder.push(keyword).push("price <= ").push_bind(max);
        }

        builder.push(" ORDER BY id");
        builder
    }
}

#[tracing::instrument(skip(pool))]
pub async fn handle(
    pool: PgPool,
    query: ExportPricesQuery,
) -> Result<ExportPricesResponse, ExportPricesError> {
    let filter = query.validate()?;

    let mut builder = filter.build_query();
    let rows: Vec<PriceRow> = builder.build_query_as().fetch_all(&pool).await?;
    let archive = write_archive(&rows)?;

    tracing::debug!(rows = rows.len(), bytes = archive.len(), "Built price export");

    Ok(ExportPricesResponse {
        archive,
        rows: rows.len(),
    })
}

fn write_csv(rows: &[PriceRow]) -> Result<Vec<u8>, ExportPricesError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER)?;

    for row in rows {
        writer.write_record([
            row.id.to_string(),
            row.name.clone(),
            row.category.clone(),
            format_price(&row.price),
            format_date(row.create_date),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportPricesError::Archive(e.to_string()))
}

fn write_archive(rows: &[PriceRow]) -> Result<Vec<u8>, ExportPricesError> {
    let csv = write_csv(rows)?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(EXPORT_ENTRY_NAME, options)?;
    zip.write_all(&csv)?;

    Ok(zip.finish()?.into_inner())
}

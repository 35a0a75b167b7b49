//! Data models for price list ingestion

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Serialize, Serializer};

/// A validated, normalized row ready for insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRecord {
    /// 1-based line of the row in the uploaded CSV (line 1 is the header)
    pub line: u64,
    /// Identifier column from the CSV; validated but never persisted
    pub source_id: i64,
    pub name: String,
    pub category: String,
    /// Rounded to two fractional digits
    pub price: BigDecimal,
    pub create_date: NaiveDate,
}

impl PriceRecord {
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey {
            name: self.name.clone(),
            category: self.category.clone(),
            price: self.price.clone(),
            create_date: self.create_date,
        }
    }
}

/// Columns that make two rows the same price entry, independent of `id`
#[derive(Debug, Clone, PartialEq, Eq, Hash, sqlx::FromRow)]
pub struct IdentityKey {
    pub name: String,
    pub category: String,
    pub price: BigDecimal,
    pub create_date: NaiveDate,
}

/// Result of validating one uploaded CSV
#[derive(Debug, Clone, Default)]
pub struct ParsedBatch {
    /// Data rows seen, valid or not
    pub total_count: u64,
    /// Rows that passed every check, in file order
    pub records: Vec<PriceRecord>,
}

impl ParsedBatch {
    pub fn rejected(&self) -> u64 {
        self.total_count - self.records.len() as u64
    }
}

/// Table-wide aggregates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TableStats {
    pub total_items: i64,
    pub total_categories: i64,
    #[serde(serialize_with = "serialize_decimal")]
    pub total_price: BigDecimal,
    /// Rows beyond the first in every identity group
    pub duplicates_count: i64,
}

/// What the coordinator did with a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub inserted: u64,
    pub duplicates: u64,
    pub stats: TableStats,
}

/// Response body for an upload
///
/// Field order is the serialization order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    pub total_count: u64,
    pub duplicates_count: u64,
    pub total_items: i64,
    pub total_categories: i64,
    #[serde(serialize_with = "serialize_decimal")]
    pub total_price: BigDecimal,
    pub inserted: u64,
}

impl IngestOutcome {
    pub fn new(total_count: u64, report: BatchReport) -> Self {
        Self {
            total_count,
            duplicates_count: report.duplicates,
            total_items: report.stats.total_items,
            total_categories: report.stats.total_categories,
            total_price: report.stats.total_price,
            inserted: report.inserted,
        }
    }
}

/// Emit a decimal as a JSON number
fn serialize_decimal<S: Serializer>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error> {
    let number = value
        .to_string()
        .parse::<f64>()
        .map_err(serde::ser::Error::custom)?;
    serializer.serialize_f64(number)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn record(line: u64, source_id: i64) -> PriceRecord {
        PriceRecord {
            line,
            source_id,
            name: "apple".to_string(),
            category: "fruit".to_string(),
            price: BigDecimal::from_str("10.00").unwrap(),
            create_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    #[test]
    fn test_identity_key_ignores_id_and_line() {
        assert_eq!(record(2, 1).identity_key(), record(9, 77).identity_key());
    }

    #[test]
    fn test_outcome_serialization_order() {
        let outcome = IngestOutcome::new(
            3,
            BatchReport {
                inserted: 2,
                duplicates: 1,
                stats: TableStats {
                    total_items: 5,
                    total_categories: 2,
                    total_price: BigDecimal::from_str("30.50").unwrap(),
                    duplicates_count: 0,
                },
            },
        );

        let json = serde_json::to_string(&outcome).unwrap();
        assert_eq!(
            json,
            r#"{"total_count":3,"duplicates_count":1,"total_items":5,"total_categories":2,"total_price":30.5,"inserted":2}"#
        );
    }

    #[test]
    fn test_rejected_count() {
        let batch = ParsedBatch {
            total_count: 4,
            records: vec![record(2, 1)],
        };
        assert_eq!(batch.rejected(), 3);
    }
}

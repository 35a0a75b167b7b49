//! CSV price list parser
//!
//! Turns the extracted payload into validated [`PriceRecord`]s. The first line is always a
//! header. Data rows that fail any check are dropped and only counted; the caller never sees
//! per-row diagnostics.
//!
//! Row checks, first failure wins:
//! 0. every field is valid UTF-8
//! 1. at least 5 fields (`id,name,category,price,create_date`)
//! 2. `id` is an integer
//! 3. `name` and `category` are non-empty
//! 4. `price` is a positive number (rounded to cents)
//! 5. `create_date` is a valid `YYYY-MM-DD` date

use csv::{ByteRecord, ReaderBuilder, StringRecord, Trim};
use pricelist_common::types::{parse_date, parse_identifier, parse_price};
use pricelist_common::ParseError;
use thiserror::Error;
use tracing::debug;

use super::models::{ParsedBatch, PriceRecord};

/// Minimum number of fields a data row must carry
pub const MIN_FIELDS: usize = 5;

/// The payload could not be read as a CSV price list at all
#[derive(Debug, Error)]
pub enum CsvStructureError {
    #[error("Malformed CSV: {0}")]
    MalformedCsv(String),
}

/// Why a single row was dropped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowRejection {
    #[error("field is not valid UTF-8")]
    InvalidEncoding,
    #[error("expected at least 5 fields, found {0}")]
    TooFewFields(usize),
    #[error("invalid id: {0}")]
    InvalidId(ParseError),
    #[error("name is empty")]
    EmptyName,
    #[error("category is empty")]
    EmptyCategory,
    #[error("invalid price: {0}")]
    InvalidPrice(ParseError),
    #[error("invalid create_date: {0}")]
    InvalidDate(ParseError),
}

/// Parse and validate a CSV payload
#[tracing::instrument(skip(data), fields(bytes = data.len()))]
pub fn parse(data: &[u8]) -> Result<ParsedBatch, CsvStructureError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(data);

    let mut batch = ParsedBatch::default();

    for result in reader.byte_records() {
        let row = result.map_err(|e| CsvStructureError::MalformedCsv(e.to_string()))?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        batch.total_count += 1;

        match decode_row(row).and_then(|row| validate_row(line, &row)) {
            Ok(record) => batch.records.push(record),
            Err(reason) => debug!(line, %reason, "Rejected CSV row"),
        }
    }

    if batch.total_count == 0 {
        return Err(CsvStructureError::MalformedCsv(
            "no data rows after the header".to_string(),
        ));
    }

    debug!(
        total_count = batch.total_count,
        valid = batch.records.len(),
        rejected = batch.rejected(),
        "Parsed CSV payload"
    );

    Ok(batch)
}

/// Decode a raw row; a row with any non-UTF-8 field is rejected on its own
fn decode_row(row: ByteRecord) -> Result<StringRecord, RowRejection> {
    StringRecord::from_byte_record(row).map_err(|_| RowRejection::InvalidEncoding)
}

/// Validate one data row
pub fn validate_row(line: u64, row: &StringRecord) -> Result<PriceRecord, RowRejection> {
    if row.len() < MIN_FIELDS {
        return Err(RowRejection::TooFewFields(row.len()));
    }

    let source_id = parse_identifier(&row[0]).map_err(RowRejection::InvalidId)?;

    let name = row[1].trim();
    if name.is_empty() {
        return Err(RowRejection::EmptyName);
    }
    let category = row[2].trim();
    if category.is_empty() {
        return Err(RowRejection::EmptyCategory);
    }

    let price = parse_price(&row[3]).map_err(RowRejection::InvalidPrice)?;
    let create_date = parse_date(&row[4]).map_err(RowRejection::InvalidDate)?;

    Ok(PriceRecord {
        line,
        source_id,
        name: name.to_string(),
        category: category.to_string(),
        price,
        create_date,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pricelist_common::types::format_price;

    const HEADER: &str = "id,name,category,price,create_date\n";

    fn csv(rows: &str) -> Vec<u8> {
        format!("{}{}", HEADER, rows).into_bytes()
    }

    #[test]
    fn test_parse_valid_rows() {
        let batch = parse(&csv("1,apple,fruit,10,2024-01-01\n2, pear , fruit ,20.5,2024-01-02\n"))
            .unwrap();

        assert_eq!(batch.total_count, 2);
        assert_eq!(batch.records.len(), 2);

        let pear = &batch.records[1];
        assert_eq!(pear.line, 3);
        assert_eq!(pear.source_id, 2);
        assert_eq!(pear.name, "pear");
        assert_eq!(pear.category, "fruit");
        assert_eq!(format_price(&pear.price), "20.50");
        assert_eq!(pear.create_date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn test_parse_counts_rejected_rows() {
        let rows = "\
1,apple,fruit,10,2024-01-01
x,bad-id,fruit,10,2024-01-01
3,,fruit,10,2024-01-01
4,empty-category,,10,2024-01-01
5,zero,fruit,0,2024-01-01
6,negative,fruit,-5,2024-01-01
7,word,fruit,ten,2024-01-01
8,bad-date,fruit,10,2024-02-30
9,short,fruit,10
10,kiwi,fruit,3.333,2024-03-01,extra
";
        let batch = parse(&csv(rows)).unwrap();

        assert_eq!(batch.total_count, 10);
        let names: Vec<_> = batch.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["apple", "kiwi"]);
        assert_eq!(format_price(&batch.records[1].price), "3.33");
        assert_eq!(batch.rejected(), 8);
    }

    #[test]
    fn test_parse_header_only_is_malformed() {
        assert!(matches!(
            parse(HEADER.as_bytes()),
            Err(CsvStructureError::MalformedCsv(_))
        ));
    }

    #[test]
    fn test_parse_empty_is_malformed() {
        assert!(matches!(parse(b""), Err(CsvStructureError::MalformedCsv(_))));
    }

    #[test]
    fn test_parse_rejects_only_invalid_utf8_rows() {
        let mut data = csv("1,apple,fruit,10,2024-01-01\n2,pear,fruit,20,2024-01-02\n");
        data.extend_from_slice(b"3,caf\xe9,drinks,5,2024-01-03\n");
        data.extend_from_slice(b"4,plum,fruit,30,2024-01-04\n");

        let batch = parse(&data).unwrap();
        assert_eq!(batch.total_count, 4);
        let names: Vec<_> = batch.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["apple", "pear", "plum"]);
        assert_eq!(batch.records[2].line, 5);
    }

    #[test]
    fn test_parse_all_rows_invalid_utf8_still_counts() {
        let mut data = csv("");
        data.extend_from_slice(b"1,\xff\xfe,fruit,10,2024-01-01\n");

        let batch = parse(&data).unwrap();
        assert_eq!(batch.total_count, 1);
        assert!(batch.records.is_empty());
        assert!(matches!(
            decode_row(ByteRecord::from(vec![&b"\xff"[..]])),
            Err(RowRejection::InvalidEncoding)
        ));
    }

    #[test]
    fn test_parse_rejects_exponent_overflow_rows() {
        let rows = "\
1,apple,fruit,10,2024-01-01
2,bomb,fruit,1e999999999999,2024-01-01
3,tiny,fruit,1e-999999999999,2024-01-01
4,pear,fruit,20,2024-01-02
";
        let batch = parse(&csv(rows)).unwrap();

        assert_eq!(batch.total_count, 4);
        let names: Vec<_> = batch.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["apple", "pear"]);

        let row = StringRecord::from(vec!["2", "bomb", "fruit", "1e999999999999", "2024-01-01"]);
        assert!(matches!(
            validate_row(3, &row),
            Err(RowRejection::InvalidPrice(ParseError::OutOfRange(_)))
        ));
    }

    #[test]
    fn test_validate_row_check_order() {
        // Bad id and bad price: the id check runs first
        let row = StringRecord::from(vec!["x", "apple", "fruit", "-1", "nope"]);
        assert!(matches!(validate_row(2, &row), Err(RowRejection::InvalidId(_))));

        let row = StringRecord::from(vec!["1", "apple", "fruit", "-1", "nope"]);
        assert!(matches!(
            validate_row(2, &row),
            Err(RowRejection::InvalidPrice(ParseError::NonPositivePrice(_)))
        ));

        let row = StringRecord::from(vec!["1", "apple", "fruit", "1", "nope"]);
        assert!(matches!(validate_row(2, &row), Err(RowRejection::InvalidDate(_))));

        let row = StringRecord::from(vec!["1", "apple"]);
        assert_eq!(validate_row(2, &row), Err(RowRejection::TooFewFields(2)));
    }
}

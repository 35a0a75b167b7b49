//! Value formats shared by ingestion and export
//!
//! Prices are decimals stored with two fractional digits, dates are plain calendar dates in
//! `YYYY-MM-DD` form, and row identifiers are signed 64-bit integers.

use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::NaiveDate;

use crate::error::{ParseError, Result};

/// chrono format string for calendar dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Number of fractional digits kept for prices (matches `NUMERIC(10,2)`)
pub const PRICE_SCALE: i64 = 2;

/// Integer digits a price column can hold (`NUMERIC(10,2)` leaves 8)
pub const PRICE_INTEGER_DIGITS: i64 = 8;

/// Largest fractional scale accepted before rounding
///
/// Bounds the work `with_scale_round` does on inputs like `1e-999999999`.
pub const MAX_INPUT_SCALE: i64 = 32;

/// Longest numeric text handed to the decimal parser
pub const MAX_NUMBER_LEN: usize = 64;

/// Parse a row identifier
pub fn parse_identifier(raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ParseError::InvalidInteger(raw.to_string()))
}

/// Parse a decimal number whose magnitude fits a price column, without rounding
///
/// The exponent is checked before any rescaling, so `1e999999999999` is rejected as
/// [`ParseError::OutOfRange`] instead of being expanded digit by digit.
pub fn parse_amount(raw: &str) -> Result<BigDecimal> {
    let trimmed = raw.trim();
    if trimmed.len() > MAX_NUMBER_LEN {
        return Err(ParseError::OutOfRange(raw.to_string()));
    }

    let value = BigDecimal::from_str(trimmed)
        .map_err(|_| ParseError::InvalidNumber(raw.to_string()))?;

    let (_, scale) = value.as_bigint_and_exponent();
    if scale > MAX_INPUT_SCALE || integer_digits(&value) > PRICE_INTEGER_DIGITS {
        return Err(ParseError::OutOfRange(raw.to_string()));
    }

    Ok(value)
}

/// Parse any decimal number and round it to [`PRICE_SCALE`] digits
///
/// Rounding is half away from zero, the same rule PostgreSQL applies when a value is
/// cast to `NUMERIC(10,2)`, so in-memory values compare equal to what the store keeps.
/// Values that do not fit the column after rounding are [`ParseError::OutOfRange`].
pub fn parse_decimal(raw: &str) -> Result<BigDecimal> {
    let value = parse_amount(raw)?.with_scale_round(PRICE_SCALE, RoundingMode::HalfUp);

    // 99999999.995 passes the digit check but rounds up to 100000000.00
    if integer_digits(&value) > PRICE_INTEGER_DIGITS {
        return Err(ParseError::OutOfRange(raw.to_string()));
    }

    Ok(value)
}

/// Parse a price: a decimal that is strictly positive after rounding
pub fn parse_price(raw: &str) -> Result<BigDecimal> {
    let value = parse_decimal(raw)?;
    if value <= BigDecimal::from(0) {
        return Err(ParseError::NonPositivePrice(raw.to_string()));
    }
    Ok(value)
}

/// Digits left of the decimal point, negative for values below 0.1
fn integer_digits(value: &BigDecimal) -> i64 {
    let (_, scale) = value.as_bigint_and_exponent();
    i64::try_from(value.digits())
        .unwrap_or(i64::MAX)
        .saturating_sub(scale)
}

/// Parse a `YYYY-MM-DD` calendar date
///
/// The shape is checked before handing off to chrono, which would otherwise accept
/// unpadded months and days such as `2024-1-5`.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    let bytes = trimmed.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });

    if !well_formed {
        return Err(ParseError::InvalidDate(raw.to_string()));
    }

    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| ParseError::InvalidDate(raw.to_string()))
}

/// Render a date as `YYYY-MM-DD`
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Render a price with exactly [`PRICE_SCALE`] fractional digits
pub fn format_price(price: &BigDecimal) -> String {
    price
        .with_scale_round(PRICE_SCALE, RoundingMode::HalfUp)
        .to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_identifier() {
        assert_eq!(parse_identifier("42").unwrap(), 42);
        assert_eq!(parse_identifier(" 7 ").unwrap(), 7);
        assert_eq!(parse_identifier("-3").unwrap(), -3);
        assert!(parse_identifier("4.2").is_err());
        assert!(parse_identifier("abc").is_err());
        assert!(parse_identifier("").is_err());
    }

    #[test]
    fn test_parse_price_rounds_to_cents() {
        assert_eq!(format_price(&parse_price("10").unwrap()), "10.00");
        assert_eq!(format_price(&parse_price("19.999").unwrap()), "20.00");
        assert_eq!(format_price(&parse_price("1.005").unwrap()), "1.01");
        assert_eq!(format_price(&parse_price(" 3.5 ").unwrap()), "3.50");
    }

    #[test]
    fn test_parse_price_rejects_non_positive() {
        assert_eq!(
            parse_price("0"),
            Err(ParseError::NonPositivePrice("0".to_string()))
        );
        assert!(matches!(parse_price("-1.50"), Err(ParseError::NonPositivePrice(_))));
        // rounds to 0.00
        assert!(matches!(parse_price("0.004"), Err(ParseError::NonPositivePrice(_))));
    }

    #[test]
    fn test_parse_price_rejects_garbage() {
        for raw in ["", "abc", "1,50", "NaN", "inf", "12.3.4"] {
            assert!(
                matches!(parse_price(raw), Err(ParseError::InvalidNumber(_))),
                "'{}' should not parse",
                raw
            );
        }
    }

    #[test]
    fn test_parse_price_rejects_exponent_overflow() {
        for raw in ["1e999999999999", "1e5000000", "-1e5000000", "1e-999999999999", "1E9"] {
            assert_eq!(
                parse_price(raw),
                Err(ParseError::OutOfRange(raw.to_string())),
                "'{}' should be out of range",
                raw
            );
        }
    }

    #[test]
    fn test_parse_price_column_bounds() {
        assert_eq!(format_price(&parse_price("99999999.99").unwrap()), "99999999.99");
        assert_eq!(format_price(&parse_price("1.5e3").unwrap()), "1500.00");
        assert_eq!(format_price(&parse_price("0.00000001e8").unwrap()), "1.00");
        assert!(matches!(parse_price("100000000"), Err(ParseError::OutOfRange(_))));
        assert!(matches!(parse_price("99999999.995"), Err(ParseError::OutOfRange(_))));
    }

    #[test]
    fn test_parse_amount_keeps_precision() {
        assert_eq!(parse_amount("15.125").unwrap().to_string(), "15.125");
        assert_eq!(parse_amount("-3").unwrap(), BigDecimal::from(-3));
        assert!(matches!(parse_amount("1e999999999"), Err(ParseError::OutOfRange(_))));
        assert!(matches!(parse_amount("12.3.4"), Err(ParseError::InvalidNumber(_))));
        let long = format!("1{}", "0".repeat(MAX_NUMBER_LEN));
        assert!(matches!(parse_amount(&long), Err(ParseError::OutOfRange(_))));
    }

    #[test]
    fn test_parse_decimal_allows_zero_and_negative() {
        assert_eq!(format_price(&parse_decimal("0").unwrap()), "0.00");
        assert_eq!(format_price(&parse_decimal("-2.5").unwrap()), "-2.50");
    }

    #[test]
    fn test_parse_date() {
        let date = parse_date("2024-02-29").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(format_date(date), "2024-02-29");
        assert_eq!(parse_date(" 2024-01-05 ").unwrap(), NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    }

    #[test]
    fn test_parse_date_rejects_invalid() {
        for raw in [
            "2023-02-29",
            "2024-13-01",
            "2024-1-5",
            "2024/01/05",
            "05-01-2024",
            "2024-01-05T00:00:00",
            "",
        ] {
            assert!(
                matches!(parse_date(raw), Err(ParseError::InvalidDate(_))),
                "'{}' should not parse",
                raw
            );
        }
    }
}

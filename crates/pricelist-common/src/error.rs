//! Error types for value parsing

use thiserror::Error;

/// Result type alias for parsing operations
pub type Result<T> = std::result::Result<T, ParseError>;

/// A textual value that does not satisfy its expected format
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid integer: '{0}'")]
    InvalidInteger(String),

    #[error("Invalid number: '{0}'")]
    InvalidNumber(String),

    #[error("Number out of range for a price: '{0}'")]
    OutOfRange(String),

    #[error("Price must be greater than zero, got '{0}'")]
    NonPositivePrice(String),

    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),
}

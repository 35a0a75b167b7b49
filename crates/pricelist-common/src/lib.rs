//! Pricelist Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared value types, parsing rules, and logging bootstrap for the pricelist workspace.
//!
//! # Overview
//!
//! - **Types**: the textual formats for prices, dates, and row identifiers that both the
//!   ingestion pipeline and the export filters accept
//! - **Error Handling**: [`ParseError`] for values that do not satisfy those formats
//! - **Logging**: `tracing` subscriber setup driven by environment variables
//!
//! # Example
//!
//! ```no_run
//! use pricelist_common::types::{parse_date, parse_price};
//!
//! let date = parse_date("2024-01-15")?;
//! let price = parse_price("19.999")?;
//! assert_eq!(price.to_string(), "20.00");
//! # Ok::<(), pricelist_common::ParseError>(())
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{ParseError, Result};

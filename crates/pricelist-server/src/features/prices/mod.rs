//! Prices feature: upload, export and aggregate statistics

pub mod commands;
pub mod queries;
pub mod routes;


pub use commands::{UploadPricesCommand, UploadPricesError};

pub use queries::{ExportPricesError, ExportPricesQuery, ExportPricesResponse, GetPriceStatsError};

pub use routes::prices_routes;

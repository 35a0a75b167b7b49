pub mod export;
pub mod stats;

pub use export::{ExportPricesError, ExportPricesQuery, ExportPricesResponse, PriceFilter};
pub use stats::GetPriceStatsError;

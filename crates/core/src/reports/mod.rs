//! Spending and income summaries.
//!
//! Aggregation over rows already fetched from the store:
//! - Totals (sum, count, average)
//! - Monthly totals keyed `YYYY-MM`

pub mod service;
pub mod types;


pub use service::ReportService;
pub use types::*;

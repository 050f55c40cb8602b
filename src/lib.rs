// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod aggregate;
pub mod api;
pub mod config;
pub mod export;
pub mod feed;
pub mod filter;
pub mod forecast;
pub mod metrics;
pub mod table;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{sentiment_label, DailyAggregate, Kpis, SentimentLabel};
pub use crate::api::{create_router, AppState};
pub use crate::filter::FilterSpec;
pub use crate::forecast::{ForecastError, ForecastPoint, ForecastSeries};
pub use crate::table::types::{Item, NormalizedTable, RawRecord, TableSource};

use anyhow::Result;
use axum::Router;

use crate::config::DashboardConfig;
use crate::table::loader::CsvFileSource;

/// Build the application router from environment/config, the same way the
/// binary does. Used by the HTTP integration tests.
pub async fn app() -> Result<Router> {
    let cfg = DashboardConfig::load()?;
    tracing::debug!(data_path = %cfg.data_path.display(), "building app router");
    let state = AppState::new(CsvFileSource::new(&cfg.data_path));
    Ok(api::create_router(state))
}

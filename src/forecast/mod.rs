// src/forecast/mod.rs
//! # Forecaster
//! One-shot batch extrapolation of the daily average sentiment series, with
//! confidence bounds, over a fixed 7-day horizon.
//!
//! Runs over the full (or source-filtered) history, independently of the
//! interactive filtering path; the async wrapper moves the fit off the
//! request executor so its latency never blocks filtering.

pub mod model;

use anyhow::Context;
use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregate::DailyAggregate;
pub use crate::forecast::model::{AdditiveModel, ForecastError, ForecastPoint, TrendModel};

/// Fixed horizon beyond the last observed date.
pub const HORIZON_DAYS: u32 = 7;

/// Forecast output: one point per calendar date in
/// `[first observed, last observed + horizon]`, tagged observed/forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSeries {
    pub last_observed: NaiveDate,
    pub horizon_days: u32,
    pub points: Vec<ForecastPoint>,
}

impl ForecastSeries {
    /// The points beyond the last observation — the shaded-band region.
    pub fn forecast_region(&self) -> impl Iterator<Item = &ForecastPoint> {
        self.points.iter().filter(|p| !p.observed)
    }
}

/// Fit the default additive model and extend the series by [`HORIZON_DAYS`].
pub fn forecast_daily(series: &[DailyAggregate]) -> Result<ForecastSeries, ForecastError> {
    let model = AdditiveModel::fit(series)?;
    let points = model.predict(HORIZON_DAYS);
    let last_observed = points
        .iter()
        .rev()
        .find(|p| p.observed)
        .map(|p| p.date)
        .unwrap_or_else(|| series.iter().map(|d| d.date).max().unwrap_or_default());
    Ok(ForecastSeries {
        last_observed,
        horizon_days: HORIZON_DAYS,
        points,
    })
}

/// [`forecast_daily`] on a blocking worker, isolated from the interactive
/// request path. The outer error covers task failure only; the forecast
/// outcome itself stays a typed `Result`.
pub async fn forecast_daily_blocking(
    series: Vec<DailyAggregate>,
) -> anyhow::Result<Result<ForecastSeries, ForecastError>> {
    tokio::task::spawn_blocking(move || forecast_daily(&series))
        .await
        .context("forecast task panicked")
}

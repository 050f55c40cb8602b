// src/forecast/model.rs
//! Additive trend + seasonality model for the daily sentiment series.
//!
//! The model is a pluggable strategy behind [`TrendModel`]: `fit` consumes
//! the observed daily aggregates, `predict` extends them over a horizon. The
//! default implementation is a classical additive decomposition — ordinary
//! least squares on the day index for the trend, centered day-of-week means
//! of the trend residuals for the seasonal component (only once the series
//! spans two weeks), residual standard deviation for the uncertainty band.
//!
//! The fitting procedure takes the sparse series as its native input: it
//! operates on the observed `(day index, mean)` pairs only and never
//! interpolates missing days.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::aggregate::DailyAggregate;

/// Interval multiplier for the ~95% band.
const Z_95: f64 = 1.96;
/// Minimum span before a weekly component is estimated.
const WEEKLY_MIN_SPAN_DAYS: i64 = 14;

/// Why a forecast could not be produced. Distinguishable failure results,
/// never a silently wrong numeric output.
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Fewer than two distinct observed dates.
    InsufficientHistory { observed: usize },
    /// The series cannot be fitted (non-finite values, duplicate dates).
    DegenerateSeries(String),
}

impl std::fmt::Display for ForecastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForecastError::InsufficientHistory { observed } => {
                write!(f, "insufficient history: {observed} observed day(s), need at least 2")
            }
            ForecastError::DegenerateSeries(why) => write!(f, "forecast unavailable: {why}"),
        }
    }
}

impl std::error::Error for ForecastError {}

/// One dated estimate with its confidence band.
/// Invariant: `lower_bound <= point_estimate <= upper_bound`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub point_estimate: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// True for dates up to the last observation; false in the forecast
    /// region, where the renderer shades the band.
    pub observed: bool,
}

/// Strategy seam for the forecasting procedure. The pipeline depends only on
/// this contract, not on the statistical internals.
pub trait TrendModel: Sized {
    fn fit(series: &[DailyAggregate]) -> Result<Self, ForecastError>;
    /// Points for every calendar date in `[first, last + horizon_days]`.
    fn predict(&self, horizon_days: u32) -> Vec<ForecastPoint>;
}

/// Default model: OLS linear trend + optional centered weekly component.
#[derive(Debug, Clone)]
pub struct AdditiveModel {
    first: NaiveDate,
    last: NaiveDate,
    n: usize,
    intercept: f64,
    slope: f64,
    /// Residual mean per weekday (Mon..Sun), present once the series spans
    /// [`WEEKLY_MIN_SPAN_DAYS`].
    weekly: Option<[f64; 7]>,
    sigma: f64,
}

impl AdditiveModel {
    fn estimate(&self, date: NaiveDate) -> f64 {
        let t = (date - self.first).num_days() as f64;
        let seasonal = self
            .weekly
            .map(|w| w[date.weekday().num_days_from_monday() as usize])
            .unwrap_or(0.0);
        self.intercept + self.slope * t + seasonal
    }

    /// Half-width of the band at `date`: flat in-sample, widening with the
    /// number of steps past the last observation.
    fn half_width(&self, date: NaiveDate) -> f64 {
        let steps_beyond = (date - self.last).num_days().max(0) as f64;
        Z_95 * self.sigma * (1.0 + steps_beyond / self.n as f64).sqrt()
    }
}

impl TrendModel for AdditiveModel {
    fn fit(series: &[DailyAggregate]) -> Result<Self, ForecastError> {
        let mut obs: Vec<(NaiveDate, f64)> =
            series.iter().map(|d| (d.date, d.mean_score)).collect();
        obs.sort_by_key(|(date, _)| *date);
        obs.dedup_by_key(|(date, _)| *date);
        if obs.len() != series.len() {
            return Err(ForecastError::DegenerateSeries(
                "duplicate dates in daily series".into(),
            ));
        }
        if obs.len() < 2 {
            return Err(ForecastError::InsufficientHistory { observed: obs.len() });
        }
        if obs.iter().any(|(_, y)| !y.is_finite()) {
            return Err(ForecastError::DegenerateSeries(
                "non-finite value in daily series".into(),
            ));
        }

        let first = obs[0].0;
        let last = obs[obs.len() - 1].0;
        let n = obs.len();

        // Trend: ordinary least squares on days-since-first. Gaps simply
        // contribute nothing.
        let pts: Vec<(f64, f64)> = obs
            .iter()
            .map(|(date, y)| ((*date - first).num_days() as f64, *y))
            .collect();
        let t_mean = pts.iter().map(|(t, _)| t).sum::<f64>() / n as f64;
        let y_mean = pts.iter().map(|(_, y)| y).sum::<f64>() / n as f64;
        let sxx: f64 = pts.iter().map(|(t, _)| (t - t_mean).powi(2)).sum();
        let sxy: f64 = pts.iter().map(|(t, y)| (t - t_mean) * (y - y_mean)).sum();
        let slope = sxy / sxx;
        let intercept = y_mean - slope * t_mean;

        // Weekly component from trend residuals, once two weeks are spanned.
        let weekly = if (last - first).num_days() >= WEEKLY_MIN_SPAN_DAYS {
            let mut sums = [0.0f64; 7];
            let mut counts = [0usize; 7];
            for ((date, y), (t, _)) in obs.iter().zip(&pts) {
                let wd = date.weekday().num_days_from_monday() as usize;
                sums[wd] += y - (intercept + slope * t);
                counts[wd] += 1;
            }
            let mut comps = [0.0f64; 7];
            let mut used = 0usize;
            let mut used_sum = 0.0f64;
            for wd in 0..7 {
                if counts[wd] > 0 {
                    comps[wd] = sums[wd] / counts[wd] as f64;
                    used += 1;
                    used_sum += comps[wd];
                }
            }
            // Center so the component shifts within the week, not the level.
            let center = used_sum / used as f64;
            for c in comps.iter_mut() {
                *c -= center;
            }
            Some(comps)
        } else {
            None
        };

        let mut model = Self {
            first,
            last,
            n,
            intercept,
            slope,
            weekly,
            sigma: 0.0,
        };

        let params = 2 + if model.weekly.is_some() { 6 } else { 0 };
        let dof = n.saturating_sub(params).max(1);
        let sse: f64 = obs
            .iter()
            .map(|(date, y)| (y - model.estimate(*date)).powi(2))
            .sum();
        model.sigma = (sse / dof as f64).sqrt();

        if !(model.slope.is_finite() && model.intercept.is_finite() && model.sigma.is_finite()) {
            return Err(ForecastError::DegenerateSeries(
                "fit did not converge to finite parameters".into(),
            ));
        }
        Ok(model)
    }

    fn predict(&self, horizon_days: u32) -> Vec<ForecastPoint> {
        let end = self.last + chrono::Days::new(horizon_days as u64);
        self.first
            .iter_days()
            .take_while(|d| *d <= end)
            .map(|date| {
                let point_estimate = self.estimate(date);
                let half = self.half_width(date);
                ForecastPoint {
                    date,
                    point_estimate,
                    lower_bound: point_estimate - half,
                    upper_bound: point_estimate + half,
                    observed: date <= self.last,
                }
            })
            .collect()
    }
}

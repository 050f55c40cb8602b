use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{AppendHeaders, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::aggregate::{self, DailyAggregate, Kpis, SourceAverage};
use crate::export;
use crate::feed::{self, AlertRow, FeedEntry};
use crate::filter::{self, FilterSpec};
use crate::forecast::{self, ForecastError};
use crate::table::{
    self,
    cache::{CacheOutcome, TableCache},
    types::{NormalizeReport, NormalizedTable, TableSource},
};

/// Diagnostic header reporting table memoization per request.
const CACHE_HEADER: &str = "x-table-cache";

#[derive(Clone)]
pub struct AppState {
    source: Arc<dyn TableSource>,
    cache: Arc<TableCache>,
}

impl AppState {
    pub fn new(source: impl TableSource + 'static) -> Self {
        Self {
            source: Arc::new(source),
            cache: Arc::new(TableCache::new()),
        }
    }

    async fn snapshot(&self) -> anyhow::Result<(Arc<NormalizedTable>, CacheOutcome)> {
        table::load_cached(self.source.as_ref(), &self.cache).await
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/dashboard", get(dashboard))
        .route("/api/forecast", get(forecast_handler))
        .route("/api/export", get(export_csv))
        .route("/admin/refresh", get(admin_refresh))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Internal failures map to 500 with the error chain; domain outcomes
/// (empty views, unavailable forecast) are structured responses, not errors.
struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = ?self.0, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", self.0)).into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

#[derive(Debug, Default, serde::Deserialize)]
struct ViewQuery {
    /// Inclusive range start; defaults to the first date in the table.
    start: Option<NaiveDate>,
    /// Inclusive range end; defaults to the last date in the table.
    end: Option<NaiveDate>,
    keyword: Option<String>,
    /// Comma-separated allow-list. Absent = no restriction; present but
    /// empty = empty selection, which matches nothing.
    sources: Option<String>,
    alerts_only: Option<bool>,
}

fn resolve_spec(table: &NormalizedTable, q: &ViewQuery) -> Option<FilterSpec> {
    let mut spec = FilterSpec::allow_all(table)?;
    if let Some(s) = q.start {
        spec.date_range.0 = s;
    }
    if let Some(e) = q.end {
        spec.date_range.1 = e;
    }
    if let Some(k) = &q.keyword {
        spec.keyword = k.clone();
    }
    if let Some(raw) = &q.sources {
        spec.sources = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
    }
    spec.alerts_only = q.alerts_only.unwrap_or(false);
    Some(spec)
}

#[derive(Serialize)]
struct TableSummary {
    report: NormalizeReport,
    sources: Vec<String>,
    date_span: Option<(NaiveDate, NaiveDate)>,
}

/// Everything the dashboard renders for one filter interaction. Plain
/// structured records; no formatting embedded.
#[derive(Serialize)]
struct DashboardView {
    kpis: Kpis,
    daily: Vec<DailyAggregate>,
    top_sources: Vec<SourceAverage>,
    alerts: Vec<AlertRow>,
    feed: Vec<FeedEntry>,
    matched: usize,
    /// The spec actually applied; `None` when the table was empty and there
    /// was nothing to filter.
    applied: Option<FilterSpec>,
    table: TableSummary,
}

async fn dashboard(
    State(state): State<AppState>,
    Query(q): Query<ViewQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (table, outcome) = state.snapshot().await?;

    let (items, applied) = match resolve_spec(&table, &q) {
        Some(spec) => (filter::apply(&table, &spec), Some(spec)),
        None => (Vec::new(), None),
    };

    let view = DashboardView {
        kpis: aggregate::kpis(&items),
        daily: aggregate::daily_series(&items),
        top_sources: aggregate::top_sources(&items),
        alerts: feed::alerts(&items),
        feed: feed::feed(&items),
        matched: items.len(),
        applied,
        table: TableSummary {
            report: table.report,
            sources: table.sources(),
            date_span: table.date_span(),
        },
    };

    Ok((
        AppendHeaders([(CACHE_HEADER, outcome.as_str())]),
        Json(view),
    ))
}

#[derive(Debug, Default, serde::Deserialize)]
struct ForecastQuery {
    /// Optional comma-separated source restriction; the forecast otherwise
    /// runs over the full history, independent of the interactive filters.
    sources: Option<String>,
}

async fn forecast_handler(
    State(state): State<AppState>,
    Query(q): Query<ForecastQuery>,
) -> Result<Response, AppError> {
    let (table, _) = state.snapshot().await?;

    let daily = match &q.sources {
        None => aggregate::daily_series(&table.items),
        Some(raw) => {
            let allowed: std::collections::BTreeSet<&str> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            let restricted: Vec<_> = table
                .items
                .iter()
                .filter(|it| allowed.contains(it.source.as_str()))
                .cloned()
                .collect();
            aggregate::daily_series(&restricted)
        }
    };

    match forecast::forecast_daily_blocking(daily).await? {
        Ok(series) => Ok(Json(series).into_response()),
        Err(e @ ForecastError::InsufficientHistory { .. })
        | Err(e @ ForecastError::DegenerateSeries(_)) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({
                "error": "forecast_unavailable",
                "detail": e.to_string(),
            })),
        )
            .into_response()),
    }
}

async fn export_csv(
    State(state): State<AppState>,
    Query(q): Query<ViewQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (table, outcome) = state.snapshot().await?;

    let items = match resolve_spec(&table, &q) {
        Some(spec) => filter::apply(&table, &spec),
        None => Vec::new(),
    };
    let body = export::to_csv(&items)?;

    Ok((
        AppendHeaders([
            ("content-type", "text/csv; charset=utf-8".to_string()),
            (
                "content-disposition",
                "attachment; filename=\"sentiment_filtered.csv\"".to_string(),
            ),
            (CACHE_HEADER, outcome.as_str().to_string()),
        ]),
        body,
    ))
}

/// Explicit refresh: invalidate the memoized table and re-read the source.
async fn admin_refresh(State(state): State<AppState>) -> Result<String, AppError> {
    state.cache.invalidate();
    let (table, _) = state.snapshot().await?;
    tracing::info!(items = table.items.len(), "table cache refreshed");
    Ok("reloaded".to_string())
}

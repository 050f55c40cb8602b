//! Sentiment Dashboard — Binary Entrypoint
//! Boots the Axum HTTP server backing the dashboard: filtered views,
//! forecast, CSV export, metrics.

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sentiment_dashboard::config::DashboardConfig;
use sentiment_dashboard::metrics::Metrics;
use sentiment_dashboard::table::loader::CsvFileSource;
use sentiment_dashboard::{api, AppState};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sentiment_dashboard=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = DashboardConfig::load()?;
    let metrics = Metrics::init();

    let state = AppState::new(CsvFileSource::new(&cfg.data_path));
    let router = api::create_router(state).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    tracing::info!(
        addr = %cfg.bind_addr,
        data_path = %cfg.data_path.display(),
        "sentiment dashboard listening"
    );
    axum::serve(listener, router).await.context("server exited")?;
    Ok(())
}

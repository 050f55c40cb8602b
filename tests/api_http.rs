//! HTTP integration tests driving the in-process router with `oneshot`.
//!
//! Covered:
//! - dashboard view shape + `x-table-cache` MISS → HIT
//! - changed backing content is picked up (fingerprint miss)
//! - absent backing file yields empty-but-well-typed structures
//! - CSV export (filtered order, original columns)
//! - forecast: OK series and the 422 "forecast unavailable" outcome
//! - /admin/refresh

use axum::{
    body::{to_bytes, Body},
    http::Request,
    Router,
};
use http::StatusCode;
use serde_json::Value;
use std::path::Path;
use tower::ServiceExt; // for oneshot

fn write_csv(path: &Path, rows: &[(&str, &str, &str, &str, &str)]) {
    let mut out = String::from("id,platform,url,title_or_text,source,published,vader_sentiment,scores,llm_sentiment,llm_confidence,llm_summary,saved_at\n");
    for (id, title, source, published, scores) in rows {
        out.push_str(&format!(
            "{id},news,https://example.com/{id},{title},{source},{published},,{scores},,,,\n"
        ));
    }
    std::fs::write(path, out).unwrap();
}

async fn build_app(data_path: &Path) -> Router {
    std::env::remove_var(sentiment_dashboard::config::ENV_CONFIG_PATH);
    std::env::set_var(
        sentiment_dashboard::config::ENV_DATA_PATH,
        data_path.display().to_string(),
    );
    sentiment_dashboard::app()
        .await
        .expect("app() should build Router in tests")
}

async fn get(app: &Router, uri: &str) -> (StatusCode, http::HeaderMap, Vec<u8>) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request build");
    let resp = app.clone().oneshot(req).await.expect("router response");
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    (status, headers, bytes.to_vec())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, http::HeaderMap, Value) {
    let (status, headers, bytes) = get(app, uri).await;
    let json = serde_json::from_slice(&bytes).expect("json body");
    (status, headers, json)
}

fn sample_rows() -> Vec<(&'static str, &'static str, &'static str, &'static str, &'static str)> {
    vec![
        ("a1", "Fed holds rates steady", "Reuters", "2024-01-01 09:00:00", "0.6"),
        ("a2", "Outlook darkens sharply", "Fed", "2024-01-02 10:00:00", "-0.7"),
        ("a3", "Quiet session on rates", "Reuters", "2024-01-03 11:00:00", "0.1"),
        ("a4", "Broken row", "Fed", "not-a-date", "0.2"),
    ]
}

#[serial_test::serial]
#[tokio::test]
async fn dashboard_view_shape_and_cache_miss_then_hit() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data.csv");
    write_csv(&data, &sample_rows());
    let app = build_app(&data).await;

    let (status, headers, body) = get_json(&app, "/api/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-table-cache"], "MISS");

    assert_eq!(body["kpis"]["total"], 3);
    assert_eq!(body["table"]["report"]["total"], 4);
    assert_eq!(body["table"]["report"]["dropped_published"], 1);
    assert_eq!(body["matched"], 3);
    assert_eq!(body["daily"].as_array().unwrap().len(), 3);
    assert_eq!(body["alerts"].as_array().unwrap().len(), 2);
    assert_eq!(body["feed"].as_array().unwrap().len(), 3);
    // Feed is newest-first and labeled.
    assert_eq!(body["feed"][0]["published"], "2024-01-03T11:00:00");
    assert_eq!(body["feed"][0]["label"], "Neutral");

    let (_, headers, _) = get_json(&app, "/api/dashboard").await;
    assert_eq!(headers["x-table-cache"], "HIT");
}

#[serial_test::serial]
#[tokio::test]
async fn filters_are_applied_from_query_params() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data.csv");
    write_csv(&data, &sample_rows());
    let app = build_app(&data).await;

    let (_, _, body) =
        get_json(&app, "/api/dashboard?start=2024-01-01&end=2024-01-02").await;
    assert_eq!(body["matched"], 2);

    let (_, _, body) = get_json(&app, "/api/dashboard?sources=Reuters").await;
    assert_eq!(body["matched"], 2);

    let (_, _, body) = get_json(&app, "/api/dashboard?sources=").await;
    assert_eq!(body["matched"], 0, "empty selection matches nothing");

    let (_, _, body) = get_json(&app, "/api/dashboard?keyword=RATES").await;
    assert_eq!(body["matched"], 2);

    let (_, _, body) = get_json(&app, "/api/dashboard?alerts_only=true").await;
    assert_eq!(body["matched"], 2);
    assert_eq!(body["kpis"]["alert_counts"]["negative"], 1);
}

#[serial_test::serial]
#[tokio::test]
async fn absent_backing_file_yields_empty_structures() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_app(&dir.path().join("missing.csv")).await;

    let (status, _, body) = get_json(&app, "/api/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kpis"]["total"], 0);
    assert_eq!(body["kpis"]["avg_score"], Value::Null);
    assert_eq!(body["daily"].as_array().unwrap().len(), 0);
    assert_eq!(body["applied"], Value::Null);
    assert_eq!(body["table"]["date_span"], Value::Null);

    // Export still carries the full header.
    let (status, headers, bytes) = get(&app, "/api/export").await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers["content-type"].to_str().unwrap().starts_with("text/csv"));
    let text = String::from_utf8(bytes).unwrap();
    assert_eq!(
        text.lines().next().unwrap(),
        "id,platform,url,title_or_text,source,published,vader_sentiment,scores,llm_sentiment,llm_confidence,llm_summary,saved_at"
    );
    assert_eq!(text.lines().count(), 1);
}

#[serial_test::serial]
#[tokio::test]
async fn export_respects_the_current_filter_and_order() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data.csv");
    write_csv(&data, &sample_rows());
    let app = build_app(&data).await;

    let (status, _, bytes) = get(&app, "/api/export?sources=Reuters").await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(bytes).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("a1,"));
    assert!(lines[2].starts_with("a3,"));
}

#[serial_test::serial]
#[tokio::test]
async fn changed_backing_content_is_picked_up() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data.csv");
    write_csv(&data, &sample_rows());
    let app = build_app(&data).await;

    let (_, _, body) = get_json(&app, "/api/dashboard").await;
    assert_eq!(body["kpis"]["total"], 3);

    let mut more = sample_rows();
    more.push(("a5", "Late breaking rally", "WSJ", "2024-01-04 09:00:00", "0.8"));
    write_csv(&data, &more);

    let (_, headers, body) = get_json(&app, "/api/dashboard").await;
    assert_eq!(headers["x-table-cache"], "MISS", "new fingerprint must miss");
    assert_eq!(body["kpis"]["total"], 4);
}

#[serial_test::serial]
#[tokio::test]
async fn refresh_invalidates_the_memoized_table() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data.csv");
    write_csv(&data, &sample_rows());
    let app = build_app(&data).await;

    let (_, headers, _) = get_json(&app, "/api/dashboard").await;
    assert_eq!(headers["x-table-cache"], "MISS");
    let (_, headers, _) = get_json(&app, "/api/dashboard").await;
    assert_eq!(headers["x-table-cache"], "HIT");

    let (status, _, bytes) = get(&app, "/admin/refresh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(bytes).unwrap(), "reloaded");

    // The refresh reloaded the table itself, so the next read hits again.
    let (_, headers, _) = get_json(&app, "/api/dashboard").await;
    assert_eq!(headers["x-table-cache"], "HIT");
}

#[serial_test::serial]
#[tokio::test]
async fn forecast_returns_series_with_ordered_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data.csv");
    write_csv(&data, &sample_rows());
    let app = build_app(&data).await;

    let (status, _, body) = get_json(&app, "/api/forecast").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["last_observed"], "2024-01-03");
    assert_eq!(body["horizon_days"], 7);

    let points = body["points"].as_array().unwrap();
    assert_eq!(points.len(), 10); // 3 observed days + 7 forecast
    for p in points {
        let (lo, est, hi) = (
            p["lower_bound"].as_f64().unwrap(),
            p["point_estimate"].as_f64().unwrap(),
            p["upper_bound"].as_f64().unwrap(),
        );
        assert!(lo <= est && est <= hi);
    }
    let forecast: Vec<&Value> = points
        .iter()
        .filter(|p| !p["observed"].as_bool().unwrap())
        .collect();
    assert_eq!(forecast.len(), 7);
    assert_eq!(forecast[0]["date"], "2024-01-04");
    assert_eq!(forecast[6]["date"], "2024-01-10");
}

#[serial_test::serial]
#[tokio::test]
async fn forecast_with_insufficient_history_is_422() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data.csv");
    write_csv(
        &data,
        &[("a1", "Lone item", "Reuters", "2024-01-01 09:00:00", "0.4")],
    );
    let app = build_app(&data).await;

    let (status, _, body) = get_json(&app, "/api/forecast").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "forecast_unavailable");
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .contains("insufficient history"));
}

#[serial_test::serial]
#[tokio::test]
async fn forecast_can_be_restricted_by_source() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data.csv");
    write_csv(&data, &sample_rows());
    let app = build_app(&data).await;

    // Only one Fed day survives normalization → insufficient history there.
    let (status, _, _) = get_json(&app, "/api/forecast?sources=Fed").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _, _) = get_json(&app, "/api/forecast?sources=Reuters").await;
    assert_eq!(status, StatusCode::OK);
}

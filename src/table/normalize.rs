// src/table/normalize.rs
//! Record normalizer: coerces raw rows into typed `Item`s.
//!
//! This is a filtering step, not a validation step: rows whose `published`
//! timestamp or `scores` value fail to parse are silently dropped and only
//! counted. Everything else is passed through unmodified.

use chrono::{NaiveDate, NaiveDateTime};
use metrics::counter;

use crate::table::types::{Item, NormalizeReport, NormalizedTable, RawRecord};

/// Pure transform: raw rows in, typed table out. Zero rows in, zero rows out
/// (the column set is carried by the table type, not the data).
pub fn normalize(raw: Vec<RawRecord>) -> NormalizedTable {
    let mut report = NormalizeReport {
        total: raw.len(),
        ..Default::default()
    };
    let mut items = Vec::with_capacity(raw.len());

    for row in raw {
        let Some(published) = parse_timestamp(&row.published) else {
            report.dropped_published += 1;
            continue;
        };
        let Some(scores) = parse_score(&row.scores) else {
            report.dropped_scores += 1;
            continue;
        };

        items.push(Item {
            keyword_hint: keyword_hint(&row.title_or_text),
            date: published.date(),
            id: row.id,
            platform: row.platform,
            url: row.url,
            title_or_text: row.title_or_text,
            source: row.source,
            published,
            scores,
            vader_sentiment: row.vader_sentiment,
            llm_sentiment: row.llm_sentiment,
            llm_confidence: row.llm_confidence,
            llm_summary: row.llm_summary,
            saved_at: parse_timestamp(&row.saved_at),
        });
    }

    report.kept = items.len();
    counter!("table_rows_total").increment(report.total as u64);
    counter!("table_rows_kept_total").increment(report.kept as u64);
    counter!("table_rows_dropped_total", "cause" => "published")
        .increment(report.dropped_published as u64);
    counter!("table_rows_dropped_total", "cause" => "scores")
        .increment(report.dropped_scores as u64);

    NormalizedTable { items, report }
}

/// Parse a zone-naive timestamp, preserving the wall clock as given.
///
/// Accepted shapes: RFC 3339 (offset discarded, local wall clock kept),
/// `YYYY-MM-DD HH:MM:SS[.frac]` with space or `T` separator, minute
/// resolution variants, and a bare date (midnight).
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(t) {
        return Some(dt.naive_local());
    }

    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for f in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(t, f) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(t, "%Y-%m-%d").ok()?.and_hms_opt(0, 0, 0)
}

/// Parse the sentiment score; non-numeric and non-finite both map to `None`
/// and trigger the same drop.
pub fn parse_score(s: &str) -> Option<f64> {
    let v: f64 = s.trim().parse().ok()?;
    v.is_finite().then_some(v)
}

/// Derive the lower-cased search text from `title_or_text`.
///
/// Content arrives from news/social scrapes, so the same hygiene as any
/// ingested text applies first: decode HTML entities, strip tags, collapse
/// whitespace. Empty input stays an empty string.
pub fn keyword_hint(title_or_text: &str) -> String {
    let mut out = html_escape::decode_html_entities(title_or_text).to_string();

    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_lowercase()
}

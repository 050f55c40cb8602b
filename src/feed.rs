// src/feed.rs
//! Alert/feed selector: read-only views over the filtered items.
//! Alerts are every threshold breach, newest first, uncapped; the feed is the
//! newest 30 items with a label hint for the renderer.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::aggregate::{sentiment_label, SentimentLabel, STRONG_ALERT};
use crate::table::types::Item;

/// The feed shows at most this many of the most recent items.
pub const FEED_LIMIT: usize = 30;

/// One strong-sentiment item (`|scores| >= 0.5`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRow {
    pub published: NaiveDateTime,
    pub source: String,
    pub title_or_text: String,
    pub scores: f64,
    pub url: String,
}

/// One recent-feed entry. `label` is the classification the renderer keys
/// its styling on; no formatting is embedded here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedEntry {
    pub published: NaiveDateTime,
    pub source: String,
    pub title_or_text: String,
    pub scores: f64,
    pub vader_sentiment: String,
    pub url: String,
    pub label: SentimentLabel,
}

/// Threshold-breaching items, sorted by `published` descending. Full set —
/// no cap.
pub fn alerts(items: &[Item]) -> Vec<AlertRow> {
    let mut hits: Vec<&Item> = items
        .iter()
        .filter(|it| it.scores.abs() >= STRONG_ALERT)
        .collect();
    hits.sort_by_key(|it| std::cmp::Reverse(it.published));
    hits.into_iter()
        .map(|it| AlertRow {
            published: it.published,
            source: it.source.clone(),
            title_or_text: it.title_or_text.clone(),
            scores: it.scores,
            url: it.url.clone(),
        })
        .collect()
}

/// The most recent items, `published` descending, capped at [`FEED_LIMIT`].
pub fn feed(items: &[Item]) -> Vec<FeedEntry> {
    let mut all: Vec<&Item> = items.iter().collect();
    all.sort_by_key(|it| std::cmp::Reverse(it.published));
    all.into_iter()
        .take(FEED_LIMIT)
        .map(|it| FeedEntry {
            published: it.published,
            source: it.source.clone(),
            title_or_text: it.title_or_text.clone(),
            scores: it.scores,
            vader_sentiment: it.vader_sentiment.clone(),
            url: it.url.clone(),
            label: sentiment_label(it.scores),
        })
        .collect()
}

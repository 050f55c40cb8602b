// src/table/types.rs
use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Column set of the backing table, in its original order.
/// An absent backing source still yields a table carrying exactly these columns.
pub const COLUMNS: [&str; 12] = [
    "id",
    "platform",
    "url",
    "title_or_text",
    "source",
    "published",
    "vader_sentiment",
    "scores",
    "llm_sentiment",
    "llm_confidence",
    "llm_summary",
    "saved_at",
];

/// One raw row as read from the backing table. Every field is optional at
/// this stage; typing happens in the normalizer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title_or_text: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub published: String,
    #[serde(default)]
    pub vader_sentiment: String,
    #[serde(default)]
    pub scores: String,
    #[serde(default)]
    pub llm_sentiment: String,
    #[serde(default)]
    pub llm_confidence: String,
    #[serde(default)]
    pub llm_summary: String,
    #[serde(default)]
    pub saved_at: String,
}

/// One scored content unit after normalization.
///
/// `published` and `scores` are guaranteed parseable here; rows failing
/// either parse never make it into an `Item`. Timestamps are zone-naive and
/// preserved as given. The `llm_*` and `vader_sentiment` annotations are
/// passed through unmodified and never required to be present.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Item {
    pub id: String,
    pub platform: String,
    pub url: String,
    pub title_or_text: String,
    pub source: String,
    pub published: NaiveDateTime,
    /// Calendar date of `published`, the grouping key for daily aggregation.
    pub date: NaiveDate,
    /// Lower-cased, HTML-cleaned `title_or_text` used for substring search.
    pub keyword_hint: String,
    pub scores: f64,
    pub vader_sentiment: String,
    pub llm_sentiment: String,
    pub llm_confidence: String,
    pub llm_summary: String,
    pub saved_at: Option<NaiveDateTime>,
}

/// Per-cause accounting of rows the normalizer excluded.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct NormalizeReport {
    pub total: usize,
    pub kept: usize,
    /// Rows with an unparseable `published` timestamp.
    pub dropped_published: usize,
    /// Rows whose timestamp parsed but whose `scores` did not.
    pub dropped_scores: usize,
}

impl NormalizeReport {
    pub fn dropped(&self) -> usize {
        self.dropped_published + self.dropped_scores
    }
}

/// Normalized table: typed items plus the drop accounting. Immutable for the
/// remainder of a refresh cycle; filtering only selects in/out of the view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTable {
    pub items: Vec<Item>,
    pub report: NormalizeReport,
}

impl NormalizedTable {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Column names of the backing table (present even when empty).
    pub fn columns(&self) -> &'static [&'static str] {
        &COLUMNS
    }

    /// Distinct sources in first-appearance order.
    pub fn sources(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for it in &self.items {
            if seen.insert(it.source.as_str()) {
                out.push(it.source.clone());
            }
        }
        out
    }

    /// Inclusive `(min, max)` of the `date` column, `None` when empty.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.items.iter().map(|it| it.date);
        let first = dates.next()?;
        let (mut lo, mut hi) = (first, first);
        for d in dates {
            if d < lo {
                lo = d;
            }
            if d > hi {
                hi = d;
            }
        }
        Some((lo, hi))
    }
}

/// A provider of raw rows for the pipeline, abstracted so the cache and the
/// API can be tested without touching the filesystem.
#[async_trait::async_trait]
pub trait TableSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<RawRecord>>;
    /// Stable identity of the current backing content; the memoization key.
    async fn fingerprint(&self) -> Result<String>;
    fn name(&self) -> &'static str;
}

// src/aggregate.rs
//! # Aggregator
//! Scalar KPIs, the sparse daily series, and per-source rankings over a
//! filtered item view. Pure functions, no I/O — the presentation collaborator
//! renders whatever comes back.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::table::types::Item;

/// Magnitude at which an item counts as a strong alert.
pub const STRONG_ALERT: f64 = 0.5;
/// Qualitative labeling cutoff: `>= 0.05` positive, `<= -0.05` negative.
pub const LABEL_CUTOFF: f64 = 0.05;
/// At most this many sources in the ranked per-source table.
pub const TOP_SOURCES_LIMIT: usize = 10;

/// Canonical qualitative label for a sentiment score. Used everywhere a score
/// needs a label; rendering (colors, icons) stays with the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

/// Three-way classification with inclusive boundaries:
/// `0.05 → Positive`, `-0.05 → Negative`, anything strictly between → Neutral.
pub fn sentiment_label(score: f64) -> SentimentLabel {
    if score >= LABEL_CUTOFF {
        SentimentLabel::Positive
    } else if score <= -LABEL_CUTOFF {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertCounts {
    /// Items with `scores <= -0.5`.
    pub negative: usize,
    /// Items with `scores >= 0.5`.
    pub positive: usize,
}

/// Scalar KPI block for the current view. `avg_score` and `positive_ratio`
/// are `None` on an empty view — "no data" is not a score of zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total: usize,
    pub avg_score: Option<f64>,
    /// Label of `avg_score`, when there is one.
    pub avg_label: Option<SentimentLabel>,
    /// Fraction of items with `scores >= 0.05`.
    pub positive_ratio: Option<f64>,
    /// Count of items with `scores >= 0.05`.
    pub positive_count: usize,
    pub alert_counts: AlertCounts,
}

pub fn kpis(items: &[Item]) -> Kpis {
    let total = items.len();
    let positive_count = items.iter().filter(|it| it.scores >= LABEL_CUTOFF).count();
    let alert_counts = AlertCounts {
        negative: items.iter().filter(|it| it.scores <= -STRONG_ALERT).count(),
        positive: items.iter().filter(|it| it.scores >= STRONG_ALERT).count(),
    };

    let (avg_score, positive_ratio) = if total == 0 {
        (None, None)
    } else {
        let sum: f64 = items.iter().map(|it| it.scores).sum();
        (
            Some(sum / total as f64),
            Some(positive_count as f64 / total as f64),
        )
    };

    Kpis {
        total,
        avg_score,
        avg_label: avg_score.map(sentiment_label),
        positive_ratio,
        positive_count,
        alert_counts,
    }
}

/// Mean sentiment of all items published on one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub mean_score: f64,
    pub count: usize,
}

/// Group by `date` and average `scores`. Sparse: dates with no items are
/// simply absent, never zero-filled — consumers needing a contiguous calendar
/// axis must resample explicitly.
pub fn daily_series(items: &[Item]) -> Vec<DailyAggregate> {
    let mut by_date: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for it in items {
        let e = by_date.entry(it.date).or_insert((0.0, 0));
        e.0 += it.scores;
        e.1 += 1;
    }
    by_date
        .into_iter()
        .map(|(date, (sum, count))| DailyAggregate {
            date,
            mean_score: sum / count as f64,
            count,
        })
        .collect()
}

/// Per-source mean for the ranked sources table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceAverage {
    pub source: String,
    pub mean_score: f64,
    pub count: usize,
}

/// Group by `source`, average `scores`, sort non-increasing by mean and cap
/// at 10. Stable sort: tied sources keep their first-appearance order.
pub fn top_sources(items: &[Item]) -> Vec<SourceAverage> {
    let mut order: Vec<&str> = Vec::new();
    let mut sums: HashMap<&str, (f64, usize)> = HashMap::new();
    for it in items {
        let e = sums.entry(it.source.as_str()).or_insert_with(|| {
            order.push(it.source.as_str());
            (0.0, 0)
        });
        e.0 += it.scores;
        e.1 += 1;
    }

    let mut ranked: Vec<SourceAverage> = order
        .into_iter()
        .map(|source| {
            let (sum, count) = sums[source];
            SourceAverage {
                source: source.to_string(),
                mean_score: sum / count as f64,
                count,
            }
        })
        .collect();
    ranked.sort_by(|a, b| b.mean_score.total_cmp(&a.mean_score));
    ranked.truncate(TOP_SOURCES_LIMIT);
    ranked
}

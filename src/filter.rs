// src/filter.rs
//! Filter engine: a conjunction of predicates over the normalized table.
//!
//! Pure set intersection; evaluation order never changes the result. An
//! empty result is a valid state, not an error — the applied `FilterSpec`
//! itself is what distinguishes "nothing matched" from "no filter".

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::aggregate::STRONG_ALERT;
use crate::table::types::{Item, NormalizedTable};

/// Recognized filter options. Predicates compose by logical AND.
///
/// `sources` semantics: the set enumerates what is selected, so an empty set
/// yields zero rows. "No restriction" is expressed by selecting every
/// distinct source (see [`FilterSpec::allow_all`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Inclusive calendar-date range on the item's `date`.
    pub date_range: (NaiveDate, NaiveDate),
    /// Case-insensitive substring over `keyword_hint`; empty = no filter.
    pub keyword: String,
    pub sources: BTreeSet<String>,
    /// Keep only items with `|scores| >= 0.5`.
    pub alerts_only: bool,
}

impl FilterSpec {
    /// The no-restriction spec for `table`: full date span, every source,
    /// no keyword, alerts off. `None` when the table is empty (there is
    /// nothing to span).
    pub fn allow_all(table: &NormalizedTable) -> Option<Self> {
        let date_range = table.date_span()?;
        Some(Self {
            date_range,
            keyword: String::new(),
            sources: table.sources().into_iter().collect(),
            alerts_only: false,
        })
    }

    /// Whether `item` satisfies every predicate.
    pub fn matches(&self, item: &Item) -> bool {
        self.matches_with(item, &self.keyword.trim().to_lowercase())
    }

    fn matches_with(&self, item: &Item, needle: &str) -> bool {
        let (start, end) = self.date_range;
        item.date >= start
            && item.date <= end
            && self.sources.contains(&item.source)
            && (needle.is_empty() || item.keyword_hint.contains(needle))
            && (!self.alerts_only || item.scores.abs() >= STRONG_ALERT)
    }
}

/// Apply `spec` to the table, producing the filtered view sorted ascending by
/// `published` — the order every downstream consumer (and the export) sees.
pub fn apply(table: &NormalizedTable, spec: &FilterSpec) -> Vec<Item> {
    let needle = spec.keyword.trim().to_lowercase();
    let mut out: Vec<Item> = table
        .items
        .iter()
        .filter(|it| spec.matches_with(it, &needle))
        .cloned()
        .collect();
    out.sort_by_key(|it| it.published);
    out
}

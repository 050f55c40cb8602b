// src/export.rs
//! Delimited export of the currently filtered item set: all twelve original
//! columns, in the filtered/sorted order currently in effect.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use crate::table::types::{Item, COLUMNS};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn fmt_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

/// Render `items` as CSV text with the original column set. An empty view
/// still produces the header line.
pub fn to_csv(items: &[Item]) -> Result<String> {
    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record(COLUMNS).context("writing csv header")?;

    for it in items {
        let published = fmt_ts(&it.published);
        let scores = it.scores.to_string();
        let saved_at = it.saved_at.as_ref().map(fmt_ts).unwrap_or_default();
        w.write_record([
            it.id.as_str(),
            it.platform.as_str(),
            it.url.as_str(),
            it.title_or_text.as_str(),
            it.source.as_str(),
            published.as_str(),
            it.vader_sentiment.as_str(),
            scores.as_str(),
            it.llm_sentiment.as_str(),
            it.llm_confidence.as_str(),
            it.llm_summary.as_str(),
            saved_at.as_str(),
        ])
        .context("writing csv row")?;
    }

    let bytes = w.into_inner().context("flushing csv writer")?;
    String::from_utf8(bytes).context("csv output was not utf-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::normalize::normalize;
    use crate::table::types::RawRecord;

    #[test]
    fn header_matches_original_columns_even_when_empty() {
        let out = to_csv(&[]).unwrap();
        let header = out.lines().next().unwrap();
        assert_eq!(header, COLUMNS.join(","));
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn rows_preserve_input_order_and_fields() {
        let raw = vec![
            RawRecord {
                id: "b".into(),
                source: "Fed".into(),
                title_or_text: "second".into(),
                published: "2024-01-02 10:00:00".into(),
                scores: "-0.25".into(),
                llm_summary: "brief".into(),
                ..Default::default()
            },
            RawRecord {
                id: "a".into(),
                source: "Reuters".into(),
                title_or_text: "first".into(),
                published: "2024-01-01 09:00:00".into(),
                scores: "0.5".into(),
                ..Default::default()
            },
        ];
        let items = normalize(raw).items;
        let out = to_csv(&items).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 3);
        // Export order is exactly the order handed in.
        assert!(lines[1].starts_with("b,"));
        assert!(lines[2].starts_with("a,"));
        assert!(lines[1].contains("2024-01-02 10:00:00"));
        assert!(lines[1].contains("-0.25"));
        assert!(lines[1].contains("brief"));
    }

    #[test]
    fn round_trips_through_the_reader() {
        let raw = vec![RawRecord {
            id: "x1".into(),
            source: "Reuters, Ltd".into(),
            title_or_text: "contains, commas \"and quotes\"".into(),
            published: "2024-01-01 09:00:00".into(),
            scores: "0.5".into(),
            ..Default::default()
        }];
        let items = normalize(raw).items;
        let out = to_csv(&items).unwrap();

        let mut reader = csv::Reader::from_reader(out.as_bytes());
        let back: Vec<RawRecord> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].source, "Reuters, Ltd");
        assert_eq!(back[0].title_or_text, "contains, commas \"and quotes\"");
    }
}

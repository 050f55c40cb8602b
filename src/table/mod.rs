// src/table/mod.rs
pub mod cache;
pub mod loader;
pub mod normalize;
pub mod types;

use std::sync::Arc;

use anyhow::Result;
use metrics::{describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;

use crate::table::cache::{CacheOutcome, TableCache};
use crate::table::types::{NormalizedTable, TableSource};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("table_rows_total", "Raw rows read from the backing table.");
        describe_counter!(
            "table_rows_kept_total",
            "Rows kept after type coercion in the normalizer."
        );
        describe_counter!(
            "table_rows_dropped_total",
            "Rows dropped for an unparseable published timestamp or score."
        );
        describe_counter!(
            "table_rows_malformed_total",
            "Structurally broken CSV records skipped by the reader."
        );
        describe_counter!("table_cache_hits_total", "Normalized-table cache hits.");
        describe_counter!("table_cache_misses_total", "Normalized-table cache misses.");
        describe_gauge!("table_items", "Items in the most recently loaded table.");
        describe_gauge!(
            "table_last_load_ts",
            "Unix ts when the backing table was last read and normalized."
        );
    });
}

/// Fetch + normalize, bypassing the cache.
pub async fn load(source: &dyn TableSource) -> Result<NormalizedTable> {
    ensure_metrics_described();
    let raw = source.fetch().await?;
    let table = normalize::normalize(raw);

    gauge!("table_items").set(table.items.len() as f64);
    gauge!("table_last_load_ts").set(chrono::Utc::now().timestamp().max(0) as f64);
    tracing::info!(
        provider = source.name(),
        total = table.report.total,
        kept = table.report.kept,
        dropped = table.report.dropped(),
        "table loaded"
    );
    Ok(table)
}

/// Memoized load: re-reads and re-parses the backing source only when its
/// fingerprint changed or the cache was invalidated by a refresh.
pub async fn load_cached(
    source: &dyn TableSource,
    cache: &TableCache,
) -> Result<(Arc<NormalizedTable>, CacheOutcome)> {
    ensure_metrics_described();
    let key = source.fingerprint().await?;

    if let Some(table) = cache.get(&key) {
        metrics::counter!("table_cache_hits_total").increment(1);
        return Ok((table, CacheOutcome::Hit));
    }

    metrics::counter!("table_cache_misses_total").increment(1);
    let table = load(source).await?;
    Ok((cache.put(key, table), CacheOutcome::Miss))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::types::RawRecord;

    struct StaticSource {
        rows: Vec<RawRecord>,
        key: String,
    }

    #[async_trait::async_trait]
    impl TableSource for StaticSource {
        async fn fetch(&self) -> Result<Vec<RawRecord>> {
            Ok(self.rows.clone())
        }
        async fn fingerprint(&self) -> Result<String> {
            Ok(self.key.clone())
        }
        fn name(&self) -> &'static str {
            "static"
        }
    }

    fn source() -> StaticSource {
        StaticSource {
            rows: vec![RawRecord {
                id: "1".into(),
                source: "Fed".into(),
                published: "2024-01-01 08:00:00".into(),
                scores: "0.2".into(),
                ..Default::default()
            }],
            key: "k1".into(),
        }
    }

    #[tokio::test]
    async fn load_cached_is_miss_then_hit_then_miss_after_invalidate() {
        let cache = TableCache::new();
        let src = source();

        let (t1, o1) = load_cached(&src, &cache).await.unwrap();
        assert_eq!(o1, CacheOutcome::Miss);
        assert_eq!(t1.items.len(), 1);

        let (t2, o2) = load_cached(&src, &cache).await.unwrap();
        assert_eq!(o2, CacheOutcome::Hit);
        assert!(Arc::ptr_eq(&t1, &t2));

        cache.invalidate();
        let (_, o3) = load_cached(&src, &cache).await.unwrap();
        assert_eq!(o3, CacheOutcome::Miss);
    }

    #[tokio::test]
    async fn changed_fingerprint_misses() {
        let cache = TableCache::new();
        let mut src = source();
        load_cached(&src, &cache).await.unwrap();

        src.key = "k2".into();
        let (_, outcome) = load_cached(&src, &cache).await.unwrap();
        assert_eq!(outcome, CacheOutcome::Miss);
    }
}

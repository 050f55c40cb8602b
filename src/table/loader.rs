// src/table/loader.rs
//! Backing-table access: CSV file reading and the `TableSource` impl.
//!
//! A missing file is not an error; it yields an empty row set so the whole
//! pipeline returns empty-but-well-typed structures. Only I/O failures on an
//! existing file surface as errors.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use metrics::counter;
use sha2::{Digest, Sha256};

use crate::table::types::{RawRecord, TableSource};

pub const DEFAULT_DATA_PATH: &str = "aggregated_data.csv";

/// Read raw rows from a CSV file. Structurally broken records (wrong field
/// count, invalid UTF-8) are skipped and counted; per-field typing problems
/// are left to the normalizer.
pub fn read_raw<P: AsRef<Path>>(path: P) -> Result<Vec<RawRecord>> {
    let path = path.as_ref();
    if !path.is_file() {
        tracing::debug!(path = %path.display(), "backing table absent, returning empty row set");
        return Ok(Vec::new());
    }

    let file = fs::File::open(path)
        .with_context(|| format!("opening backing table {}", path.display()))?;
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

    let mut rows = Vec::new();
    for rec in reader.deserialize::<RawRecord>() {
        match rec {
            Ok(r) => rows.push(r),
            Err(e) => {
                counter!("table_rows_malformed_total").increment(1);
                tracing::debug!(error = %e, "skipping malformed row");
            }
        }
    }
    Ok(rows)
}

/// The standard backing source: a CSV file on disk.
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl TableSource for CsvFileSource {
    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_raw(path))
            .await
            .context("csv read task panicked")?
    }

    /// Content digest of the backing file. An absent file gets a stable
    /// sentinel key so the empty table is memoized like any other.
    async fn fingerprint(&self) -> Result<String> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            if !path.is_file() {
                return Ok(format!("absent:{}", path.display()));
            }
            let bytes = fs::read(&path)
                .with_context(|| format!("fingerprinting {}", path.display()))?;
            let digest = Sha256::digest(&bytes);
            Ok(format!("sha256:{digest:x}"))
        })
        .await
        .context("fingerprint task panicked")?
    }

    fn name(&self) -> &'static str {
        "csv-file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_empty_rows() {
        let rows = read_raw("does/not/exist.csv").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn reads_rows_and_tolerates_missing_columns() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("data.csv");
        let mut f = fs::File::create(&p).unwrap();
        writeln!(f, "id,source,published,scores").unwrap();
        writeln!(f, "a1,Reuters,2024-01-01 09:00:00,0.4").unwrap();
        writeln!(f, "a2,Fed,2024-01-02 10:00:00,-0.6").unwrap();
        drop(f);

        let rows = read_raw(&p).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "a1");
        assert_eq!(rows[1].scores, "-0.6");
        assert_eq!(rows[0].llm_summary, "");
    }

    #[tokio::test]
    async fn fingerprint_changes_with_content() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("data.csv");
        fs::write(&p, "id,published,scores\n1,2024-01-01,0.1\n").unwrap();

        let src = CsvFileSource::new(&p);
        let f1 = src.fingerprint().await.unwrap();
        let f2 = src.fingerprint().await.unwrap();
        assert_eq!(f1, f2);

        fs::write(&p, "id,published,scores\n1,2024-01-01,0.2\n").unwrap();
        let f3 = src.fingerprint().await.unwrap();
        assert_ne!(f1, f3);

        let absent = CsvFileSource::new(dir.path().join("nope.csv"));
        assert!(absent.fingerprint().await.unwrap().starts_with("absent:"));
    }
}

//! Snapshot store backed by hourly JSON files.
//!
//! Each UTC hour gets its own file `{data_dir}/YYYY-MM-DD-HH.json`:
//!
//! ```json
//! { "hourStart": 1700006400000, "entries": [ { "timestamp": ..., "data": { ... } } ] }
//! ```
//!
//! Inserts append to the file for the snapshot's hour. Reads scan only the
//! files whose hour overlaps the requested window.
//!
//! Files are replaced through a `.tmp` sibling and a rename, so a reader in
//! another process never sees a partially written file.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeZone, Utc};
use perp_risk_core::{timestamp_to_datetime, HistoricalSeries, Snapshot, SnapshotStore};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

const HOUR_MS: i64 = 3_600_000;
const FILE_NAME_FORMAT: &str = "%Y-%m-%d-%H";

/// Contents of one hourly file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HourlyFile {
    #[serde(rename = "hourStart")]
    pub hour_start: i64,
    pub entries: Vec<Snapshot>,
}

/// File-per-hour snapshot store.
#[derive(Debug)]
pub struct FileSnapshotStore {
    data_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSnapshotStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the file holding snapshots taken during `timestamp_ms`'s hour.
    ///
    /// # Errors
    /// Returns an error if the timestamp is outside chrono's date range.
    pub fn hourly_file_path(&self, timestamp_ms: i64) -> Result<PathBuf> {
        let dt = timestamp_to_datetime(timestamp_ms)
            .with_context(|| format!("Snapshot timestamp {timestamp_ms} is out of range"))?;
        Ok(self
            .data_dir
            .join(format!("{}.json", dt.format(FILE_NAME_FORMAT))))
    }

    /// Start of the hour encoded in a file name, `None` for foreign files.
    fn hour_of(path: &Path) -> Option<i64> {
        if path.extension()? != "json" {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        let naive = NaiveDateTime::parse_from_str(&format!("{stem}:00"), "%Y-%m-%d-%H:%M").ok()?;
        Some(Utc.from_utc_datetime(&naive).timestamp_millis())
    }

    /// Hourly files on disk as `(hour_start_ms, path)`, oldest first.
    async fn hourly_files(&self) -> Result<Vec<(i64, PathBuf)>> {
        let mut files = Vec::new();

        let mut dir = match tokio::fs::read_dir(&self.data_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read data directory {}", self.data_dir.display())
                })
            }
        };

        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if let Some(hour) = Self::hour_of(&path) {
                files.push((hour, path));
            }
        }

        files.sort_by_key(|(hour, _)| *hour);
        Ok(files)
    }

    async fn read_hourly(path: &Path) -> Result<HourlyFile> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Appends a snapshot to its hour's file, creating directory and file on demand.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub async fn append(&self, snapshot: &Snapshot) -> Result<()> {
        let path = self.hourly_file_path(snapshot.timestamp)?;
        let _guard = self.write_lock.lock().await;

        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.data_dir.display()))?;

        let hour_start = snapshot.timestamp.div_euclid(HOUR_MS) * HOUR_MS;

        let mut hourly = if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            match Self::read_hourly(&path).await {
                Ok(existing) => existing,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Corrupt hourly file, starting fresh: {e:#}");
                    HourlyFile::default()
                }
            }
        } else {
            HourlyFile::default()
        };

        hourly.hour_start = hour_start;
        hourly.entries.push(snapshot.clone());

        let json = serde_json::to_string_pretty(&hourly)?;
        write_atomic(&path, json.as_bytes()).await?;

        tracing::debug!(
            path = %path.display(),
            entries = hourly.entries.len(),
            "Appended snapshot"
        );
        Ok(())
    }

    /// Snapshots with `start_ms <= timestamp <= end_ms`, oldest first.
    ///
    /// Unreadable files are skipped with a warning.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be listed.
    pub async fn read_range(&self, start_ms: i64, end_ms: i64) -> Result<HistoricalSeries> {
        if start_ms > end_ms {
            return Ok(Vec::new());
        }

        let mut snapshots = Vec::new();

        for (hour, path) in self.hourly_files().await? {
            if hour + HOUR_MS <= start_ms || hour > end_ms {
                continue;
            }

            match Self::read_hourly(&path).await {
                Ok(hourly) => snapshots.extend(
                    hourly
                        .entries
                        .into_iter()
                        .filter(|s| s.timestamp >= start_ms && s.timestamp <= end_ms),
                ),
                Err(e) => tracing::warn!("Skipping hourly file: {e:#}"),
            }
        }

        snapshots.sort_by_key(|s| s.timestamp);
        Ok(snapshots)
    }

    /// Newest snapshot in the newest non-empty hourly file.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be listed.
    pub async fn read_latest(&self) -> Result<Option<Snapshot>> {
        for (_, path) in self.hourly_files().await?.into_iter().rev() {
            match Self::read_hourly(&path).await {
                Ok(hourly) => {
                    if let Some(latest) = hourly.entries.into_iter().max_by_key(|s| s.timestamp) {
                        return Ok(Some(latest));
                    }
                }
                Err(e) => tracing::warn!("Skipping hourly file: {e:#}"),
            }
        }

        Ok(None)
    }
}

/// Writes `contents` to `{path}.tmp` and renames it over `path`.
///
/// # Errors
/// Returns an error if the temporary file cannot be written or renamed.
pub(crate) async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let mut tmp_name = path.file_name().map(OsString::from).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp, contents)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to replace {}", path.display()))
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn latest(&self) -> Result<Option<Snapshot>> {
        self.read_latest().await
    }

    async fn range(&self, start_ms: i64, end_ms: i64) -> Result<HistoricalSeries> {
        self.read_range(start_ms, end_ms).await
    }

    async fn insert(&self, snapshot: &Snapshot) -> Result<()> {
        self.append(snapshot).await
    }
}

//! Persisted report files
//!
//! Completed scans render into artifacts stored in a flat directory. The
//! store owns listing, retrieval, and retention; artifact content is opaque
//! to it.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, warn};
use utoipa::ToSchema;

/// Report store errors.
#[derive(Debug, thiserror::Error)]
pub enum ReportStoreError {
    #[error("Report not found: {0}")]
    NotFound(String),

    #[error("Invalid report filename: {0}")]
    InvalidFilename(String),

    #[error("Report storage failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A persisted report artifact.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReportEntry {
    pub filename: String,
    /// Report type tag derived from the filename
    pub kind: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

/// Aggregate statistics over the stored reports.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReportStatistics {
    pub total_reports: usize,
    pub total_size_bytes: u64,
    pub html_reports: usize,
    pub json_reports: usize,
    pub summary_reports: usize,
}

/// Filesystem-backed report store.
pub struct FileReportStore {
    output_dir: PathBuf,
}

impl FileReportStore {
    /// Open the store, creating the directory if needed.
    pub async fn open(output_dir: impl Into<PathBuf>) -> Result<Self, ReportStoreError> {
        let output_dir = output_dir.into();
        tokio::fs::create_dir_all(&output_dir).await?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Persist an artifact under `filename`.
    pub async fn save(&self, filename: &str, content: &[u8]) -> Result<(), ReportStoreError> {
        let path = self.resolve(filename)?;
        tokio::fs::write(&path, content).await?;
        debug!(filename = %filename, bytes = content.len(), "Report persisted");
        Ok(())
    }

    /// Read an artifact back.
    pub async fn open_report(&self, filename: &str) -> Result<Vec<u8>, ReportStoreError> {
        let path = self.resolve(filename)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(ReportStoreError::NotFound(filename.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// List stored reports, newest first.
    pub async fn list(&self) -> Result<Vec<ReportEntry>, ReportStoreError> {
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.output_dir).await?;

        while let Some(entry) = dir.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let filename = entry.file_name().to_string_lossy().to_string();
            let created_at = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            entries.push(ReportEntry {
                kind: report_kind(&filename).to_string(),
                filename,
                size_bytes: metadata.len(),
                created_at,
            });
        }

        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.filename.cmp(&b.filename)));
        Ok(entries)
    }

    /// Aggregate statistics over the stored reports.
    pub async fn statistics(&self) -> Result<ReportStatistics, ReportStoreError> {
        let entries = self.list().await?;
        let mut stats = ReportStatistics {
            total_reports: entries.len(),
            total_size_bytes: entries.iter().map(|e| e.size_bytes).sum(),
            html_reports: 0,
            json_reports: 0,
            summary_reports: 0,
        };
        for entry in &entries {
            match entry.kind.as_str() {
                "HTML Report" => stats.html_reports += 1,
                "Summary Report" => stats.summary_reports += 1,
                _ => stats.json_reports += 1,
            }
        }
        Ok(stats)
    }

    /// Delete reports older than the retention window. Returns the number of
    /// files removed.
    pub async fn cleanup_older_than(&self, days_to_keep: u32) -> Result<usize, ReportStoreError> {
        let cutoff = Utc::now() - Duration::days(i64::from(days_to_keep));
        let mut deleted = 0usize;

        for entry in self.list().await? {
            if entry.created_at >= cutoff {
                continue;
            }
            match self.resolve(&entry.filename) {
                Ok(path) => match tokio::fs::remove_file(&path).await {
                    Ok(()) => deleted += 1,
                    Err(err) => {
                        warn!(filename = %entry.filename, error = %err, "Failed to delete old report")
                    }
                },
                Err(err) => {
                    warn!(filename = %entry.filename, error = %err, "Skipping undeletable report")
                }
            }
        }

        Ok(deleted)
    }

    /// Resolve a filename inside the store, rejecting path traversal.
    fn resolve(&self, filename: &str) -> Result<PathBuf, ReportStoreError> {
        if filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
        {
            return Err(ReportStoreError::InvalidFilename(filename.to_string()));
        }
        Ok(self.output_dir.join(filename))
    }
}

fn report_kind(filename: &str) -> &'static str {
    let lowered = filename.to_lowercase();
    if lowered.ends_with(".html") {
        "HTML Report"
    } else if lowered.ends_with(".json") {
        if lowered.contains("summary") {
            "Summary Report"
        } else {
            "JSON Report"
        }
    } else {
        "Unknown"
    }
}

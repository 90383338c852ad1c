//! Report rendering
//!
//! A `ScanResult` renders into one of the supported artifact formats.
//! Rendering is deterministic: identical input always yields byte-identical
//! output. The only timestamp that appears in an artifact is the scan's own
//! timestamp, never a generation wall-clock.

pub mod formats;

use uuid::Uuid;

use crate::domain::scan::ScanResult;

/// Supported report artifact formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Full structured report
    Json,
    /// Human-readable report
    Html,
    /// Compact executive summary
    Summary,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Html => "html",
            ReportFormat::Summary => "summary",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Json | ReportFormat::Summary => "json",
            ReportFormat::Html => "html",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Json | ReportFormat::Summary => "application/json",
            ReportFormat::Html => "text/html; charset=utf-8",
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "html" => Ok(ReportFormat::Html),
            "summary" => Ok(ReportFormat::Summary),
            _ => Err(ReportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Report rendering errors.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Unsupported report format: '{0}' (expected json, html, or summary)")]
    UnsupportedFormat(String),

    #[error("Report serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Renders scan results into report artifacts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportGenerator;

impl ReportGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Render a completed scan result into artifact bytes.
    pub fn render(&self, result: &ScanResult, format: ReportFormat) -> Result<Vec<u8>, ReportError> {
        match format {
            ReportFormat::Json => formats::json::render_report(result),
            ReportFormat::Html => Ok(formats::html::render_report(result).into_bytes()),
            ReportFormat::Summary => formats::json::render_summary(result),
        }
    }

    /// Canonical filename for a persisted artifact.
    pub fn filename(scan_id: Uuid, format: ReportFormat) -> String {
        match format {
            ReportFormat::Summary => format!("scan_summary_{}.json", scan_id),
            other => format!("scan_report_{}.{}", scan_id, other.extension()),
        }
    }
}

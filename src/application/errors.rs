//! Application error taxonomy

use uuid::Uuid;

use crate::infrastructure::scan_store::ScanStoreError;

/// Errors surfaced by the scan orchestration layer.
///
/// Checker-level failures never appear here: they are captured per
/// invocation inside the orchestrator and do not fail the scan.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Rejected synchronously before a scan record is created
    #[error("Invalid scan request: {0}")]
    InvalidRequest(String),

    /// The collaborator could not enumerate subscriptions or resources
    #[error("Authentication failure: {0}")]
    AuthenticationFailure(String),

    #[error("Scan not found: {0}")]
    NotFound(Uuid),

    /// Result requested before the scan reached `completed`
    #[error("Scan {scan_id} is not completed (current status: {state})")]
    NotCompleted {
        scan_id: Uuid,
        state: crate::domain::scan::ScanState,
    },

    /// Aggregation or store invariant violated; never silently swallowed
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ScanStoreError> for ScanError {
    fn from(err: ScanStoreError) -> Self {
        match err {
            ScanStoreError::NotFound(id) => ScanError::NotFound(id),
            other => ScanError::Internal(other.to_string()),
        }
    }
}

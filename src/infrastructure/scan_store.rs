//! Scan state storage
//!
//! The store is the single point of truth polled by clients. Updates for a
//! given scan are serialized behind one write lock; readers always observe
//! a consistent snapshot. The `completed` state is only ever written in the
//! same critical section as the corresponding result, so no reader can see
//! `completed` without a result being present.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::domain::scan::{ScanResult, ScanState, ScanStatus, ScanTransitionError};

/// Scan persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum ScanStoreError {
    #[error("Scan not found: {0}")]
    NotFound(Uuid),

    #[error("Scan already exists: {0}")]
    AlreadyExists(Uuid),

    #[error(transparent)]
    Transition(#[from] ScanTransitionError),
}

/// Scan storage interface.
#[async_trait]
pub trait ScanStore: Send + Sync {
    /// Insert a new scan record; fails if the identifier is already present.
    /// Returns the cancellation token associated with the scan.
    async fn create(&self, status: ScanStatus) -> Result<CancellationToken, ScanStoreError>;

    /// Transition a pending scan to running.
    async fn mark_running(&self, scan_id: Uuid) -> Result<(), ScanStoreError>;

    /// Record checker completion progress as `floor(completed/total*100)`.
    /// Progress never decreases; updates on terminal scans are ignored.
    async fn record_progress(
        &self,
        scan_id: Uuid,
        completed: usize,
        total: usize,
    ) -> Result<(), ScanStoreError>;

    /// Write the final result and transition to completed in one step.
    /// A no-op when the scan already reached a terminal state (results of a
    /// cancelled scan are discarded).
    async fn complete(&self, scan_id: Uuid, result: ScanResult) -> Result<(), ScanStoreError>;

    /// Transition to failed with an error message. A no-op when the scan is
    /// already terminal.
    async fn fail(&self, scan_id: Uuid, message: &str) -> Result<(), ScanStoreError>;

    async fn status(&self, scan_id: Uuid) -> Result<Option<ScanStatus>, ScanStoreError>;

    async fn result(&self, scan_id: Uuid) -> Result<Option<ScanResult>, ScanStoreError>;

    async fn list(&self) -> Result<Vec<ScanStatus>, ScanStoreError>;

    async fn cancellation_token(
        &self,
        scan_id: Uuid,
    ) -> Result<Option<CancellationToken>, ScanStoreError>;

    /// Remove a scan record entirely.
    async fn remove(&self, scan_id: Uuid) -> Result<(), ScanStoreError>;
}

struct ScanEntry {
    status: ScanStatus,
    result: Option<ScanResult>,
    cancel: CancellationToken,
}

/// In-memory scan store.
#[derive(Default)]
pub struct InMemoryScanStore {
    scans: RwLock<HashMap<Uuid, ScanEntry>>,
}

impl InMemoryScanStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScanStore for InMemoryScanStore {
    async fn create(&self, status: ScanStatus) -> Result<CancellationToken, ScanStoreError> {
        let mut scans = self.scans.write().await;
        if scans.contains_key(&status.scan_id) {
            return Err(ScanStoreError::AlreadyExists(status.scan_id));
        }
        let token = CancellationToken::new();
        scans.insert(
            status.scan_id,
            ScanEntry {
                status,
                result: None,
                cancel: token.clone(),
            },
        );
        Ok(token)
    }

    async fn mark_running(&self, scan_id: Uuid) -> Result<(), ScanStoreError> {
        let mut scans = self.scans.write().await;
        let entry = scans
            .get_mut(&scan_id)
            .ok_or(ScanStoreError::NotFound(scan_id))?;
        entry.status.transition(ScanState::Running)?;
        Ok(())
    }

    async fn record_progress(
        &self,
        scan_id: Uuid,
        completed: usize,
        total: usize,
    ) -> Result<(), ScanStoreError> {
        let mut scans = self.scans.write().await;
        let entry = scans
            .get_mut(&scan_id)
            .ok_or(ScanStoreError::NotFound(scan_id))?;
        if entry.status.state.is_terminal() {
            debug!(scan_id = %scan_id, "Ignoring progress update for terminal scan");
            return Ok(());
        }
        let progress = if total == 0 {
            100
        } else {
            ((completed * 100) / total).min(100) as u8
        };
        entry.status.progress = entry.status.progress.max(progress);
        Ok(())
    }

    async fn complete(&self, scan_id: Uuid, result: ScanResult) -> Result<(), ScanStoreError> {
        let mut scans = self.scans.write().await;
        let entry = scans
            .get_mut(&scan_id)
            .ok_or(ScanStoreError::NotFound(scan_id))?;
        if entry.status.state.is_terminal() {
            debug!(scan_id = %scan_id, "Discarding result for terminal scan");
            return Ok(());
        }
        // Result is written before the status flips; both land in the same
        // write section so readers never see completed without a result.
        entry.result = Some(result);
        entry.status.transition(ScanState::Completed)?;
        entry.status.progress = 100;
        Ok(())
    }

    async fn fail(&self, scan_id: Uuid, message: &str) -> Result<(), ScanStoreError> {
        let mut scans = self.scans.write().await;
        let entry = scans
            .get_mut(&scan_id)
            .ok_or(ScanStoreError::NotFound(scan_id))?;
        if entry.status.state.is_terminal() {
            debug!(scan_id = %scan_id, "Ignoring failure for terminal scan");
            return Ok(());
        }
        entry.status.transition(ScanState::Failed)?;
        entry.status.error_message = Some(message.to_string());
        Ok(())
    }

    async fn status(&self, scan_id: Uuid) -> Result<Option<ScanStatus>, ScanStoreError> {
        Ok(self.scans.read().await.get(&scan_id).map(|e| e.status.clone()))
    }

    async fn result(&self, scan_id: Uuid) -> Result<Option<ScanResult>, ScanStoreError> {
        Ok(self
            .scans
            .read()
            .await
            .get(&scan_id)
            .and_then(|e| e.result.clone()))
    }

    async fn list(&self) -> Result<Vec<ScanStatus>, ScanStoreError> {
        let scans = self.scans.read().await;
        let mut statuses: Vec<ScanStatus> = scans.values().map(|e| e.status.clone()).collect();
        statuses.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        Ok(statuses)
    }

    async fn cancellation_token(
        &self,
        scan_id: Uuid,
    ) -> Result<Option<CancellationToken>, ScanStoreError> {
        Ok(self
            .scans
            .read()
            .await
            .get(&scan_id)
            .map(|e| e.cancel.clone()))
    }

    async fn remove(&self, scan_id: Uuid) -> Result<(), ScanStoreError> {
        let mut scans = self.scans.write().await;
        scans
            .remove(&scan_id)
            .map(|_| ())
            .ok_or(ScanStoreError::NotFound(scan_id))
    }
}

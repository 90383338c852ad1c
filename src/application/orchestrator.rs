//! Scan orchestration
//!
//! The orchestrator drives every scan through its lifecycle: it validates
//! the request, creates the scan record, fans checker invocations out with
//! bounded concurrency, keeps progress monotonically increasing in the scan
//! store, and materializes the final result exactly once.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::application::errors::ScanError;
use crate::application::reporting::{ReportFormat, ReportGenerator};
use crate::application::risk::RiskEngine;
use crate::domain::resources::Subscription;
use crate::domain::scan::{
    CheckerError, Finding, ResourceChecker, ResourceKind, ResourceProvider, ScanRequest,
    ScanResult, ScanState, ScanStatus,
};
use crate::infrastructure::registry::CheckerRegistry;
use crate::infrastructure::report_store::FileReportStore;
use crate::infrastructure::scan_store::ScanStore;

/// Destination for automatically rendered artifacts of completed scans.
#[derive(Clone)]
pub struct ReportSink {
    pub generator: Arc<ReportGenerator>,
    pub store: Arc<FileReportStore>,
}

/// Coordinates checkers, the scan store, and the risk engine.
pub struct ScanOrchestrator {
    store: Arc<dyn ScanStore>,
    provider: Arc<dyn ResourceProvider>,
    registry: Arc<CheckerRegistry>,
    risk_engine: RiskEngine,
    max_concurrent_checks: usize,
    report_sink: Option<ReportSink>,
}

impl ScanOrchestrator {
    pub fn new(
        store: Arc<dyn ScanStore>,
        provider: Arc<dyn ResourceProvider>,
        registry: Arc<CheckerRegistry>,
        max_concurrent_checks: usize,
    ) -> Self {
        Self {
            store,
            provider,
            registry,
            risk_engine: RiskEngine::new(),
            max_concurrent_checks: max_concurrent_checks.max(1),
            report_sink: None,
        }
    }

    /// Persist rendered reports for every completed scan.
    pub fn with_report_sink(mut self, sink: ReportSink) -> Self {
        self.report_sink = Some(sink);
        self
    }

    /// Validate the request, create the scan record, and kick off the scan.
    ///
    /// Returns immediately; all checker work happens off the calling path.
    pub async fn start_scan(self: &Arc<Self>, request: ScanRequest) -> Result<Uuid, ScanError> {
        let checkers = self
            .registry
            .resolve(request.resource_types.as_deref())
            .map_err(|e| ScanError::InvalidRequest(e.to_string()))?;

        let scan_id = Uuid::new_v4();
        let token = self.store.create(ScanStatus::new(scan_id)).await?;

        info!(scan_id = %scan_id, checkers = checkers.len(), "Scan created");

        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            orchestrator.run_scan(scan_id, request, checkers, token).await;
        });

        Ok(scan_id)
    }

    pub async fn get_status(&self, scan_id: Uuid) -> Result<ScanStatus, ScanError> {
        self.store
            .status(scan_id)
            .await?
            .ok_or(ScanError::NotFound(scan_id))
    }

    pub async fn get_result(&self, scan_id: Uuid) -> Result<ScanResult, ScanError> {
        let status = self
            .store
            .status(scan_id)
            .await?
            .ok_or(ScanError::NotFound(scan_id))?;

        if status.state != ScanState::Completed {
            return Err(ScanError::NotCompleted {
                scan_id,
                state: status.state,
            });
        }

        self.store.result(scan_id).await?.ok_or_else(|| {
            ScanError::Internal(format!("result missing for completed scan {}", scan_id))
        })
    }

    pub async fn list_scans(&self) -> Result<Vec<ScanStatus>, ScanError> {
        Ok(self.store.list().await?)
    }

    /// Cancel a running scan or remove a finished one.
    ///
    /// A non-terminal scan is cancelled cooperatively and kept in the store
    /// as failed, so later status polls observe the terminal state; a
    /// terminal scan is removed outright.
    pub async fn delete_scan(&self, scan_id: Uuid) -> Result<(), ScanError> {
        let status = self
            .store
            .status(scan_id)
            .await?
            .ok_or(ScanError::NotFound(scan_id))?;

        if status.state.is_terminal() {
            self.store.remove(scan_id).await?;
            info!(scan_id = %scan_id, "Scan removed");
            return Ok(());
        }

        if let Some(token) = self.store.cancellation_token(scan_id).await? {
            token.cancel();
        }
        self.store.fail(scan_id, "scan cancelled by client").await?;
        info!(scan_id = %scan_id, "Scan cancelled");
        Ok(())
    }

    async fn run_scan(
        &self,
        scan_id: Uuid,
        request: ScanRequest,
        checkers: Vec<Arc<dyn ResourceChecker>>,
        token: CancellationToken,
    ) {
        match self.execute(scan_id, &request, checkers, &token).await {
            Ok(Some(result)) => {
                if let Err(err) = self.store.complete(scan_id, result.clone()).await {
                    error!(scan_id = %scan_id, error = %err, "Failed to finalize scan");
                    let _ = self
                        .store
                        .fail(scan_id, &format!("failed to finalize scan: {}", err))
                        .await;
                    return;
                }
                info!(
                    scan_id = %scan_id,
                    findings = result.total_findings,
                    risk_score = result.risk_score,
                    "Scan completed"
                );
                self.persist_reports(scan_id, &result).await;
            }
            Ok(None) => {
                info!(scan_id = %scan_id, "Scan cancelled, results discarded");
            }
            Err(err) => {
                warn!(scan_id = %scan_id, error = %err, "Scan failed");
                if let Err(store_err) = self.store.fail(scan_id, &err.to_string()).await {
                    error!(scan_id = %scan_id, error = %store_err, "Failed to record scan failure");
                }
            }
        }
    }

    /// Run the scan to completion. Returns `Ok(None)` when the scan was
    /// cancelled while in flight.
    async fn execute(
        &self,
        scan_id: Uuid,
        request: &ScanRequest,
        checkers: Vec<Arc<dyn ResourceChecker>>,
        token: &CancellationToken,
    ) -> Result<Option<ScanResult>, ScanError> {
        let started = Instant::now();

        let subscriptions = self.resolve_subscriptions(request).await?;
        if subscriptions.is_empty() {
            return Err(ScanError::AuthenticationFailure(
                "no accessible subscriptions".to_string(),
            ));
        }

        if token.is_cancelled() {
            return Ok(None);
        }
        if self.store.mark_running(scan_id).await.is_err() {
            // The scan reached a terminal state before dispatch (cancelled).
            return Ok(None);
        }

        let total = subscriptions.len() * checkers.len();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_checks));
        let mut tasks: JoinSet<(String, ResourceKind, Result<Vec<Finding>, CheckerError>)> =
            JoinSet::new();

        for subscription in &subscriptions {
            for checker in &checkers {
                let checker = Arc::clone(checker);
                let provider = Arc::clone(&self.provider);
                let subscription = subscription.clone();
                let semaphore = Arc::clone(&semaphore);
                tasks.spawn(async move {
                    let kind = checker.kind();
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(err) => {
                            return (
                                subscription.id,
                                kind,
                                Err(CheckerError::Aborted(err.to_string())),
                            );
                        }
                    };
                    let outcome = checker.check(&subscription, provider.as_ref()).await;
                    (subscription.id, kind, outcome)
                });
            }
        }

        let mut findings: Vec<Finding> = Vec::new();
        let mut failed_invocations = 0usize;
        let mut completed = 0usize;

        while let Some(joined) = tasks.join_next().await {
            completed += 1;
            match joined {
                Ok((subscription_id, kind, Ok(batch))) => {
                    if !token.is_cancelled() {
                        info!(
                            scan_id = %scan_id,
                            subscription_id = %subscription_id,
                            checker = %kind,
                            findings = batch.len(),
                            "Checker invocation finished"
                        );
                        findings.extend(batch);
                    }
                }
                Ok((subscription_id, kind, Err(err))) => {
                    // Partial failure: annotated and skipped, never fatal and
                    // never reported as a finding.
                    failed_invocations += 1;
                    warn!(
                        scan_id = %scan_id,
                        subscription_id = %subscription_id,
                        checker = %kind,
                        error = %err,
                        "Checker invocation failed"
                    );
                }
                Err(join_err) => {
                    failed_invocations += 1;
                    error!(scan_id = %scan_id, error = %join_err, "Checker task aborted");
                }
            }
            self.store.record_progress(scan_id, completed, total).await?;
        }

        if token.is_cancelled() {
            return Ok(None);
        }

        if failed_invocations > 0 {
            warn!(
                scan_id = %scan_id,
                failed = failed_invocations,
                total,
                "Scan finished with partial resource errors"
            );
        }

        // Score over the full set; the threshold only filters what the
        // result reports back.
        let aggregate = self.risk_engine.score(&findings);
        let scanned_resources: HashSet<&str> =
            findings.iter().map(|f| f.resource_id.as_str()).collect();
        let total_resources_scanned = scanned_resources.len();

        let visible: Vec<Finding> = findings
            .into_iter()
            .filter(|f| f.severity >= request.severity_threshold)
            .collect();
        let visible_histogram = RiskEngine::histogram(&visible);

        let (subscription_id, subscription_name) = describe_targets(&subscriptions);

        Ok(Some(ScanResult {
            subscription_id,
            subscription_name,
            scan_timestamp: Utc::now(),
            total_resources_scanned,
            total_findings: visible.len(),
            findings_by_severity: visible_histogram,
            findings: visible,
            risk_score: aggregate.score,
            scan_duration_seconds: started.elapsed().as_secs_f64(),
        }))
    }

    async fn resolve_subscriptions(
        &self,
        request: &ScanRequest,
    ) -> Result<Vec<Subscription>, ScanError> {
        match &request.subscription_id {
            Some(id) => {
                let subscription = self
                    .provider
                    .get_subscription(id)
                    .await
                    .map_err(|e| ScanError::AuthenticationFailure(e.to_string()))?
                    .ok_or_else(|| {
                        ScanError::AuthenticationFailure(format!(
                            "subscription {} is not accessible",
                            id
                        ))
                    })?;
                Ok(vec![subscription])
            }
            None => {
                let subscriptions = self
                    .provider
                    .list_subscriptions()
                    .await
                    .map_err(|e| ScanError::AuthenticationFailure(e.to_string()))?;
                Ok(subscriptions
                    .into_iter()
                    .filter(Subscription::is_enabled)
                    .collect())
            }
        }
    }

    async fn persist_reports(&self, scan_id: Uuid, result: &ScanResult) {
        let Some(sink) = &self.report_sink else {
            return;
        };

        for format in [ReportFormat::Json, ReportFormat::Html, ReportFormat::Summary] {
            let artifact = match sink.generator.render(result, format) {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!(scan_id = %scan_id, format = %format, error = %err, "Report rendering failed");
                    continue;
                }
            };
            let filename = ReportGenerator::filename(scan_id, format);
            if let Err(err) = sink.store.save(&filename, &artifact).await {
                warn!(scan_id = %scan_id, format = %format, error = %err, "Report persistence failed");
            }
        }
    }
}

fn describe_targets(subscriptions: &[Subscription]) -> (String, Option<String>) {
    match subscriptions {
        [single] => (single.id.clone(), Some(single.display_name.clone())),
        many => {
            let joined = many
                .iter()
                .map(|s| s.id.as_str())
                .collect::<Vec<_>>()
                .join(",");
            (joined, None)
        }
    }
}

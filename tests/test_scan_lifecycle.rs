//! Integration tests for the scan lifecycle
//!
//! Uses an in-memory resource provider so no Azure access is needed.

mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use cloudposture::application::errors::ScanError;
use cloudposture::application::orchestrator::ScanOrchestrator;
use cloudposture::domain::scan::{ResourceKind, ScanRequest, ScanState, ScanStatus, Severity};
use cloudposture::infrastructure::registry::CheckerRegistry;
use cloudposture::infrastructure::scan_store::InMemoryScanStore;

use common::{
    disabled_subscription, enabled_subscription, orchestrator_with, StaticResourceProvider,
};

fn full_request(threshold: Severity) -> ScanRequest {
    ScanRequest {
        subscription_id: None,
        resource_types: None,
        severity_threshold: threshold,
    }
}

async fn wait_for_terminal(orchestrator: &ScanOrchestrator, scan_id: Uuid) -> ScanStatus {
    for _ in 0..500 {
        let status = orchestrator.get_status(scan_id).await.unwrap();
        if status.state.is_terminal() {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("scan {} did not reach a terminal state in time", scan_id);
}

#[tokio::test]
async fn full_scan_completes_with_findings() {
    let provider = Arc::new(StaticResourceProvider::with_subscriptions(vec![
        enabled_subscription("sub-1", "Production"),
    ]));
    let orchestrator = orchestrator_with(provider);

    let scan_id = orchestrator
        .start_scan(full_request(Severity::Low))
        .await
        .unwrap();

    let status = wait_for_terminal(&orchestrator, scan_id).await;
    assert_eq!(status.state, ScanState::Completed);
    assert_eq!(status.progress, 100);
    assert!(status.completed_at.is_some());
    assert!(status.error_message.is_none());

    let result = orchestrator.get_result(scan_id).await.unwrap();
    // storage + network + disk are high, vault is medium; vm/workspace clean
    assert_eq!(result.total_findings, 4);
    assert_eq!(result.findings_by_severity[&Severity::High], 3);
    assert_eq!(result.findings_by_severity[&Severity::Medium], 1);
    assert_eq!(
        result.findings_by_severity.values().sum::<usize>(),
        result.total_findings
    );
    assert!(result.risk_score > 0 && result.risk_score <= 100);
    assert_eq!(result.subscription_id, "sub-1");
    assert_eq!(result.subscription_name.as_deref(), Some("Production"));
    // Findings came from 4 distinct resources
    assert_eq!(result.total_resources_scanned, 4);
}

#[tokio::test]
async fn partial_failure_does_not_fail_the_scan() {
    // Two enabled subscriptions, all five checkers: 10 invocations.
    // The security-group fetch for sub-2 times out; the other 9 succeed.
    let mut provider = StaticResourceProvider::with_subscriptions(vec![
        enabled_subscription("sub-1", "Production"),
        enabled_subscription("sub-2", "Staging"),
    ]);
    provider.timeout_security_groups_for = HashSet::from(["sub-2".to_string()]);
    let orchestrator = orchestrator_with(Arc::new(provider));

    let scan_id = orchestrator
        .start_scan(full_request(Severity::Low))
        .await
        .unwrap();

    let status = wait_for_terminal(&orchestrator, scan_id).await;
    assert_eq!(status.state, ScanState::Completed, "timeout must not fail the scan");
    assert_eq!(status.progress, 100);

    let result = orchestrator.get_result(scan_id).await.unwrap();
    // sub-1 contributes 4 findings, sub-2 contributes 3 (no NSG findings)
    assert_eq!(result.total_findings, 7);
    assert_eq!(result.findings_by_severity[&Severity::High], 5);
    assert_eq!(result.findings_by_severity[&Severity::Medium], 2);
    // No residual findings from the timed-out invocation
    assert!(result
        .findings
        .iter()
        .all(|f| !(f.subscription_id == "sub-2"
            && f.resource_type == ResourceKind::NetworkSecurityGroup)));
    assert_eq!(result.subscription_id, "sub-1,sub-2");
    assert!(result.subscription_name.is_none());
}

#[tokio::test]
async fn threshold_filters_findings_but_not_the_score() {
    let subscriptions = vec![enabled_subscription("sub-1", "Production")];

    let lenient = orchestrator_with(Arc::new(StaticResourceProvider::with_subscriptions(
        subscriptions.clone(),
    )));
    let strict = orchestrator_with(Arc::new(StaticResourceProvider::with_subscriptions(
        subscriptions,
    )));

    let lenient_id = lenient.start_scan(full_request(Severity::Low)).await.unwrap();
    let strict_id = strict.start_scan(full_request(Severity::High)).await.unwrap();
    wait_for_terminal(&lenient, lenient_id).await;
    wait_for_terminal(&strict, strict_id).await;

    let lenient_result = lenient.get_result(lenient_id).await.unwrap();
    let strict_result = strict.get_result(strict_id).await.unwrap();

    // Every reported finding honours the threshold
    assert!(strict_result
        .findings
        .iter()
        .all(|f| f.severity >= Severity::High));
    assert_eq!(strict_result.total_findings, 3);
    assert_eq!(lenient_result.total_findings, 4);

    // The aggregate score is computed before filtering
    assert_eq!(strict_result.risk_score, lenient_result.risk_score);
}

#[tokio::test]
async fn concurrent_scans_are_independent() {
    let provider = Arc::new(StaticResourceProvider::with_subscriptions(vec![
        enabled_subscription("sub-1", "Production"),
    ]));
    let orchestrator = orchestrator_with(provider);

    let (first, second) = tokio::join!(
        orchestrator.start_scan(full_request(Severity::Low)),
        orchestrator.start_scan(full_request(Severity::Low)),
    );
    let first = first.unwrap();
    let second = second.unwrap();
    assert_ne!(first, second);

    let first_status = wait_for_terminal(&orchestrator, first).await;
    let second_status = wait_for_terminal(&orchestrator, second).await;
    assert_eq!(first_status.state, ScanState::Completed);
    assert_eq!(second_status.state, ScanState::Completed);
    assert_eq!(first_status.progress, 100);
    assert_eq!(second_status.progress, 100);

    assert_eq!(orchestrator.list_scans().await.unwrap().len(), 2);
}

#[tokio::test]
async fn progress_is_monotone_and_reaches_exactly_100() {
    let mut provider = StaticResourceProvider::with_subscriptions(vec![
        enabled_subscription("sub-1", "Production"),
        enabled_subscription("sub-2", "Staging"),
    ]);
    provider.fetch_delay = Some(Duration::from_millis(30));
    let orchestrator = Arc::new(ScanOrchestrator::new(
        Arc::new(InMemoryScanStore::new()),
        Arc::new(provider),
        common::full_registry(),
        2, // stretch the fan-out so several progress values are observable
    ));

    let scan_id = orchestrator
        .start_scan(full_request(Severity::Low))
        .await
        .unwrap();

    let mut observed = Vec::new();
    loop {
        let status = orchestrator.get_status(scan_id).await.unwrap();
        observed.push(status.progress);
        if status.state.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert!(
        observed.windows(2).all(|pair| pair[0] <= pair[1]),
        "progress went backwards: {:?}",
        observed
    );
    assert_eq!(*observed.last().unwrap(), 100);
}

#[tokio::test]
async fn cancelling_a_running_scan_discards_results() {
    let mut provider = StaticResourceProvider::with_subscriptions(vec![
        enabled_subscription("sub-1", "Production"),
    ]);
    provider.fetch_delay = Some(Duration::from_millis(200));
    let orchestrator = orchestrator_with(Arc::new(provider));

    let scan_id = orchestrator
        .start_scan(full_request(Severity::Low))
        .await
        .unwrap();

    // Let the scan get past subscription resolution
    tokio::time::sleep(Duration::from_millis(300)).await;
    orchestrator.delete_scan(scan_id).await.unwrap();

    let status = orchestrator.get_status(scan_id).await.unwrap();
    assert_eq!(status.state, ScanState::Failed);
    assert_eq!(
        status.error_message.as_deref(),
        Some("scan cancelled by client")
    );

    // In-flight invocations finish but their results are discarded
    tokio::time::sleep(Duration::from_millis(600)).await;
    let status = orchestrator.get_status(scan_id).await.unwrap();
    assert_eq!(status.state, ScanState::Failed);
    assert!(matches!(
        orchestrator.get_result(scan_id).await,
        Err(ScanError::NotCompleted { .. })
    ));
}

#[tokio::test]
async fn deleting_a_completed_scan_removes_it() {
    let provider = Arc::new(StaticResourceProvider::with_subscriptions(vec![
        enabled_subscription("sub-1", "Production"),
    ]));
    let orchestrator = orchestrator_with(provider);

    let scan_id = orchestrator
        .start_scan(full_request(Severity::Low))
        .await
        .unwrap();
    wait_for_terminal(&orchestrator, scan_id).await;

    orchestrator.delete_scan(scan_id).await.unwrap();
    assert!(matches!(
        orchestrator.get_status(scan_id).await,
        Err(ScanError::NotFound(_))
    ));
}

#[tokio::test]
async fn unknown_identifiers_are_not_found() {
    let provider = Arc::new(StaticResourceProvider::with_subscriptions(vec![
        enabled_subscription("sub-1", "Production"),
    ]));
    let orchestrator = orchestrator_with(provider);

    let unknown = Uuid::new_v4();
    assert!(matches!(
        orchestrator.get_status(unknown).await,
        Err(ScanError::NotFound(_))
    ));
    assert!(matches!(
        orchestrator.get_result(unknown).await,
        Err(ScanError::NotFound(_))
    ));
    assert!(matches!(
        orchestrator.delete_scan(unknown).await,
        Err(ScanError::NotFound(_))
    ));
}

#[tokio::test]
async fn result_of_a_running_scan_is_not_available() {
    let mut provider = StaticResourceProvider::with_subscriptions(vec![
        enabled_subscription("sub-1", "Production"),
    ]);
    provider.fetch_delay = Some(Duration::from_millis(300));
    let orchestrator = orchestrator_with(Arc::new(provider));

    let scan_id = orchestrator
        .start_scan(full_request(Severity::Low))
        .await
        .unwrap();

    assert!(matches!(
        orchestrator.get_result(scan_id).await,
        Err(ScanError::NotCompleted { .. })
    ));

    wait_for_terminal(&orchestrator, scan_id).await;
}

#[tokio::test]
async fn unregistered_resource_type_rejects_the_request() {
    let provider = Arc::new(StaticResourceProvider::with_subscriptions(vec![
        enabled_subscription("sub-1", "Production"),
    ]));
    let mut registry = CheckerRegistry::new();
    registry.register(Arc::new(
        cloudposture::infrastructure::checkers::StorageChecker,
    ));
    let orchestrator = Arc::new(ScanOrchestrator::new(
        Arc::new(InMemoryScanStore::new()),
        provider,
        Arc::new(registry),
        4,
    ));

    let request = ScanRequest {
        subscription_id: None,
        resource_types: Some(vec![ResourceKind::NetworkSecurityGroup]),
        severity_threshold: Severity::Low,
    };
    assert!(matches!(
        orchestrator.start_scan(request).await,
        Err(ScanError::InvalidRequest(_))
    ));

    // Rejected synchronously, so no scan record was created
    assert!(orchestrator.list_scans().await.unwrap().is_empty());
}

#[tokio::test]
async fn no_accessible_subscriptions_fails_the_scan() {
    let provider = Arc::new(StaticResourceProvider::with_subscriptions(vec![
        disabled_subscription("sub-off"),
    ]));
    let orchestrator = orchestrator_with(provider);

    let scan_id = orchestrator
        .start_scan(full_request(Severity::Low))
        .await
        .unwrap();

    let status = wait_for_terminal(&orchestrator, scan_id).await;
    assert_eq!(status.state, ScanState::Failed);
    assert!(status
        .error_message
        .as_deref()
        .unwrap()
        .contains("no accessible subscriptions"));
}

#[tokio::test]
async fn explicit_unknown_subscription_fails_the_scan() {
    let provider = Arc::new(StaticResourceProvider::with_subscriptions(vec![
        enabled_subscription("sub-1", "Production"),
    ]));
    let orchestrator = orchestrator_with(provider);

    let request = ScanRequest {
        subscription_id: Some("sub-unknown".to_string()),
        resource_types: None,
        severity_threshold: Severity::Low,
    };
    let scan_id = orchestrator.start_scan(request).await.unwrap();

    let status = wait_for_terminal(&orchestrator, scan_id).await;
    assert_eq!(status.state, ScanState::Failed);
    assert!(status
        .error_message
        .as_deref()
        .unwrap()
        .contains("sub-unknown"));
}

//! API contract tests for request and response models

use cloudposture::domain::scan::{ScanState, ScanStatus, Severity};
use cloudposture::presentation::models::{ErrorResponse, ScanStartRequest};
use uuid::Uuid;

#[test]
fn scan_start_request_accepts_the_documented_shape() {
    let raw = serde_json::json!({
        "subscription_id": "4cb3f0ae-cf46-4a14-b7a9-7a3dc8e9d1f2",
        "resource_types": ["Microsoft.Storage/storageAccounts", "network"],
        "severity_threshold": "medium"
    });

    let request: ScanStartRequest =
        serde_json::from_value(raw).expect("request deserialization should succeed");
    let domain = request.into_domain(Severity::Low).unwrap();
    assert_eq!(
        domain.subscription_id.as_deref(),
        Some("4cb3f0ae-cf46-4a14-b7a9-7a3dc8e9d1f2")
    );
    assert_eq!(domain.severity_threshold, Severity::Medium);
}

#[test]
fn empty_request_body_is_valid() {
    let request: ScanStartRequest = serde_json::from_value(serde_json::json!({})).unwrap();
    let domain = request.into_domain(Severity::Low).unwrap();
    assert!(domain.subscription_id.is_none());
    assert!(domain.resource_types.is_none());
}

#[test]
fn scan_status_serializes_lowercase_states() {
    let status = ScanStatus::new(Uuid::nil());
    let value = serde_json::to_value(&status).unwrap();
    assert_eq!(value["state"], "pending");
    assert_eq!(value["progress"], 0);
    assert!(value["completed_at"].is_null());

    let mut running = status;
    running.transition(ScanState::Running).unwrap();
    let value = serde_json::to_value(&running).unwrap();
    assert_eq!(value["state"], "running");
}

#[test]
fn error_envelope_round_trips() {
    let body = ErrorResponse {
        error: "Scan not found".to_string(),
        status_code: 404,
    };
    let raw = serde_json::to_string(&body).unwrap();
    let parsed: ErrorResponse = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed.status_code, 404);
    assert_eq!(parsed.error, "Scan not found");
}

#[test]
fn severity_histogram_keys_serialize_as_names() {
    use cloudposture::application::risk::RiskEngine;
    let histogram = RiskEngine::histogram(&[]);
    let value = serde_json::to_value(&histogram).unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object.len(), 5);
    assert!(object.contains_key("critical"));
    assert!(object.contains_key("info"));
}

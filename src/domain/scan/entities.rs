//! Scan domain entities

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::value_objects::{ResourceKind, ScanState, ScanTransitionError, Severity};

/// A detected misconfiguration on a single resource.
///
/// Immutable once emitted by a checker.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Finding {
    /// Unique finding identifier
    pub id: Uuid,
    /// Full ARM resource id
    pub resource_id: String,
    pub resource_name: String,
    pub resource_type: ResourceKind,
    pub subscription_id: String,
    pub resource_group: String,
    /// Azure region
    pub location: String,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    /// Remediation recommendation
    pub recommendation: String,
    /// Per-finding risk contribution (0-100)
    pub risk_score: u8,
    /// Additional rule-specific context. Kept ordered so rendered reports
    /// are byte-stable.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub detected_at: DateTime<Utc>,
}

impl Finding {
    pub fn builder(resource_id: impl Into<String>, resource_name: impl Into<String>) -> FindingBuilder {
        FindingBuilder::new(resource_id, resource_name)
    }
}

/// Builder for constructing findings
pub struct FindingBuilder {
    finding: Finding,
}

impl FindingBuilder {
    pub fn new(resource_id: impl Into<String>, resource_name: impl Into<String>) -> Self {
        Self {
            finding: Finding {
                id: Uuid::new_v4(),
                resource_id: resource_id.into(),
                resource_name: resource_name.into(),
                resource_type: ResourceKind::StorageAccount,
                subscription_id: String::new(),
                resource_group: String::new(),
                location: String::new(),
                title: String::new(),
                description: String::new(),
                severity: Severity::Info,
                recommendation: String::new(),
                risk_score: 0,
                metadata: BTreeMap::new(),
                detected_at: Utc::now(),
            },
        }
    }

    pub fn resource_type(mut self, kind: ResourceKind) -> Self {
        self.finding.resource_type = kind;
        self
    }

    pub fn subscription(mut self, subscription_id: impl Into<String>) -> Self {
        self.finding.subscription_id = subscription_id.into();
        self
    }

    pub fn resource_group(mut self, group: impl Into<String>) -> Self {
        self.finding.resource_group = group.into();
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.finding.location = location.into();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.finding.title = title.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.finding.description = description.into();
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.finding.severity = severity;
        self
    }

    pub fn recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.finding.recommendation = recommendation.into();
        self
    }

    pub fn risk_score(mut self, score: u8) -> Self {
        self.finding.risk_score = score.min(100);
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.finding.metadata.insert(key.into(), value);
        self
    }

    pub fn build(self) -> Finding {
        self.finding
    }
}

/// A scan request, already validated at the API boundary.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    /// Absent means all accessible subscriptions
    pub subscription_id: Option<String>,
    /// Absent means all registered checkers
    pub resource_types: Option<Vec<ResourceKind>>,
    /// Findings below this severity are excluded from the result
    pub severity_threshold: Severity,
}

/// Mutable state of one scan, owned by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScanStatus {
    pub scan_id: Uuid,
    pub state: ScanState,
    /// Progress percentage, never decreasing within a scan's lifetime
    pub progress: u8,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl ScanStatus {
    pub fn new(scan_id: Uuid) -> Self {
        Self {
            scan_id,
            state: ScanState::Pending,
            progress: 0,
            started_at: Utc::now(),
            completed_at: None,
            error_message: None,
        }
    }

    /// Transition to `target`, validating against the state machine.
    /// Terminal transitions stamp `completed_at`.
    pub fn transition(&mut self, target: ScanState) -> Result<(), ScanTransitionError> {
        if !self.state.can_transition_to(target) {
            return Err(ScanTransitionError {
                from: self.state,
                to: target,
            });
        }
        self.state = target;
        if target.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        Ok(())
    }
}

/// The immutable outcome of a completed scan.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScanResult {
    /// Scanned subscription id; comma-joined when the scan covered several
    pub subscription_id: String,
    pub subscription_name: Option<String>,
    pub scan_timestamp: DateTime<Utc>,
    pub total_resources_scanned: usize,
    /// Number of findings in `findings` (after threshold filtering)
    pub total_findings: usize,
    /// Counts per severity for the reported findings, all levels present
    #[schema(value_type = Object)]
    pub findings_by_severity: BTreeMap<Severity, usize>,
    pub findings: Vec<Finding>,
    /// Aggregate risk score (0-100), computed over the unfiltered finding set
    pub risk_score: u8,
    pub scan_duration_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finding_builder_sets_fields() {
        let finding = Finding::builder("/subscriptions/s1/x", "x")
            .resource_type(ResourceKind::KeyVault)
            .subscription("s1")
            .resource_group("rg-prod")
            .location("westeurope")
            .title("Soft Delete Not Enabled")
            .severity(Severity::Medium)
            .recommendation("Enable soft delete")
            .risk_score(50)
            .meta("soft_delete_enabled", serde_json::json!(false))
            .build();

        assert_eq!(finding.severity, Severity::Medium);
        assert_eq!(finding.resource_group, "rg-prod");
        assert_eq!(finding.risk_score, 50);
        assert!(finding.metadata.contains_key("soft_delete_enabled"));
    }

    #[test]
    fn risk_score_is_clamped() {
        let finding = Finding::builder("id", "name").risk_score(250).build();
        assert_eq!(finding.risk_score, 100);
    }

    #[test]
    fn status_transitions_follow_state_machine() {
        let mut status = ScanStatus::new(Uuid::new_v4());
        assert!(status.transition(ScanState::Running).is_ok());
        assert!(status.completed_at.is_none());
        assert!(status.transition(ScanState::Completed).is_ok());
        assert!(status.completed_at.is_some());
        // Terminal state never transitions again
        assert!(status.transition(ScanState::Failed).is_err());
    }

    #[test]
    fn pending_scan_can_fail_directly() {
        let mut status = ScanStatus::new(Uuid::new_v4());
        assert!(status.transition(ScanState::Failed).is_ok());
        assert!(status.state.is_terminal());
    }
}

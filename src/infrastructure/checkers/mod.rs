//! Per-resource-type checkers
//!
//! Each checker evaluates a fixed table of rules against every fetched
//! resource. The tables are data: predicate, severity, title, and
//! recommendation per rule; the orchestrator never looks inside.

pub mod compute;
pub mod keyvault;
pub mod network;
pub mod storage;
pub mod workspace;

pub use compute::ComputeChecker;
pub use keyvault::KeyVaultChecker;
pub use network::NetworkChecker;
pub use storage::StorageChecker;
pub use workspace::WorkspaceChecker;

use std::collections::BTreeMap;

use crate::domain::resources::resource_group_of;
use crate::domain::scan::{Finding, ResourceKind, Severity};

pub(crate) type Metadata = BTreeMap<String, serde_json::Value>;

/// One entry of a checker's rule table.
pub(crate) struct Rule<T> {
    pub title: &'static str,
    pub severity: Severity,
    /// Base risk fed into the per-finding contribution
    pub base_risk: u8,
    pub recommendation: &'static str,
    pub matches: fn(&T) -> bool,
    pub describe: fn(&T) -> String,
    pub annotate: fn(&T) -> Metadata,
}

/// Identity of the resource a finding is attached to.
pub(crate) struct FindingTarget<'a> {
    pub resource_id: &'a str,
    pub resource_name: &'a str,
    pub kind: ResourceKind,
    pub subscription_id: &'a str,
    pub location: &'a str,
}

/// Per-finding risk contribution: the rule's base risk scaled by severity.
pub(crate) fn contribution(severity: Severity, base_risk: u8) -> u8 {
    let multiplier = match severity {
        Severity::Critical => 1.0,
        Severity::High => 0.8,
        Severity::Medium => 0.6,
        Severity::Low => 0.4,
        Severity::Info => 0.2,
    };
    ((f64::from(base_risk) * multiplier) as u8).min(100)
}

/// Evaluate a rule table against one resource.
pub(crate) fn evaluate<T>(rules: &[Rule<T>], resource: &T, target: &FindingTarget<'_>) -> Vec<Finding> {
    rules
        .iter()
        .filter(|rule| (rule.matches)(resource))
        .map(|rule| {
            let mut builder = Finding::builder(target.resource_id, target.resource_name)
                .resource_type(target.kind)
                .subscription(target.subscription_id)
                .resource_group(resource_group_of(target.resource_id))
                .location(target.location)
                .title(rule.title)
                .description((rule.describe)(resource))
                .severity(rule.severity)
                .recommendation(rule.recommendation)
                .risk_score(contribution(rule.severity, rule.base_risk));
            for (key, value) in (rule.annotate)(resource) {
                builder = builder.meta(key, value);
            }
            builder.build()
        })
        .collect()
}

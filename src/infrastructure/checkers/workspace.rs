//! Databricks workspace checker

use async_trait::async_trait;

use crate::domain::resources::{Subscription, Workspace};
use crate::domain::scan::{
    CheckerError, Finding, ResourceChecker, ResourceKind, ResourceProvider, Severity,
};

use super::{evaluate, FindingTarget, Metadata, Rule};

const RULES: &[Rule<Workspace>] = &[
    Rule {
        title: "Databricks Workspace Public Access Enabled",
        severity: Severity::High,
        base_risk: 80,
        recommendation:
            "Disable public network access and use private endpoints or VNet injection",
        matches: |workspace| workspace.public_network_access,
        describe: |workspace| {
            format!(
                "Databricks workspace '{}' allows public network access",
                workspace.name
            )
        },
        annotate: |workspace| {
            let mut meta = Metadata::new();
            meta.insert(
                "public_network_access".into(),
                serde_json::json!(if workspace.public_network_access {
                    "Enabled"
                } else {
                    "Disabled"
                }),
            );
            meta
        },
    },
    Rule {
        title: "Insecure Cluster Connectivity",
        severity: Severity::Medium,
        base_risk: 50,
        recommendation: "Enable secure cluster connectivity for enhanced security",
        matches: |workspace| !workspace.secure_cluster_connectivity,
        describe: |workspace| {
            format!(
                "Databricks workspace '{}' does not have secure cluster connectivity enabled",
                workspace.name
            )
        },
        annotate: |workspace| {
            let mut meta = Metadata::new();
            meta.insert(
                "secure_connectivity".into(),
                serde_json::json!(workspace.secure_cluster_connectivity),
            );
            meta
        },
    },
    Rule {
        title: "Not Using Customer-Managed Keys",
        severity: Severity::Low,
        base_risk: 30,
        recommendation: "Consider using customer-managed keys for enhanced data protection",
        matches: |workspace| !workspace.customer_managed_keys,
        describe: |workspace| {
            format!(
                "Databricks workspace '{}' is using platform-managed keys instead of customer-managed keys",
                workspace.name
            )
        },
        annotate: |workspace| {
            let mut meta = Metadata::new();
            meta.insert(
                "encryption_key_source".into(),
                serde_json::json!(if workspace.customer_managed_keys {
                    "Microsoft.Keyvault"
                } else {
                    "Platform"
                }),
            );
            meta
        },
    },
    Rule {
        title: "No Private Endpoints Configured",
        severity: Severity::Medium,
        base_risk: 45,
        recommendation: "Configure private endpoints to eliminate public internet exposure",
        matches: |workspace| workspace.private_endpoint_count == 0,
        describe: |workspace| {
            format!(
                "Databricks workspace '{}' does not have private endpoints configured",
                workspace.name
            )
        },
        annotate: |workspace| {
            let mut meta = Metadata::new();
            meta.insert(
                "private_endpoints".into(),
                serde_json::json!(workspace.private_endpoint_count),
            );
            meta
        },
    },
    Rule {
        title: "No Workspace Isolation",
        severity: Severity::Medium,
        base_risk: 55,
        recommendation: "Implement workspace isolation using VNet injection for enhanced security",
        matches: |workspace| workspace.virtual_network_id.is_none(),
        describe: |workspace| {
            format!(
                "Databricks workspace '{}' may not have proper network isolation",
                workspace.name
            )
        },
        annotate: |workspace| {
            let mut meta = Metadata::new();
            meta.insert(
                "virtual_network_id".into(),
                serde_json::json!(workspace.virtual_network_id),
            );
            meta
        },
    },
];

/// Checker for Databricks workspace misconfigurations.
#[derive(Debug)]
pub struct WorkspaceChecker;

#[async_trait]
impl ResourceChecker for WorkspaceChecker {
    fn kind(&self) -> ResourceKind {
        ResourceKind::DatabricksWorkspace
    }

    async fn check(
        &self,
        subscription: &Subscription,
        provider: &dyn ResourceProvider,
    ) -> Result<Vec<Finding>, CheckerError> {
        let workspaces = provider.list_workspaces(&subscription.id).await?;

        let mut findings = Vec::new();
        for workspace in &workspaces {
            let target = FindingTarget {
                resource_id: &workspace.id,
                resource_name: &workspace.name,
                kind: ResourceKind::DatabricksWorkspace,
                subscription_id: &subscription.id,
                location: &workspace.location,
            };
            findings.extend(evaluate(RULES, workspace, &target));
        }
        Ok(findings)
    }
}

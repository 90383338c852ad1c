//! Key vault checker

use async_trait::async_trait;

use crate::domain::resources::{KeyVault, NetworkDefaultAction, Subscription};
use crate::domain::scan::{
    CheckerError, Finding, ResourceChecker, ResourceKind, ResourceProvider, Severity,
};

use super::{evaluate, FindingTarget, Metadata, Rule};

const RULES: &[Rule<KeyVault>] = &[
    Rule {
        title: "Key Vault Allows Public Network Access",
        severity: Severity::High,
        base_risk: 75,
        recommendation: "Enable Key Vault firewall and restrict access to trusted networks",
        // Absent network ACLs mean unrestricted access
        matches: |vault| {
            vault.network_default_action.is_none()
                || vault.network_default_action == Some(NetworkDefaultAction::Allow)
        },
        describe: |vault| {
            format!(
                "Key Vault '{}' is accessible from public networks without firewall restrictions",
                vault.name
            )
        },
        annotate: |vault| {
            let mut meta = Metadata::new();
            meta.insert(
                "public_network_access".into(),
                serde_json::json!(match vault.network_default_action {
                    Some(NetworkDefaultAction::Deny) => "Deny",
                    _ => "Allow",
                }),
            );
            meta.insert("bypass".into(), serde_json::json!(vault.network_bypass));
            meta
        },
    },
    Rule {
        title: "Soft Delete Not Enabled",
        severity: Severity::Medium,
        base_risk: 50,
        recommendation:
            "Enable soft delete to protect against accidental deletion of secrets and keys",
        matches: |vault| !vault.soft_delete_enabled,
        describe: |vault| {
            format!(
                "Key Vault '{}' does not have soft delete protection enabled",
                vault.name
            )
        },
        annotate: |vault| {
            let mut meta = Metadata::new();
            meta.insert(
                "soft_delete_enabled".into(),
                serde_json::json!(vault.soft_delete_enabled),
            );
            meta
        },
    },
    Rule {
        title: "Purge Protection Not Enabled",
        severity: Severity::Medium,
        base_risk: 45,
        recommendation: "Enable purge protection to prevent permanent deletion of soft-deleted items",
        matches: |vault| !vault.purge_protection_enabled,
        describe: |vault| {
            format!(
                "Key Vault '{}' does not have purge protection enabled",
                vault.name
            )
        },
        annotate: |vault| {
            let mut meta = Metadata::new();
            meta.insert(
                "purge_protection_enabled".into(),
                serde_json::json!(vault.purge_protection_enabled),
            );
            meta
        },
    },
    Rule {
        title: "Not Using RBAC Authorization",
        severity: Severity::Low,
        base_risk: 30,
        recommendation:
            "Consider using Azure RBAC for more granular and centralized access control",
        matches: |vault| !vault.rbac_authorization_enabled,
        describe: |vault| {
            format!(
                "Key Vault '{}' is using access policies instead of Azure RBAC for authorization",
                vault.name
            )
        },
        annotate: |vault| {
            let mut meta = Metadata::new();
            meta.insert(
                "enable_rbac_authorization".into(),
                serde_json::json!(vault.rbac_authorization_enabled),
            );
            meta
        },
    },
    Rule {
        title: "Azure Services Bypass Enabled",
        severity: Severity::Low,
        base_risk: 25,
        recommendation:
            "Review if Azure services bypass is necessary for your security requirements",
        matches: |vault| {
            vault
                .network_bypass
                .as_deref()
                .is_some_and(|bypass| bypass.contains("AzureServices"))
        },
        describe: |vault| {
            format!(
                "Key Vault '{}' allows Azure services to bypass network rules",
                vault.name
            )
        },
        annotate: |vault| {
            let mut meta = Metadata::new();
            meta.insert(
                "bypass_services".into(),
                serde_json::json!(vault.network_bypass),
            );
            meta
        },
    },
];

/// Checker for key vault misconfigurations.
#[derive(Debug)]
pub struct KeyVaultChecker;

#[async_trait]
impl ResourceChecker for KeyVaultChecker {
    fn kind(&self) -> ResourceKind {
        ResourceKind::KeyVault
    }

    async fn check(
        &self,
        subscription: &Subscription,
        provider: &dyn ResourceProvider,
    ) -> Result<Vec<Finding>, CheckerError> {
        let vaults = provider.list_key_vaults(&subscription.id).await?;

        let mut findings = Vec::new();
        for vault in &vaults {
            let target = FindingTarget {
                resource_id: &vault.id,
                resource_name: &vault.name,
                kind: ResourceKind::KeyVault,
                subscription_id: &subscription.id,
                location: &vault.location,
            };
            findings.extend(evaluate(RULES, vault, &target));
        }
        Ok(findings)
    }
}

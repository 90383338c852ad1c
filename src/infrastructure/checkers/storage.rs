//! Storage account checker

use async_trait::async_trait;

use crate::domain::resources::{NetworkDefaultAction, StorageAccount, Subscription};
use crate::domain::scan::{
    CheckerError, Finding, ResourceChecker, ResourceKind, ResourceProvider, Severity,
};

use super::{evaluate, FindingTarget, Metadata, Rule};

const RULES: &[Rule<StorageAccount>] = &[
    Rule {
        title: "Public Blob Access Enabled",
        severity: Severity::High,
        base_risk: 80,
        recommendation: "Disable public blob access and use private endpoints or SAS tokens",
        matches: |account| account.allow_blob_public_access,
        describe: |account| {
            format!(
                "Storage account '{}' allows public access to blob containers",
                account.name
            )
        },
        annotate: |account| {
            let mut meta = Metadata::new();
            meta.insert(
                "allow_blob_public_access".into(),
                serde_json::json!(account.allow_blob_public_access),
            );
            meta
        },
    },
    Rule {
        title: "Insecure Transfer Enabled",
        severity: Severity::Medium,
        base_risk: 60,
        recommendation: "Enable 'Secure transfer required' to enforce HTTPS",
        matches: |account| !account.https_traffic_only,
        describe: |account| {
            format!(
                "Storage account '{}' allows unencrypted HTTP traffic",
                account.name
            )
        },
        annotate: |account| {
            let mut meta = Metadata::new();
            meta.insert(
                "https_traffic_only".into(),
                serde_json::json!(account.https_traffic_only),
            );
            meta
        },
    },
    Rule {
        title: "Storage Encryption Not Fully Enabled",
        severity: Severity::Medium,
        base_risk: 50,
        recommendation: "Enable encryption for all storage services (blob, file, queue, table)",
        matches: |account| !account.blob_encryption_enabled || !account.file_encryption_enabled,
        describe: |account| {
            format!(
                "Storage account '{}' has encryption disabled for some services",
                account.name
            )
        },
        annotate: |account| {
            let mut meta = Metadata::new();
            meta.insert(
                "blob_encryption".into(),
                serde_json::json!(account.blob_encryption_enabled),
            );
            meta.insert(
                "file_encryption".into(),
                serde_json::json!(account.file_encryption_enabled),
            );
            meta
        },
    },
    Rule {
        title: "Default Network Access Allowed",
        severity: Severity::Medium,
        base_risk: 55,
        recommendation:
            "Configure network rules to restrict access to specific IP ranges or virtual networks",
        matches: |account| account.network_default_action == Some(NetworkDefaultAction::Allow),
        describe: |account| {
            format!(
                "Storage account '{}' allows public network access by default",
                account.name
            )
        },
        annotate: |_| {
            let mut meta = Metadata::new();
            meta.insert("default_action".into(), serde_json::json!("Allow"));
            meta
        },
    },
];

/// Checker for storage account misconfigurations.
#[derive(Debug)]
pub struct StorageChecker;

#[async_trait]
impl ResourceChecker for StorageChecker {
    fn kind(&self) -> ResourceKind {
        ResourceKind::StorageAccount
    }

    async fn check(
        &self,
        subscription: &Subscription,
        provider: &dyn ResourceProvider,
    ) -> Result<Vec<Finding>, CheckerError> {
        let accounts = provider.list_storage_accounts(&subscription.id).await?;

        let mut findings = Vec::new();
        for account in &accounts {
            let target = FindingTarget {
                resource_id: &account.id,
                resource_name: &account.name,
                kind: ResourceKind::StorageAccount,
                subscription_id: &subscription.id,
                location: &account.location,
            };
            findings.extend(evaluate(RULES, account, &target));
        }
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(name: &str) -> StorageAccount {
        StorageAccount {
            id: format!(
                "/subscriptions/sub-1/resourceGroups/rg/providers/Microsoft.Storage/storageAccounts/{}",
                name
            ),
            name: name.to_string(),
            location: "westeurope".to_string(),
            allow_blob_public_access: false,
            https_traffic_only: true,
            blob_encryption_enabled: true,
            file_encryption_enabled: true,
            network_default_action: Some(NetworkDefaultAction::Deny),
        }
    }

    #[test]
    fn hardened_account_is_clean() {
        let target = FindingTarget {
            resource_id: "id",
            resource_name: "sa",
            kind: ResourceKind::StorageAccount,
            subscription_id: "sub-1",
            location: "westeurope",
        };
        assert!(evaluate(RULES, &account("sa1"), &target).is_empty());
    }

    #[test]
    fn public_blob_access_is_high_severity() {
        let mut account = account("sa1");
        account.allow_blob_public_access = true;
        let target = FindingTarget {
            resource_id: &account.id,
            resource_name: &account.name,
            kind: ResourceKind::StorageAccount,
            subscription_id: "sub-1",
            location: &account.location,
        };
        let findings = evaluate(RULES, &account, &target);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].title, "Public Blob Access Enabled");
    }

    #[test]
    fn each_violation_yields_its_own_finding() {
        let mut account = account("sa1");
        account.https_traffic_only = false;
        account.blob_encryption_enabled = false;
        account.network_default_action = Some(NetworkDefaultAction::Allow);
        let target = FindingTarget {
            resource_id: &account.id,
            resource_name: &account.name,
            kind: ResourceKind::StorageAccount,
            subscription_id: "sub-1",
            location: &account.location,
        };
        let findings = evaluate(RULES, &account, &target);
        assert_eq!(findings.len(), 3);
        assert!(findings.iter().all(|f| f.severity == Severity::Medium));
        assert_eq!(findings[0].resource_group, "rg");
    }
}

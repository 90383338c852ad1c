//! Shared test doubles and fixtures

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use cloudposture::application::orchestrator::ScanOrchestrator;
use cloudposture::domain::resources::{
    KeyVault, ManagedDisk, NetworkDefaultAction, RuleAccess, RuleDirection, SecurityGroup,
    SecurityRule, StorageAccount, Subscription, SubscriptionState, VirtualMachine, Workspace,
};
use cloudposture::domain::scan::{ProviderError, ResourceProvider};
use cloudposture::infrastructure::checkers::{
    ComputeChecker, KeyVaultChecker, NetworkChecker, StorageChecker, WorkspaceChecker,
};
use cloudposture::infrastructure::registry::CheckerRegistry;
use cloudposture::infrastructure::scan_store::InMemoryScanStore;

/// Configurable in-memory resource provider.
#[derive(Default)]
pub struct StaticResourceProvider {
    pub subscriptions: Vec<Subscription>,
    /// Subscriptions whose security-group fetch times out
    pub timeout_security_groups_for: HashSet<String>,
    /// Artificial latency per fetch
    pub fetch_delay: Option<Duration>,
}

impl StaticResourceProvider {
    pub fn with_subscriptions(subscriptions: Vec<Subscription>) -> Self {
        Self {
            subscriptions,
            ..Self::default()
        }
    }

    async fn pause(&self) {
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ResourceProvider for StaticResourceProvider {
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, ProviderError> {
        self.pause().await;
        Ok(self.subscriptions.clone())
    }

    async fn get_subscription(&self, id: &str) -> Result<Option<Subscription>, ProviderError> {
        self.pause().await;
        Ok(self.subscriptions.iter().find(|s| s.id == id).cloned())
    }

    async fn list_storage_accounts(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<StorageAccount>, ProviderError> {
        self.pause().await;
        Ok(vec![public_storage_account(subscription_id)])
    }

    async fn list_security_groups(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<SecurityGroup>, ProviderError> {
        self.pause().await;
        if self.timeout_security_groups_for.contains(subscription_id) {
            return Err(ProviderError::Timeout(format!(
                "networkSecurityGroups fetch for {} timed out",
                subscription_id
            )));
        }
        Ok(vec![ssh_open_group(subscription_id)])
    }

    async fn list_key_vaults(&self, subscription_id: &str) -> Result<Vec<KeyVault>, ProviderError> {
        self.pause().await;
        Ok(vec![vault_without_soft_delete(subscription_id)])
    }

    async fn list_virtual_machines(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<VirtualMachine>, ProviderError> {
        self.pause().await;
        Ok(vec![hardened_vm(subscription_id)])
    }

    async fn list_disks(&self, subscription_id: &str) -> Result<Vec<ManagedDisk>, ProviderError> {
        self.pause().await;
        Ok(vec![unencrypted_disk(subscription_id)])
    }

    async fn list_workspaces(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<Workspace>, ProviderError> {
        self.pause().await;
        Ok(vec![isolated_workspace(subscription_id)])
    }
}

pub fn enabled_subscription(id: &str, name: &str) -> Subscription {
    Subscription {
        id: id.to_string(),
        display_name: name.to_string(),
        tenant_id: "tenant-1".to_string(),
        state: SubscriptionState::Enabled,
    }
}

pub fn disabled_subscription(id: &str) -> Subscription {
    Subscription {
        id: id.to_string(),
        display_name: "Disabled".to_string(),
        tenant_id: "tenant-1".to_string(),
        state: SubscriptionState::Disabled,
    }
}

/// Storage account with public blob access: one high finding.
pub fn public_storage_account(subscription_id: &str) -> StorageAccount {
    StorageAccount {
        id: format!(
            "/subscriptions/{}/resourceGroups/rg/providers/Microsoft.Storage/storageAccounts/sa1",
            subscription_id
        ),
        name: "sa1".to_string(),
        location: "westeurope".to_string(),
        allow_blob_public_access: true,
        https_traffic_only: true,
        blob_encryption_enabled: true,
        file_encryption_enabled: true,
        network_default_action: Some(NetworkDefaultAction::Deny),
    }
}

/// NSG permitting inbound TCP 22 from the internet: one high finding.
pub fn ssh_open_group(subscription_id: &str) -> SecurityGroup {
    SecurityGroup {
        id: format!(
            "/subscriptions/{}/resourceGroups/rg/providers/Microsoft.Network/networkSecurityGroups/nsg1",
            subscription_id
        ),
        name: "nsg1".to_string(),
        location: "westeurope".to_string(),
        rules: vec![SecurityRule {
            name: "allow-ssh".to_string(),
            direction: RuleDirection::Inbound,
            access: RuleAccess::Allow,
            protocol: "Tcp".to_string(),
            source_address_prefix: Some("0.0.0.0/0".to_string()),
            source_port_range: Some("*".to_string()),
            destination_address_prefix: Some("*".to_string()),
            destination_port_range: Some("22".to_string()),
            priority: 100,
        }],
    }
}

/// Vault hardened except soft delete: one medium finding.
pub fn vault_without_soft_delete(subscription_id: &str) -> KeyVault {
    KeyVault {
        id: format!(
            "/subscriptions/{}/resourceGroups/rg/providers/Microsoft.KeyVault/vaults/kv1",
            subscription_id
        ),
        name: "kv1".to_string(),
        location: "westeurope".to_string(),
        network_default_action: Some(NetworkDefaultAction::Deny),
        network_bypass: None,
        soft_delete_enabled: false,
        purge_protection_enabled: true,
        rbac_authorization_enabled: true,
    }
}

/// Fully hardened VM: no findings.
pub fn hardened_vm(subscription_id: &str) -> VirtualMachine {
    VirtualMachine {
        id: format!(
            "/subscriptions/{}/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/vm1",
            subscription_id
        ),
        name: "vm1".to_string(),
        location: "westeurope".to_string(),
        vm_size: "Standard_D2s_v3".to_string(),
        os_type: "Linux".to_string(),
        os_disk_name: "vm1-osdisk".to_string(),
        os_disk_encrypted: true,
        has_public_ip: false,
        extension_ids: vec!["/ext/Microsoft.Azure.Monitor/agent".to_string()],
        identity_type: Some("SystemAssigned".to_string()),
    }
}

/// Unencrypted disk: one high finding.
pub fn unencrypted_disk(subscription_id: &str) -> ManagedDisk {
    ManagedDisk {
        id: format!(
            "/subscriptions/{}/resourceGroups/rg/providers/Microsoft.Compute/disks/d1",
            subscription_id
        ),
        name: "d1".to_string(),
        location: "westeurope".to_string(),
        size_gb: Some(128),
        sku: Some("Premium_LRS".to_string()),
        encrypted: false,
        network_access_policy: None,
    }
}

/// Fully isolated workspace: no findings.
pub fn isolated_workspace(subscription_id: &str) -> Workspace {
    Workspace {
        id: format!(
            "/subscriptions/{}/resourceGroups/rg/providers/Microsoft.Databricks/workspaces/dbw1",
            subscription_id
        ),
        name: "dbw1".to_string(),
        location: "westeurope".to_string(),
        public_network_access: false,
        secure_cluster_connectivity: true,
        customer_managed_keys: true,
        private_endpoint_count: 1,
        virtual_network_id: Some("/subscriptions/vnets/vnet1".to_string()),
    }
}

/// Registry with all five checkers registered.
pub fn full_registry() -> Arc<CheckerRegistry> {
    let mut registry = CheckerRegistry::new();
    registry.register(Arc::new(StorageChecker));
    registry.register(Arc::new(NetworkChecker));
    registry.register(Arc::new(KeyVaultChecker));
    registry.register(Arc::new(ComputeChecker));
    registry.register(Arc::new(WorkspaceChecker));
    Arc::new(registry)
}

/// Orchestrator wired against the given provider with all checkers.
pub fn orchestrator_with(provider: Arc<dyn ResourceProvider>) -> Arc<ScanOrchestrator> {
    Arc::new(ScanOrchestrator::new(
        Arc::new(InMemoryScanStore::new()),
        provider,
        full_registry(),
        4,
    ))
}

//! ARM wire formats
//!
//! Deserialization shapes for ARM list payloads, converted into the domain
//! snapshots the checkers consume. Fields Azure omits default to the
//! conservative reading used by the checkers.

use serde::Deserialize;

use crate::domain::resources::{
    KeyVault, ManagedDisk, NetworkDefaultAction, RuleAccess, RuleDirection, SecurityGroup,
    SecurityRule, StorageAccount, Subscription, SubscriptionState, VirtualMachine, Workspace,
};

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ArmList<T> {
    #[serde(default)]
    pub value: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmSubscription {
    pub subscription_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default = "default_state")]
    pub state: String,
}

fn default_state() -> String {
    "Enabled".to_string()
}

impl From<ArmSubscription> for Subscription {
    fn from(sub: ArmSubscription) -> Self {
        let state = match sub.state.as_str() {
            "Enabled" => SubscriptionState::Enabled,
            "Disabled" => SubscriptionState::Disabled,
            _ => SubscriptionState::Other,
        };
        Subscription {
            id: sub.subscription_id,
            display_name: sub.display_name,
            tenant_id: sub.tenant_id,
            state,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ArmStorageAccount {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub properties: ArmStorageProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmStorageProperties {
    #[serde(default)]
    pub allow_blob_public_access: bool,
    #[serde(default = "default_true", rename = "supportsHttpsTrafficOnly")]
    pub https_traffic_only: bool,
    #[serde(default)]
    pub encryption: ArmStorageEncryption,
    #[serde(default, rename = "networkAcls")]
    pub network_acls: Option<ArmNetworkAcls>,
}

impl Default for ArmStorageProperties {
    fn default() -> Self {
        Self {
            allow_blob_public_access: false,
            https_traffic_only: true,
            encryption: ArmStorageEncryption::default(),
            network_acls: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ArmStorageEncryption {
    #[serde(default)]
    pub services: ArmEncryptionServices,
}

#[derive(Debug, Default, Deserialize)]
pub struct ArmEncryptionServices {
    #[serde(default)]
    pub blob: ArmEncryptionService,
    #[serde(default)]
    pub file: ArmEncryptionService,
}

#[derive(Debug, Deserialize)]
pub struct ArmEncryptionService {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ArmEncryptionService {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmNetworkAcls {
    #[serde(default)]
    pub default_action: Option<String>,
    #[serde(default)]
    pub bypass: Option<String>,
}

fn default_true() -> bool {
    true
}

fn parse_default_action(action: Option<&str>) -> Option<NetworkDefaultAction> {
    match action {
        Some("Allow") => Some(NetworkDefaultAction::Allow),
        Some("Deny") => Some(NetworkDefaultAction::Deny),
        _ => None,
    }
}

impl From<ArmStorageAccount> for StorageAccount {
    fn from(account: ArmStorageAccount) -> Self {
        let network_default_action = account
            .properties
            .network_acls
            .as_ref()
            .and_then(|acls| parse_default_action(acls.default_action.as_deref()));
        StorageAccount {
            id: account.id,
            name: account.name,
            location: account.location,
            allow_blob_public_access: account.properties.allow_blob_public_access,
            https_traffic_only: account.properties.https_traffic_only,
            blob_encryption_enabled: account.properties.encryption.services.blob.enabled,
            file_encryption_enabled: account.properties.encryption.services.file.enabled,
            network_default_action,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ArmSecurityGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub properties: ArmSecurityGroupProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmSecurityGroupProperties {
    #[serde(default)]
    pub security_rules: Vec<ArmSecurityRule>,
}

#[derive(Debug, Deserialize)]
pub struct ArmSecurityRule {
    pub name: String,
    #[serde(default)]
    pub properties: ArmSecurityRuleProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmSecurityRuleProperties {
    #[serde(default)]
    pub direction: String,
    #[serde(default)]
    pub access: String,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub source_address_prefix: Option<String>,
    #[serde(default)]
    pub source_port_range: Option<String>,
    #[serde(default)]
    pub destination_address_prefix: Option<String>,
    #[serde(default)]
    pub destination_port_range: Option<String>,
    #[serde(default)]
    pub priority: i32,
}

impl From<ArmSecurityGroup> for SecurityGroup {
    fn from(group: ArmSecurityGroup) -> Self {
        let rules = group
            .properties
            .security_rules
            .into_iter()
            .map(|rule| SecurityRule {
                name: rule.name,
                direction: if rule.properties.direction == "Outbound" {
                    RuleDirection::Outbound
                } else {
                    RuleDirection::Inbound
                },
                access: if rule.properties.access == "Deny" {
                    RuleAccess::Deny
                } else {
                    RuleAccess::Allow
                },
                protocol: rule.properties.protocol,
                source_address_prefix: rule.properties.source_address_prefix,
                source_port_range: rule.properties.source_port_range,
                destination_address_prefix: rule.properties.destination_address_prefix,
                destination_port_range: rule.properties.destination_port_range,
                priority: rule.properties.priority,
            })
            .collect();
        SecurityGroup {
            id: group.id,
            name: group.name,
            location: group.location,
            rules,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ArmKeyVault {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub properties: ArmKeyVaultProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmKeyVaultProperties {
    #[serde(default)]
    pub network_acls: Option<ArmNetworkAcls>,
    #[serde(default)]
    pub enable_soft_delete: bool,
    #[serde(default)]
    pub enable_purge_protection: bool,
    #[serde(default)]
    pub enable_rbac_authorization: bool,
}

impl From<ArmKeyVault> for KeyVault {
    fn from(vault: ArmKeyVault) -> Self {
        let network_default_action = vault
            .properties
            .network_acls
            .as_ref()
            .and_then(|acls| parse_default_action(acls.default_action.as_deref()));
        let network_bypass = vault
            .properties
            .network_acls
            .as_ref()
            .and_then(|acls| acls.bypass.clone());
        KeyVault {
            id: vault.id,
            name: vault.name,
            location: vault.location,
            network_default_action,
            network_bypass,
            soft_delete_enabled: vault.properties.enable_soft_delete,
            purge_protection_enabled: vault.properties.enable_purge_protection,
            rbac_authorization_enabled: vault.properties.enable_rbac_authorization,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ArmVirtualMachine {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub identity: Option<ArmIdentity>,
    #[serde(default)]
    pub resources: Vec<ArmSubResource>,
    #[serde(default)]
    pub properties: ArmVmProperties,
}

#[derive(Debug, Deserialize)]
pub struct ArmIdentity {
    #[serde(default, rename = "type")]
    pub identity_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ArmSubResource {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmVmProperties {
    #[serde(default)]
    pub hardware_profile: ArmHardwareProfile,
    #[serde(default)]
    pub storage_profile: ArmStorageProfile,
    #[serde(default)]
    pub network_profile: ArmNetworkProfile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmHardwareProfile {
    #[serde(default)]
    pub vm_size: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmStorageProfile {
    #[serde(default)]
    pub os_disk: ArmOsDisk,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmOsDisk {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub os_type: Option<String>,
    #[serde(default)]
    pub encryption_settings: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmNetworkProfile {
    #[serde(default)]
    pub network_interfaces: Vec<ArmSubResource>,
}

impl From<ArmVirtualMachine> for VirtualMachine {
    fn from(vm: ArmVirtualMachine) -> Self {
        VirtualMachine {
            id: vm.id,
            name: vm.name,
            location: vm.location,
            vm_size: vm.properties.hardware_profile.vm_size,
            os_type: vm
                .properties
                .storage_profile
                .os_disk
                .os_type
                .unwrap_or_else(|| "Unknown".to_string()),
            os_disk_name: vm.properties.storage_profile.os_disk.name,
            os_disk_encrypted: vm
                .properties
                .storage_profile
                .os_disk
                .encryption_settings
                .is_some(),
            has_public_ip: !vm.properties.network_profile.network_interfaces.is_empty(),
            extension_ids: vm.resources.into_iter().map(|r| r.id).collect(),
            identity_type: vm.identity.and_then(|i| i.identity_type),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ArmDisk {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub sku: Option<ArmDiskSku>,
    #[serde(default)]
    pub properties: ArmDiskProperties,
}

#[derive(Debug, Deserialize)]
pub struct ArmDiskSku {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmDiskProperties {
    #[serde(default, rename = "diskSizeGB")]
    pub disk_size_gb: Option<i64>,
    #[serde(default)]
    pub encryption: Option<serde_json::Value>,
    #[serde(default)]
    pub encryption_settings_collection: Option<serde_json::Value>,
    #[serde(default)]
    pub network_access_policy: Option<String>,
}

impl From<ArmDisk> for ManagedDisk {
    fn from(disk: ArmDisk) -> Self {
        let encrypted = disk.properties.encryption.is_some()
            || disk.properties.encryption_settings_collection.is_some();
        ManagedDisk {
            id: disk.id,
            name: disk.name,
            location: disk.location,
            size_gb: disk.properties.disk_size_gb,
            sku: disk.sku.map(|sku| sku.name),
            encrypted,
            network_access_policy: disk.properties.network_access_policy,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ArmWorkspace {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub properties: ArmWorkspaceProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmWorkspaceProperties {
    #[serde(default)]
    pub public_network_access: Option<String>,
    #[serde(default)]
    pub parameters: ArmWorkspaceParameters,
    #[serde(default)]
    pub private_endpoint_connections: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmWorkspaceParameters {
    #[serde(default)]
    pub enable_no_public_ip: Option<ArmParameterValue<bool>>,
    #[serde(default)]
    pub prepare_encryption: Option<ArmParameterValue<bool>>,
    #[serde(default)]
    pub custom_virtual_network_id: Option<ArmParameterValue<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ArmParameterValue<T> {
    pub value: T,
}

impl From<ArmWorkspace> for Workspace {
    fn from(workspace: ArmWorkspace) -> Self {
        // Public access defaults to enabled unless explicitly disabled
        let public_network_access = workspace
            .properties
            .public_network_access
            .as_deref()
            .map(|access| access == "Enabled")
            .unwrap_or(true);
        Workspace {
            id: workspace.id,
            name: workspace.name,
            location: workspace.location,
            public_network_access,
            secure_cluster_connectivity: workspace
                .properties
                .parameters
                .enable_no_public_ip
                .map(|p| p.value)
                .unwrap_or(false),
            customer_managed_keys: workspace
                .properties
                .parameters
                .prepare_encryption
                .map(|p| p.value)
                .unwrap_or(false),
            private_endpoint_count: workspace.properties.private_endpoint_connections.len(),
            virtual_network_id: workspace
                .properties
                .parameters
                .custom_virtual_network_id
                .map(|p| p.value),
        }
    }
}

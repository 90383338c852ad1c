//! Immutable snapshots of Azure resource configuration
//!
//! These are fetched per scan by the resource provider and only describe the
//! configuration surface the checkers evaluate.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An Azure subscription visible to the configured credential.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Subscription {
    pub id: String,
    pub display_name: String,
    pub tenant_id: String,
    pub state: SubscriptionState,
}

/// Subscription lifecycle state as reported by ARM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum SubscriptionState {
    Enabled,
    Disabled,
    #[serde(other)]
    Other,
}

impl Subscription {
    pub fn is_enabled(&self) -> bool {
        self.state == SubscriptionState::Enabled
    }
}

/// Default action of a network rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkDefaultAction {
    Allow,
    Deny,
}

/// A storage account's security-relevant configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageAccount {
    pub id: String,
    pub name: String,
    pub location: String,
    pub allow_blob_public_access: bool,
    pub https_traffic_only: bool,
    pub blob_encryption_enabled: bool,
    pub file_encryption_enabled: bool,
    pub network_default_action: Option<NetworkDefaultAction>,
}

/// A network security group with its rule set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityGroup {
    pub id: String,
    pub name: String,
    pub location: String,
    pub rules: Vec<SecurityRule>,
}

/// Direction of traffic a security rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleDirection {
    Inbound,
    Outbound,
}

/// Whether a security rule permits or denies matching traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleAccess {
    Allow,
    Deny,
}

/// A single NSG security rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityRule {
    pub name: String,
    pub direction: RuleDirection,
    pub access: RuleAccess,
    pub protocol: String,
    pub source_address_prefix: Option<String>,
    pub source_port_range: Option<String>,
    pub destination_address_prefix: Option<String>,
    pub destination_port_range: Option<String>,
    pub priority: i32,
}

/// A key vault's security-relevant configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyVault {
    pub id: String,
    pub name: String,
    pub location: String,
    /// Absent network ACLs mean unrestricted public access
    pub network_default_action: Option<NetworkDefaultAction>,
    pub network_bypass: Option<String>,
    pub soft_delete_enabled: bool,
    pub purge_protection_enabled: bool,
    pub rbac_authorization_enabled: bool,
}

/// A virtual machine's security-relevant configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualMachine {
    pub id: String,
    pub name: String,
    pub location: String,
    pub vm_size: String,
    pub os_type: String,
    pub os_disk_name: String,
    pub os_disk_encrypted: bool,
    pub has_public_ip: bool,
    pub extension_ids: Vec<String>,
    pub identity_type: Option<String>,
}

/// A managed disk's security-relevant configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagedDisk {
    pub id: String,
    pub name: String,
    pub location: String,
    pub size_gb: Option<i64>,
    pub sku: Option<String>,
    pub encrypted: bool,
    pub network_access_policy: Option<String>,
}

/// A Databricks workspace's security-relevant configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub location: String,
    pub public_network_access: bool,
    pub secure_cluster_connectivity: bool,
    pub customer_managed_keys: bool,
    pub private_endpoint_count: usize,
    pub virtual_network_id: Option<String>,
}

/// Extract the resource group segment from a full ARM resource id.
///
/// Ids follow `/subscriptions/{sub}/resourceGroups/{rg}/providers/...`.
pub fn resource_group_of(resource_id: &str) -> String {
    resource_id
        .split('/')
        .nth(4)
        .unwrap_or_default()
        .to_string()
}

//! Checker and resource-fetch contracts
//!
//! `ResourceProvider` is the capability handed to checkers for read-only
//! resource enumeration; `ResourceChecker` is the interface every
//! per-resource-type checker implements. The orchestrator treats both as
//! opaque.

use async_trait::async_trait;

use crate::domain::resources::{
    KeyVault, ManagedDisk, SecurityGroup, StorageAccount, Subscription, VirtualMachine, Workspace,
};

use super::entities::Finding;
use super::value_objects::ResourceKind;

/// Errors surfaced by the resource fetch capability.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    #[error("Resource fetch timed out: {0}")]
    Timeout(String),

    #[error("Resource fetch failed: {0}")]
    Request(String),

    #[error("Failed to decode resource payload: {0}")]
    Decode(String),
}

/// Read-only access to Azure resource configuration.
///
/// Credential acquisition, pagination, and throttling live behind this
/// trait; per-call timeouts are the implementation's responsibility.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, ProviderError>;

    async fn get_subscription(&self, id: &str) -> Result<Option<Subscription>, ProviderError>;

    async fn list_storage_accounts(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<StorageAccount>, ProviderError>;

    async fn list_security_groups(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<SecurityGroup>, ProviderError>;

    async fn list_key_vaults(&self, subscription_id: &str) -> Result<Vec<KeyVault>, ProviderError>;

    async fn list_virtual_machines(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<VirtualMachine>, ProviderError>;

    async fn list_disks(&self, subscription_id: &str) -> Result<Vec<ManagedDisk>, ProviderError>;

    async fn list_workspaces(&self, subscription_id: &str)
        -> Result<Vec<Workspace>, ProviderError>;
}

/// Errors from a single checker invocation.
///
/// These are recoverable by design: the orchestrator records them as
/// per-invocation annotations and the scan continues.
#[derive(Debug, thiserror::Error)]
pub enum CheckerError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Checker aborted: {0}")]
    Aborted(String),
}

/// A unit that inspects one resource category and emits findings.
///
/// Checkers are stateless and side-effect-free beyond consuming the fetch
/// capability; they never call other checkers and never mutate shared state.
#[async_trait]
pub trait ResourceChecker: std::fmt::Debug + Send + Sync {
    /// The resource category this checker covers
    fn kind(&self) -> ResourceKind;

    /// Inspect one subscription and return zero or more findings
    async fn check(
        &self,
        subscription: &Subscription,
        provider: &dyn ResourceProvider,
    ) -> Result<Vec<Finding>, CheckerError>;
}

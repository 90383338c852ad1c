//! Azure Resource Manager client
//!
//! Thin REST client implementing the `ResourceProvider` capability against
//! ARM list endpoints. Credential acquisition happens outside this service;
//! the client only carries a bearer token. Per-call timeouts are enforced by
//! the underlying HTTP client and surface as `ProviderError::Timeout`, which
//! the orchestrator treats as a per-invocation failure.

mod wire;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::AzureConfig;
use crate::domain::resources::{
    KeyVault, ManagedDisk, SecurityGroup, StorageAccount, Subscription, VirtualMachine, Workspace,
};
use crate::domain::scan::{ProviderError, ResourceProvider};

use wire::ArmList;

const SUBSCRIPTIONS_API_VERSION: &str = "2022-12-01";
const STORAGE_API_VERSION: &str = "2023-01-01";
const NETWORK_API_VERSION: &str = "2023-04-01";
const KEYVAULT_API_VERSION: &str = "2023-02-01";
const COMPUTE_API_VERSION: &str = "2023-03-01";
const DATABRICKS_API_VERSION: &str = "2023-02-01";

/// Errors constructing the ARM client.
#[derive(Debug, thiserror::Error)]
pub enum AzureClientError {
    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// ARM-backed implementation of the resource fetch capability.
pub struct ArmResourceClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: String,
}

impl ArmResourceClient {
    pub fn new(config: &AzureConfig) -> Result<Self, AzureClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            endpoint: config.management_endpoint.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        api_version: &str,
    ) -> Result<T, ProviderError> {
        let url = format!("{}{}?api-version={}", self.endpoint, path, api_version);
        debug!(url = %url, "ARM request");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ProviderError::Timeout(format!("{} timed out", path))
                } else {
                    ProviderError::Request(err.to_string())
                }
            })?;

        match response.status() {
            status if status.is_success() => response
                .json::<T>()
                .await
                .map_err(|err| ProviderError::Decode(err.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ProviderError::Unauthorized(
                format!("ARM rejected credentials for {}", path),
            )),
            status => Err(ProviderError::Request(format!(
                "ARM request for {} failed with {}",
                path, status
            ))),
        }
    }

    async fn list_resources<W, D>(
        &self,
        subscription_id: &str,
        provider_path: &str,
        api_version: &str,
    ) -> Result<Vec<D>, ProviderError>
    where
        W: DeserializeOwned + Into<D>,
    {
        let path = format!(
            "/subscriptions/{}/providers/{}",
            subscription_id, provider_path
        );
        let list: ArmList<W> = self.get_json(&path, api_version).await?;
        Ok(list.value.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl ResourceProvider for ArmResourceClient {
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, ProviderError> {
        let list: ArmList<wire::ArmSubscription> = self
            .get_json("/subscriptions", SUBSCRIPTIONS_API_VERSION)
            .await?;
        Ok(list.value.into_iter().map(Into::into).collect())
    }

    async fn get_subscription(&self, id: &str) -> Result<Option<Subscription>, ProviderError> {
        let path = format!("/subscriptions/{}", id);
        match self
            .get_json::<wire::ArmSubscription>(&path, SUBSCRIPTIONS_API_VERSION)
            .await
        {
            Ok(subscription) => Ok(Some(subscription.into())),
            Err(ProviderError::Request(message)) if message.contains("404") => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn list_storage_accounts(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<StorageAccount>, ProviderError> {
        self.list_resources::<wire::ArmStorageAccount, _>(
            subscription_id,
            "Microsoft.Storage/storageAccounts",
            STORAGE_API_VERSION,
        )
        .await
    }

    async fn list_security_groups(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<SecurityGroup>, ProviderError> {
        self.list_resources::<wire::ArmSecurityGroup, _>(
            subscription_id,
            "Microsoft.Network/networkSecurityGroups",
            NETWORK_API_VERSION,
        )
        .await
    }

    async fn list_key_vaults(&self, subscription_id: &str) -> Result<Vec<KeyVault>, ProviderError> {
        self.list_resources::<wire::ArmKeyVault, _>(
            subscription_id,
            "Microsoft.KeyVault/vaults",
            KEYVAULT_API_VERSION,
        )
        .await
    }

    async fn list_virtual_machines(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<VirtualMachine>, ProviderError> {
        self.list_resources::<wire::ArmVirtualMachine, _>(
            subscription_id,
            "Microsoft.Compute/virtualMachines",
            COMPUTE_API_VERSION,
        )
        .await
    }

    async fn list_disks(&self, subscription_id: &str) -> Result<Vec<ManagedDisk>, ProviderError> {
        self.list_resources::<wire::ArmDisk, _>(
            subscription_id,
            "Microsoft.Compute/disks",
            COMPUTE_API_VERSION,
        )
        .await
    }

    async fn list_workspaces(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<Workspace>, ProviderError> {
        self.list_resources::<wire::ArmWorkspace, _>(
            subscription_id,
            "Microsoft.Databricks/workspaces",
            DATABRICKS_API_VERSION,
        )
        .await
    }
}

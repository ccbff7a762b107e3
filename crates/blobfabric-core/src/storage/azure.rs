//! Azure Blob Storage through object_store.

use object_store::azure::MicrosoftAzureBuilder;
use std::sync::Arc;
use tracing::{debug, info};

use super::ObjectStoreBackend;
use crate::error::StorageError;
use crate::Result;

/// Azure Blob Storage backend configuration
#[derive(Debug, Clone, Default)]
pub struct AzureConfig {
    /// Azure storage account name
    pub account_name: String,
    /// Azure blob container name
    pub container_name: String,
    /// Storage account key
    pub account_key: Option<String>,
    /// SAS token, with or without the leading `?`
    pub sas_token: Option<String>,
    /// Azure AD application for service principal authentication
    pub client_id: Option<String>,
    pub tenant_id: Option<String>,
    pub client_secret: Option<String>,
    /// Custom endpoint URL (sovereign clouds, Azurite)
    pub endpoint: Option<String>,
    /// Key prefix for all operations
    pub prefix: Option<String>,
}

/// Split a SAS query string into key/value pairs.
fn sas_pairs(sas_token: &str) -> Vec<(String, String)> {
    sas_token
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl ObjectStoreBackend {
    /// Create an Azure Blob Storage backend
    ///
    /// Credentials are taken in this order: SAS token, account key, service
    /// principal, then the ambient credential chain of the environment.
    pub fn azure(config: AzureConfig) -> Result<Self> {
        let mut builder = MicrosoftAzureBuilder::new()
            .with_account(&config.account_name)
            .with_container_name(&config.container_name);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.with_endpoint(endpoint.clone());
        }

        if let Some(sas_token) = &config.sas_token {
            builder = builder.with_sas_authorization(sas_pairs(sas_token));
            debug!("Azure authentication: SAS token");
        } else if let Some(key) = &config.account_key {
            builder = builder.with_access_key(key);
            debug!("Azure authentication: Account key");
        } else if let (Some(client_id), Some(tenant_id), Some(secret)) =
            (&config.client_id, &config.tenant_id, &config.client_secret)
        {
            builder = builder
                .with_client_id(client_id)
                .with_tenant_id(tenant_id)
                .with_client_secret(secret);
            debug!("Azure authentication: Service principal");
        } else {
            debug!("Azure authentication: environment credential chain");
        }

        let store = builder.build().map_err(|e| {
            StorageError::Backend(format!("Failed to create Azure client: {}", e))
        })?;

        info!(
            "Created Azure client for account: {}, container: {}",
            config.account_name, config.container_name
        );

        Ok(Self::new(Arc::new(store), "Azure", config.prefix))
    }
}

//! Storage configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::{AzureConfig, GcsConfig, S3Config};

/// Storage backend configuration, selected by the `backend` tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend")]
pub enum StorageBackendConfig {
    /// AWS S3 or S3-compatible storage (MinIO, Ceph RGW, etc.)
    #[serde(rename = "s3")]
    S3 {
        /// S3 bucket name
        bucket: String,
        /// AWS region (e.g., "us-east-1")
        #[serde(default)]
        region: Option<String>,
        /// Custom endpoint URL (for S3-compatible services like MinIO)
        #[serde(default)]
        endpoint: Option<String>,
        /// Access key ID (falls back to AWS_ACCESS_KEY_ID env var)
        #[serde(default)]
        access_key: Option<String>,
        /// Secret access key (falls back to AWS_SECRET_ACCESS_KEY env var)
        #[serde(default)]
        secret_key: Option<String>,
        /// Key prefix for all operations
        #[serde(default)]
        prefix: Option<String>,
        /// Allow HTTP (insecure) connections
        #[serde(default)]
        allow_http: bool,
    },

    /// Azure Blob Storage
    #[serde(rename = "azure")]
    Azure {
        account_name: String,
        container_name: String,
        #[serde(default)]
        account_key: Option<String>,
        #[serde(default)]
        sas_token: Option<String>,
        #[serde(default)]
        client_id: Option<String>,
        #[serde(default)]
        tenant_id: Option<String>,
        #[serde(default)]
        client_secret: Option<String>,
        #[serde(default)]
        endpoint: Option<String>,
        #[serde(default)]
        prefix: Option<String>,
    },

    /// Google Cloud Storage
    #[serde(rename = "gcs")]
    Gcs {
        bucket: String,
        /// Path to service account JSON key file (if None, uses Application Default Credentials)
        #[serde(default)]
        service_account_path: Option<String>,
        #[serde(default)]
        prefix: Option<String>,
    },

    /// Local filesystem storage
    #[serde(rename = "filesystem")]
    Filesystem {
        /// Root directory, created when missing
        path: PathBuf,
    },

    /// In-memory storage (for testing)
    #[serde(rename = "memory")]
    Memory,
}

impl StorageBackendConfig {
    /// Backend tag as written in configuration files
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::Azure { .. } => "azure",
            Self::Gcs { .. } => "gcs",
            Self::Filesystem { .. } => "filesystem",
            Self::Memory => "memory",
        }
    }

    /// Get the key prefix for this storage configuration
    pub fn prefix(&self) -> Option<&str> {
        match self {
            Self::S3 { prefix, .. } => prefix.as_deref(),
            Self::Azure { prefix, .. } => prefix.as_deref(),
            Self::Gcs { prefix, .. } => prefix.as_deref(),
            Self::Filesystem { .. } | Self::Memory => None,
        }
    }

    pub(crate) fn s3_config(&self) -> Option<S3Config> {
        match self {
            Self::S3 {
                bucket,
                region,
                endpoint,
                access_key,
                secret_key,
                prefix,
                allow_http,
            } => Some(S3Config {
                bucket: bucket.clone(),
                region: region.clone(),
                endpoint: endpoint.clone(),
                access_key_id: access_key.clone(),
                secret_access_key: secret_key.clone(),
                prefix: prefix.clone(),
                allow_http: *allow_http,
            }),
            _ => None,
        }
    }

    pub(crate) fn azure_config(&self) -> Option<AzureConfig> {
        match self {
            Self::Azure {
                account_name,
                container_name,
                account_key,
                sas_token,
                client_id,
                tenant_id,
                client_secret,
                endpoint,
                prefix,
            } => Some(AzureConfig {
                account_name: account_name.clone(),
                container_name: container_name.clone(),
                account_key: account_key.clone(),
                sas_token: sas_token.clone(),
                client_id: client_id.clone(),
                tenant_id: tenant_id.clone(),
                client_secret: client_secret.clone(),
                endpoint: endpoint.clone(),
                prefix: prefix.clone(),
            }),
            _ => None,
        }
    }

    pub(crate) fn gcs_config(&self) -> Option<GcsConfig> {
        match self {
            Self::Gcs {
                bucket,
                service_account_path,
                prefix,
            } => Some(GcsConfig {
                bucket: bucket.clone(),
                service_account_path: service_account_path.clone(),
                prefix: prefix.clone(),
            }),
            _ => None,
        }
    }
}

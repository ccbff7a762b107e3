//! Google Cloud Storage through object_store.

use object_store::gcp::GoogleCloudStorageBuilder;
use std::sync::Arc;
use tracing::info;

use super::ObjectStoreBackend;
use crate::error::StorageError;
use crate::Result;

/// Google Cloud Storage backend configuration
#[derive(Debug, Clone)]
pub struct GcsConfig {
    /// GCS bucket name
    pub bucket: String,
    /// Path to service account JSON key file (if None, uses Application Default Credentials)
    pub service_account_path: Option<String>,
    /// Key prefix for all operations
    pub prefix: Option<String>,
}

impl ObjectStoreBackend {
    /// Create a Google Cloud Storage backend
    ///
    /// Without `service_account_path` the client falls back to Application
    /// Default Credentials:
    /// 1. GOOGLE_APPLICATION_CREDENTIALS environment variable
    /// 2. Google Cloud SDK default credentials
    /// 3. Compute Engine/GKE metadata service
    pub fn gcs(config: GcsConfig) -> Result<Self> {
        let mut builder = GoogleCloudStorageBuilder::new().with_bucket_name(&config.bucket);

        if let Some(path) = &config.service_account_path {
            builder = builder.with_service_account_path(path);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::Backend(format!("Failed to create GCS client: {}", e)))?;

        info!("Created GCS client for bucket: {}", config.bucket);

        Ok(Self::new(Arc::new(store), "GCS", config.prefix))
    }
}

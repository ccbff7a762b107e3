//! Blob storage abstraction and implementations.
//!
//! Provider access goes through `object_store`, which covers:
//!
//! - **S3**: AWS S3 and S3-compatible services (MinIO, Ceph RGW, etc.)
//! - **Azure**: Azure Blob Storage
//! - **GCS**: Google Cloud Storage
//! - **Filesystem**: Local filesystem storage
//! - **Memory**: In-memory storage (for testing)
//!
//! Each is exposed as [`BlobPrimitives`] by [`ObjectStoreBackend`] and lifted
//! into the full [`BlobStorage`] surface by [`GenericBlobStorage`].

mod azure;
mod backend;
mod config;
mod ext;
mod gcs;
mod generic;
mod object_backend;
mod s3;

pub use azure::AzureConfig;
pub use backend::{BlobPrimitives, BlobReader, BlobStorage, ListPage};
pub use config::StorageBackendConfig;
pub use ext::BlobStorageExt;
pub use gcs::GcsConfig;
pub use generic::GenericBlobStorage;
pub use object_backend::{
    ObjectStoreBackend, CONTENT_TYPE_PROPERTY, ETAG_PROPERTY, VERSION_PROPERTY,
};
pub use s3::S3Config;

use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::sinks::SinkedBlobStorage;
use crate::{Error, Result};

/// Build the provider adapter selected by `config`.
pub fn create_backend(config: &StorageBackendConfig) -> Result<ObjectStoreBackend> {
    info!(
        "Creating {} storage backend, key prefix: {}",
        config.backend_name(),
        config.prefix().unwrap_or("<none>")
    );
    match config {
        StorageBackendConfig::S3 { .. } => config
            .s3_config()
            .ok_or_else(|| Error::Config("S3 settings missing".to_string()))
            .and_then(ObjectStoreBackend::s3),
        StorageBackendConfig::Azure { .. } => config
            .azure_config()
            .ok_or_else(|| Error::Config("Azure settings missing".to_string()))
            .and_then(ObjectStoreBackend::azure),
        StorageBackendConfig::Gcs { .. } => config
            .gcs_config()
            .ok_or_else(|| Error::Config("GCS settings missing".to_string()))
            .and_then(ObjectStoreBackend::gcs),
        StorageBackendConfig::Filesystem { path } => ObjectStoreBackend::filesystem(path),
        StorageBackendConfig::Memory => Ok(ObjectStoreBackend::memory()),
    }
}

/// Build blob storage from configuration.
///
/// The provider is wrapped in [`GenericBlobStorage`] and, when sinks are
/// configured, in a [`SinkedBlobStorage`] applying them in order.
pub fn create_storage(config: &Config) -> Result<Arc<dyn BlobStorage>> {
    let storage: Arc<dyn BlobStorage> =
        Arc::new(GenericBlobStorage::new(create_backend(&config.storage)?));

    let sinks = config.build_sinks()?;
    if sinks.is_empty() {
        return Ok(storage);
    }

    info!(
        "Applying sink chain: {}",
        sinks.iter().map(|s| s.name()).collect::<Vec<_>>().join(" -> ")
    );
    Ok(Arc::new(SinkedBlobStorage::new(storage, sinks)))
}

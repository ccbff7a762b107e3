//! Blob storage decorator applying a sink chain to blob content.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

use super::{decode_stream, encode, TransformSink};
use crate::blob::Blob;
use crate::list_options::ListOptions;
use crate::storage::{BlobReader, BlobStorage};
use crate::{Error, Result};

/// Wraps a [`BlobStorage`] so content passes through `sinks` on the way in
/// and out. Listing, deletion and metadata pass straight through; reported
/// sizes are those of the stored (transformed) bytes.
pub struct SinkedBlobStorage {
    inner: Arc<dyn BlobStorage>,
    sinks: Vec<Arc<dyn TransformSink>>,
}

impl SinkedBlobStorage {
    pub fn new(inner: Arc<dyn BlobStorage>, sinks: Vec<Arc<dyn TransformSink>>) -> Self {
        Self { inner, sinks }
    }

    /// Get the wrapped storage
    pub fn inner(&self) -> &Arc<dyn BlobStorage> {
        &self.inner
    }

    pub fn sinks(&self) -> &[Arc<dyn TransformSink>] {
        &self.sinks
    }

    fn check_append(&self) -> Result<()> {
        match self.sinks.iter().find(|s| !s.supports_append()) {
            Some(sink) => Err(Error::Unsupported(format!(
                "append is not supported through the {} sink",
                sink.name()
            ))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BlobStorage for SinkedBlobStorage {
    async fn list(&self, options: &ListOptions) -> Result<Vec<Blob>> {
        self.inner.list(options).await
    }

    async fn open_read(&self, full_path: &str) -> Result<Option<BlobReader>> {
        match self.inner.open_read(full_path).await? {
            Some(raw) => decode_stream(&self.sinks, raw).map(Some),
            None => Ok(None),
        }
    }

    async fn write(&self, full_path: &str, data: Bytes, append: bool) -> Result<()> {
        if append {
            self.check_append()?;
        }

        let sinks = self.sinks.clone();
        let input_len = data.len();
        let encoded = tokio::task::spawn_blocking(move || encode(&sinks, &data))
            .await
            .map_err(|e| Error::Transform(format!("encode task failed: {}", e)))??;

        debug!(
            "Sink chain encoded {}: {} -> {} bytes",
            full_path,
            input_len,
            encoded.len()
        );
        self.inner
            .write(full_path, Bytes::from(encoded), append)
            .await
    }

    async fn delete(&self, full_paths: &[String]) -> Result<()> {
        self.inner.delete(full_paths).await
    }

    async fn exists(&self, full_paths: &[String]) -> Result<Vec<bool>> {
        self.inner.exists(full_paths).await
    }

    async fn get_blobs(&self, full_paths: &[String]) -> Result<Vec<Option<Blob>>> {
        self.inner.get_blobs(full_paths).await
    }
}

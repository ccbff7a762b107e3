//! Convenience operations layered over [`BlobStorage`].

use async_trait::async_trait;
use bytes::Bytes;
use std::io::Read;
use tracing::debug;

use super::BlobStorage;
use crate::blob::Blob;
use crate::{Error, Result};

/// Single-path helpers available on every [`BlobStorage`]
#[async_trait]
pub trait BlobStorageExt: BlobStorage {
    /// Read a whole blob into memory, `None` when it does not exist.
    async fn read_bytes(&self, full_path: &str) -> Result<Option<Bytes>> {
        let reader = match self.open_read(full_path).await? {
            Some(reader) => reader,
            None => return Ok(None),
        };

        // Sink readers decode on the fly, keep that off the async workers.
        let data = tokio::task::spawn_blocking(move || {
            let mut reader = reader;
            let mut data = Vec::new();
            reader.read_to_end(&mut data).map(|_| data)
        })
        .await
        .map_err(|e| Error::Transform(format!("read task failed: {}", e)))??;

        Ok(Some(Bytes::from(data)))
    }

    /// Read a blob as UTF-8 text.
    async fn read_text(&self, full_path: &str) -> Result<Option<String>> {
        match self.read_bytes(full_path).await? {
            Some(data) => String::from_utf8(data.to_vec())
                .map(Some)
                .map_err(|e| Error::Serialization(format!("{} is not UTF-8: {}", full_path, e))),
            None => Ok(None),
        }
    }

    /// Overwrite a blob with `data`.
    async fn write_bytes(&self, full_path: &str, data: Bytes) -> Result<()> {
        self.write(full_path, data, false).await
    }

    /// Overwrite a blob with UTF-8 text.
    async fn write_text(&self, full_path: &str, text: &str) -> Result<()> {
        self.write(full_path, Bytes::copy_from_slice(text.as_bytes()), false)
            .await
    }

    async fn exists_one(&self, full_path: &str) -> Result<bool> {
        let found = self.exists(&[full_path.to_string()]).await?;
        Ok(found.into_iter().next().unwrap_or(false))
    }

    async fn get_blob(&self, full_path: &str) -> Result<Option<Blob>> {
        let blobs = self.get_blobs(&[full_path.to_string()]).await?;
        Ok(blobs.into_iter().next().flatten())
    }

    async fn delete_one(&self, full_path: &str) -> Result<()> {
        self.delete(&[full_path.to_string()]).await
    }

    /// Copy one blob into `target`. Returns false when the source is missing.
    async fn copy_to(
        &self,
        full_path: &str,
        target: &dyn BlobStorage,
        target_path: &str,
    ) -> Result<bool> {
        debug!("COPY: {} -> {}", full_path, target_path);
        match self.read_bytes(full_path).await? {
            Some(data) => {
                target.write(target_path, data, false).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl<T: BlobStorage + ?Sized> BlobStorageExt for T {}

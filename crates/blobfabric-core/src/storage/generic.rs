//! Generic blob storage built from provider primitives.

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::try_join_all;
use tracing::debug;

use super::{BlobPrimitives, BlobReader, BlobStorage};
use crate::blob::Blob;
use crate::browser::DirectoryBrowser;
use crate::list_options::ListOptions;
use crate::{path, Result};

/// Full [`BlobStorage`] surface composed from a provider's [`BlobPrimitives`].
///
/// Multi-path operations fan out concurrently and fail as a whole on the
/// first error; no partial results are returned.
pub struct GenericBlobStorage<P> {
    primitives: P,
}

impl<P: BlobPrimitives> GenericBlobStorage<P> {
    pub fn new(primitives: P) -> Self {
        Self { primitives }
    }

    /// Get the wrapped provider.
    pub fn primitives(&self) -> &P {
        &self.primitives
    }

    fn validate_all(full_paths: &[String]) -> Result<Vec<String>> {
        full_paths
            .iter()
            .map(|p| path::validate_blob_path(p))
            .collect()
    }

    async fn delete_path(&self, full_path: &str) -> Result<()> {
        match self.primitives.delete_single(full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => self.delete_folder(full_path).await,
            Err(e) => Err(e),
        }
    }

    /// Nothing exists at `folder` as a single object: treat it as a folder
    /// and delete every file below it. An empty listing means the path was
    /// already gone, which counts as success.
    async fn delete_folder(&self, folder: &str) -> Result<()> {
        let options = ListOptions::new().folder(folder).recurse(true);
        let files: Vec<String> = DirectoryBrowser::new(&self.primitives, &options)
            .list()
            .await?
            .into_iter()
            .filter(|b| b.is_file())
            .map(|b| b.full_path())
            .collect();

        if files.is_empty() {
            debug!("Nothing to delete at {}", folder);
            return Ok(());
        }

        debug!("Deleting {} blobs under folder {}", files.len(), folder);
        try_join_all(files.iter().map(|file| async move {
            match self.primitives.delete_single(file).await {
                Err(e) if e.is_not_found() => Ok(()),
                other => other,
            }
        }))
        .await?;
        Ok(())
    }
}

#[async_trait]
impl<P: BlobPrimitives> BlobStorage for GenericBlobStorage<P> {
    async fn list(&self, options: &ListOptions) -> Result<Vec<Blob>> {
        options.validate()?;
        DirectoryBrowser::new(&self.primitives, options).list().await
    }

    async fn open_read(&self, full_path: &str) -> Result<Option<BlobReader>> {
        let full_path = path::validate_blob_path(full_path)?;
        self.primitives.open_read(&full_path).await
    }

    async fn write(&self, full_path: &str, data: Bytes, append: bool) -> Result<()> {
        let full_path = path::validate_blob_path(full_path)?;
        self.primitives.write(&full_path, data, append).await
    }

    async fn delete(&self, full_paths: &[String]) -> Result<()> {
        let full_paths = Self::validate_all(full_paths)?;
        try_join_all(full_paths.iter().map(|p| self.delete_path(p))).await?;
        Ok(())
    }

    async fn exists(&self, full_paths: &[String]) -> Result<Vec<bool>> {
        let full_paths = Self::validate_all(full_paths)?;
        try_join_all(full_paths.iter().map(|p| self.primitives.exists(p))).await
    }

    async fn get_blobs(&self, full_paths: &[String]) -> Result<Vec<Option<Blob>>> {
        let full_paths = Self::validate_all(full_paths)?;
        try_join_all(full_paths.iter().map(|p| self.primitives.get_blob(p))).await
    }
}

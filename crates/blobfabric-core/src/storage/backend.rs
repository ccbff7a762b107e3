//! Storage trait definitions.
//!
//! Two layers live here:
//!
//! - [`BlobPrimitives`]: the small set of single-item operations a provider
//!   adapter implements.
//! - [`BlobStorage`]: the full multi-path surface consumed by applications.
//!   [`GenericBlobStorage`](super::GenericBlobStorage) builds it from a
//!   `BlobPrimitives` implementation; decorators such as
//!   [`SinkedBlobStorage`](crate::sinks::SinkedBlobStorage) wrap it.

use async_trait::async_trait;
use bytes::Bytes;
use std::io::Read;

use crate::blob::Blob;
use crate::list_options::ListOptions;
use crate::Result;

/// Readable blob content
pub type BlobReader = Box<dyn Read + Send>;

/// One page of a single-level listing
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Blobs found on this page
    pub blobs: Vec<Blob>,
    /// Token for the next page, `None` on the last page
    pub continuation: Option<String>,
}

impl ListPage {
    /// A page with no successor.
    pub fn last(blobs: Vec<Blob>) -> Self {
        Self {
            blobs,
            continuation: None,
        }
    }
}

/// Single-item operations implemented by a provider adapter.
///
/// All paths handed to these methods are already normalized and validated.
#[async_trait]
pub trait BlobPrimitives: Send + Sync {
    /// List one page of the direct children of `folder_path`.
    ///
    /// Providers that list natively recursive must return `true` from
    /// [`lists_recursively`](Self::lists_recursively).
    async fn list_at(
        &self,
        folder_path: &str,
        options: &ListOptions,
        continuation: Option<&str>,
    ) -> Result<ListPage>;

    /// Fetch metadata for one blob, `None` when it does not exist.
    async fn get_blob(&self, full_path: &str) -> Result<Option<Blob>>;

    /// Delete one blob. Reports `StorageError::NotFound` when nothing exists
    /// at `full_path`.
    async fn delete_single(&self, full_path: &str) -> Result<()>;

    /// Check whether one blob exists.
    async fn exists(&self, full_path: &str) -> Result<bool>;

    /// Open a blob for reading, `None` when it does not exist.
    async fn open_read(&self, full_path: &str) -> Result<Option<BlobReader>>;

    /// Write a blob, replacing or appending to existing content.
    async fn write(&self, full_path: &str, data: Bytes, append: bool) -> Result<()>;

    /// True when `list_at` already returns every descendant.
    fn lists_recursively(&self) -> bool {
        false
    }
}

/// Blob storage surface used by applications
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// List blobs according to `options`.
    async fn list(&self, options: &ListOptions) -> Result<Vec<Blob>>;

    /// Open a blob for reading, `None` when it does not exist.
    async fn open_read(&self, full_path: &str) -> Result<Option<BlobReader>>;

    /// Write a blob. With `append`, data is added to existing content.
    async fn write(&self, full_path: &str, data: Bytes, append: bool) -> Result<()>;

    /// Delete blobs or folders. Missing paths are not an error.
    async fn delete(&self, full_paths: &[String]) -> Result<()>;

    /// Check existence of each path, in order.
    async fn exists(&self, full_paths: &[String]) -> Result<Vec<bool>>;

    /// Fetch metadata for each path, in order, `None` where missing.
    async fn get_blobs(&self, full_paths: &[String]) -> Result<Vec<Option<Blob>>>;
}

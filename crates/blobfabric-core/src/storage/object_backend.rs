//! Provider primitives over any `object_store` implementation.
//!
//! Object stores have no real folders: a folder is any key prefix followed
//! by `/`. Single-level listings use `list_with_delimiter`, whose common
//! prefixes become folder blobs.
//!
//! `object_store` percent-encodes characters it cannot store verbatim in a
//! path part (non-ASCII, `[`, `#`, `%` and friends). Listed locations are
//! decoded part by part so every listed path addresses its object again.

use async_trait::async_trait;
use bytes::Bytes;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::{Path, PathPart};
use object_store::{Attribute, Attributes, GetOptions, ObjectMeta, ObjectStore, PutPayload};
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, info};

use super::{BlobPrimitives, BlobReader, ListPage};
use crate::blob::Blob;
use crate::error::StorageError;
use crate::list_options::ListOptions;
use crate::{path, Error, Result};

/// Property key carrying the backend's entity tag
pub const ETAG_PROPERTY: &str = "etag";

/// Property key carrying the backend's object version
pub const VERSION_PROPERTY: &str = "version";

/// Property key carrying the stored content type
pub const CONTENT_TYPE_PROPERTY: &str = "content-type";

/// The entity tag is the content MD5 for single-part uploads on S3 and
/// Azure. Multipart tags (`<md5>-<parts>`) and opaque tags yield `None`.
fn md5_from_e_tag(e_tag: &str) -> Option<String> {
    let tag = e_tag.trim_matches('"');
    (tag.len() == 32 && tag.bytes().all(|b| b.is_ascii_hexdigit()))
        .then(|| tag.to_ascii_lowercase())
}

/// Blob primitives backed by an `object_store::ObjectStore`
pub struct ObjectStoreBackend {
    store: Arc<dyn ObjectStore>,
    /// Backend name used in log lines and error messages
    name: &'static str,
    /// Key prefix for all operations
    prefix: Option<String>,
}

impl ObjectStoreBackend {
    pub fn new(store: Arc<dyn ObjectStore>, name: &'static str, prefix: Option<String>) -> Self {
        let prefix = prefix
            .map(|p| p.trim_matches('/').to_string())
            .filter(|p| !p.is_empty());
        info!("Created {} backend, prefix: {:?}", name, prefix);
        Self {
            store,
            name,
            prefix,
        }
    }

    /// In-memory backend, mostly useful for tests.
    pub fn memory() -> Self {
        Self::new(Arc::new(InMemory::new()), "Memory", None)
    }

    /// Local filesystem backend rooted at `root`. The directory is created
    /// when missing.
    pub fn filesystem(root: &std::path::Path) -> Result<Self> {
        std::fs::create_dir_all(root).map_err(|e| {
            StorageError::Backend(format!(
                "Failed to create directory {}: {}",
                root.display(),
                e
            ))
        })?;
        let store = LocalFileSystem::new_with_prefix(root)
            .map_err(|e| Error::from_object_store("Filesystem INIT", e))?;
        Ok(Self::new(Arc::new(store), "Filesystem", None))
    }

    /// Backend name used in log lines.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Map a normalized blob path to an object location.
    fn location(&self, full_path: &str) -> Path {
        let key = full_path.trim_start_matches('/');
        match &self.prefix {
            Some(prefix) if key.is_empty() => Path::from(prefix.as_str()),
            Some(prefix) => Path::from(format!("{}/{}", prefix, key)),
            None => Path::from(key),
        }
    }

    /// Map an object location back to a normalized blob path.
    fn blob_path(&self, location: &Path) -> Result<String> {
        let parts: Vec<PathPart<'_>> = match &self.prefix {
            Some(prefix) => match location.prefix_match(&Path::from(prefix.as_str())) {
                Some(rest) => rest.collect(),
                None => location.parts().collect(),
            },
            None => location.parts().collect(),
        };

        let segments = parts
            .iter()
            .map(|part| {
                urlencoding::decode(part.as_ref()).map_err(|e| {
                    Error::from(StorageError::InvalidPath(format!("{}: {}", location, e)))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(path::combine(segments))
    }

    /// Listings only carry what the provider's list call returns: size,
    /// modification time, entity tag and version. User metadata needs a
    /// per-object request and is filled by [`get_blob`](BlobPrimitives::get_blob).
    fn to_blob(&self, meta: ObjectMeta, include_attributes: bool) -> Result<Blob> {
        let mut blob = Blob::file(&self.blob_path(&meta.location)?)
            .with_size(meta.size)
            .with_last_modified(meta.last_modified);
        if include_attributes {
            if let Some(e_tag) = meta.e_tag {
                blob.md5 = md5_from_e_tag(&e_tag);
                blob.properties.insert(ETAG_PROPERTY.to_string(), e_tag);
            }
            if let Some(version) = meta.version {
                blob.properties
                    .insert(VERSION_PROPERTY.to_string(), version);
            }
        }
        Ok(blob)
    }

    fn context(&self, operation: &str) -> String {
        format!("{} {}", self.name, operation)
    }

    async fn head(&self, full_path: &str) -> Result<Option<ObjectMeta>> {
        let location = self.location(full_path);
        debug!("{} HEAD: {}", self.name, location);
        match self.store.head(&location).await {
            Ok(meta) => Ok(Some(meta)),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(Error::from_object_store(&self.context("HEAD"), e)),
        }
    }

    /// Object metadata together with its stored attributes.
    async fn head_with_attributes(
        &self,
        full_path: &str,
    ) -> Result<Option<(ObjectMeta, Attributes)>> {
        let location = self.location(full_path);
        debug!("{} HEAD: {}", self.name, location);
        let options = GetOptions {
            head: true,
            ..Default::default()
        };
        match self.store.get_opts(&location, options).await {
            Ok(result) => Ok(Some((result.meta, result.attributes))),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(Error::from_object_store(&self.context("HEAD"), e)),
        }
    }

    async fn get(&self, full_path: &str) -> Result<Option<Bytes>> {
        let location = self.location(full_path);
        debug!("{} GET: {}", self.name, location);
        let result = match self.store.get(&location).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(Error::from_object_store(&self.context("GET"), e)),
        };
        let data = result
            .bytes()
            .await
            .map_err(|e| Error::from_object_store(&self.context("GET"), e))?;
        Ok(Some(data))
    }
}

#[async_trait]
impl BlobPrimitives for ObjectStoreBackend {
    async fn list_at(
        &self,
        folder_path: &str,
        options: &ListOptions,
        _continuation: Option<&str>,
    ) -> Result<ListPage> {
        options.validate()?;

        let prefix = if path::is_root(folder_path) && self.prefix.is_none() {
            None
        } else {
            Some(self.location(folder_path))
        };
        debug!("{} LIST: {:?}", self.name, prefix);

        let listing = self
            .store
            .list_with_delimiter(prefix.as_ref())
            .await
            .map_err(|e| Error::from_object_store(&self.context("LIST"), e))?;

        let mut blobs = Vec::with_capacity(listing.common_prefixes.len() + listing.objects.len());
        for folder in &listing.common_prefixes {
            blobs.push(Blob::folder(&self.blob_path(folder)?));
        }
        for meta in listing.objects {
            blobs.push(self.to_blob(meta, options.include_attributes)?);
        }

        Ok(ListPage::last(blobs))
    }

    async fn get_blob(&self, full_path: &str) -> Result<Option<Blob>> {
        let Some((meta, attributes)) = self.head_with_attributes(full_path).await? else {
            return Ok(None);
        };

        let mut blob = self.to_blob(meta, true)?;
        for (attribute, value) in attributes.iter() {
            match attribute {
                Attribute::Metadata(key) => {
                    blob.metadata
                        .insert(key.to_string(), value.as_ref().to_string());
                }
                Attribute::ContentType => {
                    blob.properties
                        .insert(CONTENT_TYPE_PROPERTY.to_string(), value.as_ref().to_string());
                }
                _ => {}
            }
        }
        Ok(Some(blob))
    }

    async fn delete_single(&self, full_path: &str) -> Result<()> {
        if self.head(full_path).await?.is_none() {
            return Err(StorageError::NotFound(full_path.to_string()).into());
        }

        let location = self.location(full_path);
        debug!("{} DELETE: {}", self.name, location);
        self.store
            .delete(&location)
            .await
            .map_err(|e| Error::from_object_store(&self.context("DELETE"), e))
    }

    async fn exists(&self, full_path: &str) -> Result<bool> {
        Ok(self.head(full_path).await?.is_some())
    }

    async fn open_read(&self, full_path: &str) -> Result<Option<BlobReader>> {
        Ok(self
            .get(full_path)
            .await?
            .map(|data| Box::new(Cursor::new(data)) as BlobReader))
    }

    async fn write(&self, full_path: &str, data: Bytes, append: bool) -> Result<()> {
        // Object stores cannot append in place: read, concatenate, rewrite.
        let data = if append {
            match self.get(full_path).await? {
                Some(existing) => {
                    let mut joined = Vec::with_capacity(existing.len() + data.len());
                    joined.extend_from_slice(&existing);
                    joined.extend_from_slice(&data);
                    Bytes::from(joined)
                }
                None => data,
            }
        } else {
            data
        };

        let location = self.location(full_path);
        debug!("{} PUT: {} ({} bytes)", self.name, location, data.len());
        self.store
            .put(&location, PutPayload::from_bytes(data))
            .await
            .map_err(|e| Error::from_object_store(&self.context("PUT"), e))?;
        Ok(())
    }
}

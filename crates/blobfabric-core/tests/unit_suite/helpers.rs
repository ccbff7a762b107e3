//! Test helper utilities.
//!
//! Provides test data generation and a scripted provider used across unit
//! tests.

use async_trait::async_trait;
use blobfabric_core::storage::{BlobPrimitives, BlobReader, ListPage};
use blobfabric_core::{
    Blob, BlobStorage, GenericBlobStorage, ListOptions, ObjectStoreBackend, Result, StorageError,
};
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Generate pseudo-random bytes (deterministic)
pub fn generate_random_bytes(size: usize) -> Vec<u8> {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut bytes = Vec::with_capacity(size);
    let mut hasher = DefaultHasher::new();

    for i in 0..size {
        i.hash(&mut hasher);
        bytes.push((hasher.finish() % 256) as u8);
    }

    bytes
}

/// Generate highly compressible bytes
pub fn generate_repetitive_bytes(size: usize) -> Vec<u8> {
    let pattern = b"ABCD";
    pattern.iter().cycle().take(size).cloned().collect()
}

/// Generic storage over an in-memory object store
pub fn memory_storage() -> Arc<dyn BlobStorage> {
    Arc::new(GenericBlobStorage::new(ObjectStoreBackend::memory()))
}

/// Sorted full paths of `blobs`
pub fn sorted_paths(blobs: &[Blob]) -> Vec<String> {
    let mut paths: Vec<String> = blobs.iter().map(|b| b.full_path()).collect();
    paths.sort();
    paths
}

/// Provider fake holding a flat set of files. Folders are derived from
/// file paths and listings are served `page_size` entries per page.
pub struct ScriptedProvider {
    files: Mutex<BTreeMap<String, Bytes>>,
    page_size: usize,
    /// Listing these folders reports permission denied
    pub denied: HashSet<String>,
    /// Any operation on these paths fails with a backend error
    pub failing: HashSet<String>,
    /// Number of `list_at` calls made
    pub list_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(page_size: usize) -> Self {
        Self {
            files: Mutex::new(BTreeMap::new()),
            page_size,
            denied: HashSet::new(),
            failing: HashSet::new(),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_files(page_size: usize, paths: &[&str]) -> Self {
        let provider = Self::new(page_size);
        for path in paths {
            provider
                .files
                .lock()
                .insert(path.to_string(), Bytes::from(path.to_string()));
        }
        provider
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn check(&self, full_path: &str) -> Result<()> {
        if self.failing.contains(full_path) {
            return Err(StorageError::Backend(format!("injected failure at {}", full_path)).into());
        }
        Ok(())
    }

    fn children(&self, folder: &str) -> Vec<Blob> {
        let depth = blobfabric_core::path::split(folder).len();
        let mut children = BTreeMap::new();
        for key in self.files.lock().keys() {
            if !blobfabric_core::path::is_descendant_of(key, folder) {
                continue;
            }
            let segments = blobfabric_core::path::split(key);
            let child = blobfabric_core::path::combine(&segments[..=depth]);
            let blob = if segments.len() == depth + 1 {
                Blob::file(&child)
            } else {
                Blob::folder(&child)
            };
            children.insert(child, blob);
        }
        children.into_values().collect()
    }
}

#[async_trait]
impl BlobPrimitives for ScriptedProvider {
    async fn list_at(
        &self,
        folder_path: &str,
        options: &ListOptions,
        continuation: Option<&str>,
    ) -> Result<ListPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        options.validate()?;
        self.check(folder_path)?;
        if self.denied.contains(folder_path) {
            return Err(StorageError::PermissionDenied(folder_path.to_string()).into());
        }

        let entries = self.children(folder_path);
        let start: usize = continuation.and_then(|c| c.parse().ok()).unwrap_or(0);
        let end = (start + self.page_size).min(entries.len());
        Ok(ListPage {
            blobs: entries[start.min(end)..end].to_vec(),
            continuation: (end < entries.len()).then(|| end.to_string()),
        })
    }

    async fn get_blob(&self, full_path: &str) -> Result<Option<Blob>> {
        self.check(full_path)?;
        Ok(self
            .files
            .lock()
            .get(full_path)
            .map(|data| Blob::file(full_path).with_size(data.len() as u64)))
    }

    async fn delete_single(&self, full_path: &str) -> Result<()> {
        self.check(full_path)?;
        match self.files.lock().remove(full_path) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(full_path.to_string()).into()),
        }
    }

    async fn exists(&self, full_path: &str) -> Result<bool> {
        self.check(full_path)?;
        Ok(self.files.lock().contains_key(full_path))
    }

    async fn open_read(&self, full_path: &str) -> Result<Option<BlobReader>> {
        self.check(full_path)?;
        Ok(self
            .files
            .lock()
            .get(full_path)
            .cloned()
            .map(|data| Box::new(Cursor::new(data)) as BlobReader))
    }

    async fn write(&self, full_path: &str, data: Bytes, append: bool) -> Result<()> {
        self.check(full_path)?;
        let mut files = self.files.lock();
        let content = match (append, files.get(full_path)) {
            (true, Some(existing)) => {
                let mut joined = existing.to_vec();
                joined.extend_from_slice(&data);
                Bytes::from(joined)
            }
            _ => data,
        };
        files.insert(full_path.to_string(), content);
        Ok(())
    }
}

/// A tree with 12 files spread over three levels:
///
/// ```text
/// /a.txt /b.txt /c.log
/// /docs/d1.txt /docs/d2.txt /docs/deep/d3.txt /docs/deep/d4.log
/// /logs/l1.log /logs/l2.log /logs/l3.log
/// /media/m1.png /media/m2.png
/// ```
pub fn sample_tree(page_size: usize) -> ScriptedProvider {
    ScriptedProvider::with_files(
        page_size,
        &[
            "/a.txt",
            "/b.txt",
            "/c.log",
            "/docs/d1.txt",
            "/docs/d2.txt",
            "/docs/deep/d3.txt",
            "/docs/deep/d4.log",
            "/logs/l1.log",
            "/logs/l2.log",
            "/logs/l3.log",
            "/media/m1.png",
            "/media/m2.png",
        ],
    )
}

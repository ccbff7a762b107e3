//! Listing options and the accumulation policy used by recursive listings.

use std::fmt;
use std::sync::Arc;

use crate::blob::Blob;
use crate::{path, Error, Result};

/// User predicate applied to every listed blob
pub type BrowseFilter = Arc<dyn Fn(&Blob) -> bool + Send + Sync>;

/// Options for a listing operation
#[derive(Clone)]
pub struct ListOptions {
    /// Folder to list, root by default
    pub folder_path: String,
    /// Only return blobs whose name starts with this prefix
    pub file_prefix: Option<String>,
    /// Descend into subfolders
    pub recurse: bool,
    /// Global cap on the number of returned blobs across all recursion
    pub max_results: Option<usize>,
    /// Ask the backend to fill in metadata and properties
    pub include_attributes: bool,
    /// Extra user filter
    pub browse_filter: Option<BrowseFilter>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            folder_path: path::ROOT.to_string(),
            file_prefix: None,
            recurse: false,
            max_results: None,
            include_attributes: false,
            browse_filter: None,
        }
    }
}

impl fmt::Debug for ListOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListOptions")
            .field("folder_path", &self.folder_path)
            .field("file_prefix", &self.file_prefix)
            .field("recurse", &self.recurse)
            .field("max_results", &self.max_results)
            .field("include_attributes", &self.include_attributes)
            .field("browse_filter", &self.browse_filter.is_some())
            .finish()
    }
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn folder(mut self, folder_path: impl AsRef<str>) -> Self {
        self.folder_path = path::normalize(folder_path.as_ref());
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = Some(prefix.into());
        self
    }

    pub fn recurse(mut self, recurse: bool) -> Self {
        self.recurse = recurse;
        self
    }

    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn include_attributes(mut self, include: bool) -> Self {
        self.include_attributes = include;
        self
    }

    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Blob) -> bool + Send + Sync + 'static,
    {
        self.browse_filter = Some(Arc::new(filter));
        self
    }

    /// Reject a prefix carrying a path separator.
    pub fn validate(&self) -> Result<()> {
        if let Some(prefix) = &self.file_prefix {
            if prefix.contains(['/', '\\']) {
                return Err(Error::InvalidArgument(format!(
                    "file prefix {:?} cannot contain a path separator",
                    prefix
                )));
            }
        }
        Ok(())
    }

    /// True when `blob` belongs to the listed folder (or below it when
    /// recursing), matches the prefix and passes the browse filter.
    pub fn is_match(&self, blob: &Blob) -> bool {
        let in_folder = path::paths_equal(&blob.folder_path, &self.folder_path)
            || (self.recurse && path::is_descendant_of(&blob.folder_path, &self.folder_path));
        if !in_folder {
            return false;
        }

        if let Some(prefix) = &self.file_prefix {
            if !blob.name.starts_with(prefix.as_str()) {
                return false;
            }
        }

        match &self.browse_filter {
            Some(filter) => filter(blob),
            None => true,
        }
    }

    /// Append `batch` to `container`. Returns true when the max-results cap
    /// has been reached, in which case `container` holds exactly the cap.
    pub fn add(&self, container: &mut Vec<Blob>, batch: Vec<Blob>) -> bool {
        container.extend(batch);

        match self.max_results {
            Some(max) if container.len() >= max => {
                container.truncate(max);
                true
            }
            _ => false,
        }
    }
}

//! Blob model shared by every storage and listing operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::path;

/// Whether a blob is a file or a folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobKind {
    File,
    Folder,
}

/// One storage object or folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blob {
    /// Folder holding this blob, normalized
    pub folder_path: String,
    /// Last path segment
    pub name: String,
    /// File or folder
    pub kind: BlobKind,
    /// Size in bytes (if known)
    #[serde(default)]
    pub size: Option<u64>,
    /// Last modification time (if known)
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
    /// Content MD5 (if the backend reports one)
    #[serde(default)]
    pub md5: Option<String>,
    /// User metadata
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Provider-specific extras
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl Blob {
    /// Create a blob from a full path. The path is normalized.
    pub fn new(full_path: &str, kind: BlobKind) -> Self {
        let normalized = path::normalize(full_path);
        Self {
            folder_path: path::parent(&normalized),
            name: path::file_name(&normalized).to_string(),
            kind,
            size: None,
            last_modified: None,
            md5: None,
            metadata: HashMap::new(),
            properties: HashMap::new(),
        }
    }

    /// Create a file blob.
    pub fn file(full_path: &str) -> Self {
        Self::new(full_path, BlobKind::File)
    }

    /// Create a folder blob.
    pub fn folder(full_path: &str) -> Self {
        Self::new(full_path, BlobKind::Folder)
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    /// Full normalized path: folder path joined with the name.
    pub fn full_path(&self) -> String {
        path::combine([self.folder_path.as_str(), self.name.as_str()])
    }

    pub fn is_file(&self) -> bool {
        self.kind == BlobKind::File
    }

    pub fn is_folder(&self) -> bool {
        self.kind == BlobKind::Folder
    }
}

impl fmt::Display for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            BlobKind::Folder => write!(f, "{}/", self.full_path()),
            BlobKind::File => write!(f, "{}", self.full_path()),
        }
    }
}

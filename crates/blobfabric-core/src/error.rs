//! Error types for the blobfabric core library.

use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the blobfabric library.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Messaging error
    #[error("Messaging error: {0}")]
    Messaging(#[from] MessagingError),

    /// Caller supplied an invalid path, prefix or option
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation not supported by this storage, sink or messenger
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// A transform sink failed to encode or decode data
    #[error("Transform error: {0}")]
    Transform(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage-specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Object not found
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Storage backend error
    #[error("Backend error: {0}")]
    Backend(String),

    /// Invalid path
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Messaging-specific errors
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum MessagingError {
    /// Message is not known to the receiver (already confirmed or never received)
    #[error("Message not found: {0}")]
    MessageNotFound(String),

    /// Messaging backend error
    #[error("Backend error: {0}")]
    Backend(String),
}

impl Error {
    /// True when the error reports a missing object.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Storage(StorageError::NotFound(_)))
    }

    /// True when the error reports denied access.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Error::Storage(StorageError::PermissionDenied(_)))
    }

    /// Map an `object_store` failure into the storage taxonomy.
    ///
    /// `context` names the backend and operation, e.g. `"Memory GET"`.
    pub(crate) fn from_object_store(context: &str, err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { path, .. } => {
                Error::Storage(StorageError::NotFound(path))
            }
            object_store::Error::PermissionDenied { path, .. }
            | object_store::Error::Unauthenticated { path, .. } => {
                Error::Storage(StorageError::PermissionDenied(path))
            }
            object_store::Error::InvalidPath { source } => {
                Error::Storage(StorageError::InvalidPath(source.to_string()))
            }
            other => Error::Storage(StorageError::Backend(format!("{} failed: {}", context, other))),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

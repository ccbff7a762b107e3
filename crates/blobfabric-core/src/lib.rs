//! blobfabric Core Library
//!
//! This crate provides a storage-agnostic blob and messaging layer: path
//! handling, recursive listing, content transform sinks (compression,
//! encryption), large-message offloading and a generic blob storage built
//! from small per-provider primitives.

pub mod blob;
pub mod browser;
pub mod config;
pub mod error;
pub mod list_options;
pub mod messaging;
pub mod path;
pub mod sinks;
pub mod storage;

pub use blob::{Blob, BlobKind};
pub use browser::DirectoryBrowser;
pub use config::{Config, SinkConfig};
pub use error::{Error, MessagingError, Result, StorageError};
pub use list_options::{BrowseFilter, ListOptions};
pub use messaging::{
    InMemoryMessenger, LargeMessageConfig, LargeMessageMessenger, MessageHandler,
    MessagePublisher, MessageReceiver, Messenger, QueueMessage, LARGE_CONTENT_PROPERTY,
};
pub use sinks::{
    AesGcmSink, CompressionSink, CompressionType, EncryptionKey, SinkedBlobStorage, TransformSink,
};
pub use storage::{
    create_backend, create_storage, BlobPrimitives, BlobStorage, BlobStorageExt,
    GenericBlobStorage, ObjectStoreBackend, StorageBackendConfig,
};

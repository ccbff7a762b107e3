//! Large-message offload decorator.
//!
//! Message bodies above a size threshold travel through blob storage: the
//! content is written to a blob, the message is sent empty with
//! [`LARGE_CONTENT_PROPERTY`] pointing at the blob, and receivers read it
//! back before user code sees the message. Confirming or dead-lettering
//! the message deletes the blob.

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    MessageHandler, MessagePublisher, MessageReceiver, Messenger, QueueMessage,
    LARGE_CONTENT_PROPERTY,
};
use crate::config::Config;
use crate::error::StorageError;
use crate::storage::{create_storage, BlobStorage, BlobStorageExt};
use crate::{path, Error, Result};

/// Default folder for offloaded message content
pub const DEFAULT_OFFLOAD_PREFIX: &str = "message";

fn default_path_prefix() -> String {
    DEFAULT_OFFLOAD_PREFIX.to_string()
}

/// Offload settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LargeMessageConfig {
    /// Content longer than this many bytes is offloaded
    pub threshold_bytes: usize,
    /// Folder for offloaded content
    #[serde(default = "default_path_prefix")]
    pub path_prefix: String,
}

impl LargeMessageConfig {
    pub fn new(threshold_bytes: usize) -> Self {
        Self {
            threshold_bytes,
            path_prefix: default_path_prefix(),
        }
    }
}

/// Messenger decorator offloading large content to blob storage
pub struct LargeMessageMessenger {
    inner: Arc<dyn Messenger>,
    storage: Arc<dyn BlobStorage>,
    config: LargeMessageConfig,
}

impl LargeMessageMessenger {
    pub fn new(
        inner: Arc<dyn Messenger>,
        storage: Arc<dyn BlobStorage>,
        config: LargeMessageConfig,
    ) -> Self {
        Self {
            inner,
            storage,
            config,
        }
    }

    /// Wrap `inner` using the `large_message` section of `config`, with
    /// offloaded content stored through the configured storage and sinks.
    pub fn from_config(inner: Arc<dyn Messenger>, config: &Config) -> Result<Self> {
        let large_message = config.large_message.clone().ok_or_else(|| {
            Error::Config("large_message section is required for offloading".to_string())
        })?;
        let storage = create_storage(config)?;
        info!(
            "Offloading messages above {} bytes to {}",
            large_message.threshold_bytes,
            path::normalize(&large_message.path_prefix)
        );
        Ok(Self::new(inner, storage, large_message))
    }

    pub fn config(&self) -> &LargeMessageConfig {
        &self.config
    }

    fn new_offload_path(&self) -> String {
        let id = Uuid::new_v4().to_string();
        path::combine([self.config.path_prefix.as_str(), id.as_str()])
    }

    /// Replace large content with a blob reference. When any write fails
    /// the whole batch fails and the blobs of this batch are removed again.
    async fn offload(&self, messages: &mut [QueueMessage]) -> Result<()> {
        let mut pending: Vec<(usize, String, Bytes)> = Vec::new();
        for (index, msg) in messages.iter().enumerate() {
            if msg.content.len() > self.config.threshold_bytes {
                pending.push((index, self.new_offload_path(), msg.content.clone()));
            }
        }
        if pending.is_empty() {
            return Ok(());
        }

        let written = try_join_all(pending.iter().map(|(_, blob_path, content)| {
            debug!("Offloading {} bytes to {}", content.len(), blob_path);
            self.storage.write_bytes(blob_path, content.clone())
        }))
        .await;

        if let Err(e) = written {
            let paths: Vec<String> = pending.iter().map(|(_, p, _)| p.clone()).collect();
            if let Err(cleanup) = self.storage.delete(&paths).await {
                warn!("Failed to clean up offloaded content: {}", cleanup);
            }
            return Err(e);
        }

        for (index, blob_path, _) in pending {
            let msg = &mut messages[index];
            msg.content = Bytes::new();
            msg.properties
                .insert(LARGE_CONTENT_PROPERTY.to_string(), blob_path);
        }
        Ok(())
    }

    /// Delete offloaded content referenced by `messages` and strip the
    /// references.
    async fn release(&self, messages: &mut [QueueMessage]) -> Result<()> {
        let paths: Vec<String> = messages
            .iter()
            .filter_map(|m| m.offload_path().map(str::to_string))
            .collect();
        if paths.is_empty() {
            return Ok(());
        }

        debug!("Deleting {} offloaded message blobs", paths.len());
        self.storage.delete(&paths).await?;
        for msg in messages.iter_mut() {
            msg.properties.remove(LARGE_CONTENT_PROPERTY);
        }
        Ok(())
    }
}

/// Read offloaded content back into each message that references a blob.
/// The reference stays so confirmation can release the blob.
async fn rehydrate(storage: &dyn BlobStorage, messages: &mut [QueueMessage]) -> Result<()> {
    let loads = messages.iter().enumerate().filter_map(|(index, msg)| {
        msg.offload_path().map(|blob_path| {
            let blob_path = blob_path.to_string();
            async move {
                let content = storage
                    .read_bytes(&blob_path)
                    .await?
                    .ok_or_else(|| StorageError::NotFound(blob_path.clone()))?;
                Ok::<_, Error>((index, content))
            }
        })
    });

    let loaded = try_join_all(loads).await?;
    for (index, content) in loaded {
        messages[index].content = content;
    }
    Ok(())
}

/// Pump handler that rehydrates messages before the user's handler runs
struct RehydratingHandler {
    storage: Arc<dyn BlobStorage>,
    handler: Arc<dyn MessageHandler>,
}

#[async_trait]
impl MessageHandler for RehydratingHandler {
    async fn handle(&self, mut messages: Vec<QueueMessage>) -> Result<()> {
        rehydrate(self.storage.as_ref(), &mut messages).await?;
        self.handler.handle(messages).await
    }
}

#[async_trait]
impl MessagePublisher for LargeMessageMessenger {
    async fn send(&self, mut messages: Vec<QueueMessage>) -> Result<()> {
        self.offload(&mut messages).await?;
        self.inner.send(messages).await
    }
}

#[async_trait]
impl MessageReceiver for LargeMessageMessenger {
    async fn receive(&self, max_batch_size: usize) -> Result<Vec<QueueMessage>> {
        let mut messages = self.inner.receive(max_batch_size).await?;
        rehydrate(self.storage.as_ref(), &mut messages).await?;
        Ok(messages)
    }

    async fn peek(&self, max_batch_size: usize) -> Result<Vec<QueueMessage>> {
        let mut messages = self.inner.peek(max_batch_size).await?;
        rehydrate(self.storage.as_ref(), &mut messages).await?;
        Ok(messages)
    }

    async fn confirm(&self, messages: &mut [QueueMessage]) -> Result<()> {
        self.inner.confirm(messages).await?;
        self.release(messages).await
    }

    async fn dead_letter(&self, message: &mut QueueMessage, reason: &str) -> Result<()> {
        self.inner.dead_letter(message, reason).await?;
        self.release(std::slice::from_mut(message)).await
    }

    async fn start_message_pump(
        &self,
        handler: Arc<dyn MessageHandler>,
        max_batch_size: usize,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<()> {
        let handler = Arc::new(RehydratingHandler {
            storage: self.storage.clone(),
            handler,
        });
        self.inner
            .start_message_pump(handler, max_batch_size, shutdown)
            .await
    }
}

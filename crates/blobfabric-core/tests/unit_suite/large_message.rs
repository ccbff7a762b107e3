//! Large-message offload unit tests.
//!
//! Tests for the offload decorator end to end:
//! - Message pump delivers rehydrated content
//! - Confirmation releases offloaded blobs
//! - Storage failures abort sends before anything is queued

use async_trait::async_trait;
use blobfabric_core::storage::{BlobPrimitives, BlobReader, ListPage};
use blobfabric_core::{
    Blob, BlobStorage, BlobStorageExt, GenericBlobStorage, InMemoryMessenger, LargeMessageConfig,
    LargeMessageMessenger, ListOptions, MessageHandler, MessagePublisher, MessageReceiver,
    QueueMessage, Result, StorageError,
};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

use super::helpers::memory_storage;

/// Confirms every batch and forwards the content it saw
struct ConfirmingHandler {
    receiver: Arc<LargeMessageMessenger>,
    seen: mpsc::UnboundedSender<(Bytes, Option<String>)>,
}

#[async_trait]
impl MessageHandler for ConfirmingHandler {
    async fn handle(&self, mut messages: Vec<QueueMessage>) -> Result<()> {
        let offloaded: Vec<Option<String>> = messages
            .iter()
            .map(|m| m.offload_path().map(str::to_string))
            .collect();
        self.receiver.confirm(&mut messages).await?;
        for (msg, blob_path) in messages.into_iter().zip(offloaded) {
            let _ = self.seen.send((msg.content, blob_path));
        }
        Ok(())
    }
}

#[tokio::test]
async fn large_message_pump_delivers_and_releases() {
    let queue = Arc::new(InMemoryMessenger::new());
    let storage = memory_storage();
    let messenger = Arc::new(LargeMessageMessenger::new(
        queue.clone(),
        storage.clone(),
        LargeMessageConfig::new(100),
    ));

    let payload = Bytes::from(vec![0x5a; 200]);
    messenger
        .send(vec![QueueMessage::new(payload.clone())])
        .await
        .unwrap();

    let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
    let handler = Arc::new(ConfirmingHandler {
        receiver: messenger.clone(),
        seen: seen_tx,
    });
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let pump = {
        let messenger = messenger.clone();
        tokio::spawn(async move { messenger.start_message_pump(handler, 10, shutdown_rx).await })
    };

    let (content, blob_path) = tokio::time::timeout(Duration::from_secs(5), seen_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(content, payload);
    let blob_path = blob_path.unwrap();
    assert!(blob_path.starts_with("/message/"));
    assert!(!storage.exists_one(&blob_path).await.unwrap());
    assert_eq!(queue.queue_len(), 0);
    assert_eq!(queue.in_flight_len(), 0);

    shutdown_tx.send(()).unwrap();
    pump.await.unwrap().unwrap();
}

#[tokio::test]
async fn large_message_mixed_batch() {
    let queue = Arc::new(InMemoryMessenger::new());
    let storage = memory_storage();
    let messenger =
        LargeMessageMessenger::new(queue.clone(), storage.clone(), LargeMessageConfig::new(8));

    messenger
        .send(vec![
            QueueMessage::from_text("small"),
            QueueMessage::from_text("this one is offloaded"),
            QueueMessage::from_text("so is this one"),
        ])
        .await
        .unwrap();

    let stored = storage
        .list(&ListOptions::new().folder("/message"))
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);

    let mut received = messenger.receive(10).await.unwrap();
    let texts: Vec<String> = received.iter().map(|m| m.text().unwrap()).collect();
    assert_eq!(
        texts,
        vec!["small", "this one is offloaded", "so is this one"]
    );

    messenger.confirm(&mut received).await.unwrap();
    let stored = storage
        .list(&ListOptions::new().folder("/message"))
        .await
        .unwrap();
    assert!(stored.is_empty());
}

/// Storage whose writes always fail
struct ReadOnlyProvider;

#[async_trait]
impl BlobPrimitives for ReadOnlyProvider {
    async fn list_at(
        &self,
        _folder_path: &str,
        _options: &ListOptions,
        _continuation: Option<&str>,
    ) -> Result<ListPage> {
        Ok(ListPage::last(Vec::new()))
    }

    async fn get_blob(&self, _full_path: &str) -> Result<Option<Blob>> {
        Ok(None)
    }

    async fn delete_single(&self, full_path: &str) -> Result<()> {
        Err(StorageError::NotFound(full_path.to_string()).into())
    }

    async fn exists(&self, _full_path: &str) -> Result<bool> {
        Ok(false)
    }

    async fn open_read(&self, _full_path: &str) -> Result<Option<BlobReader>> {
        Ok(None)
    }

    async fn write(&self, full_path: &str, _data: Bytes, _append: bool) -> Result<()> {
        Err(StorageError::PermissionDenied(full_path.to_string()).into())
    }
}

#[tokio::test]
async fn large_message_storage_failure_aborts_send() {
    let queue = Arc::new(InMemoryMessenger::new());
    let storage: Arc<dyn BlobStorage> = Arc::new(GenericBlobStorage::new(ReadOnlyProvider));
    let messenger = LargeMessageMessenger::new(queue.clone(), storage, LargeMessageConfig::new(4));

    let result = messenger
        .send(vec![
            QueueMessage::from_text("ok"),
            QueueMessage::from_text("too large to send inline"),
        ])
        .await;

    assert!(matches!(result, Err(e) if e.is_access_denied()));
    assert_eq!(queue.queue_len(), 0);
}

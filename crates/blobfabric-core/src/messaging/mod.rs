//! Messaging contract, an in-memory messenger and the large-message
//! offload decorator.

mod large_message;
mod memory;
mod message;
mod pump;

pub use large_message::{LargeMessageConfig, LargeMessageMessenger, DEFAULT_OFFLOAD_PREFIX};
pub use memory::InMemoryMessenger;
pub use message::{QueueMessage, LARGE_CONTENT_PROPERTY};
pub use pump::{run_message_pump, PUMP_IDLE_DELAY};

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::Result;

/// Sends messages to a queue or topic
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn send(&self, messages: Vec<QueueMessage>) -> Result<()>;
}

/// Processes batches delivered by a message pump
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, messages: Vec<QueueMessage>) -> Result<()>;
}

/// Receives messages from a queue or subscription
#[async_trait]
pub trait MessageReceiver: Send + Sync {
    /// Receive up to `max_batch_size` messages, hiding them from other
    /// receivers until confirmed or their visibility expires.
    async fn receive(&self, max_batch_size: usize) -> Result<Vec<QueueMessage>>;

    /// Look at up to `max_batch_size` messages without receiving them.
    async fn peek(&self, max_batch_size: usize) -> Result<Vec<QueueMessage>>;

    /// Permanently remove processed messages.
    ///
    /// Decorators may update the messages, e.g. strip properties that
    /// referenced resources released by the confirmation.
    async fn confirm(&self, messages: &mut [QueueMessage]) -> Result<()>;

    /// Move a message to the dead-letter queue.
    async fn dead_letter(&self, message: &mut QueueMessage, reason: &str) -> Result<()>;

    /// Receive batches and hand them to `handler` until `shutdown` fires.
    ///
    /// Handlers are responsible for confirming what they processed. Handler
    /// errors are logged and the pump carries on; receive errors end it.
    async fn start_message_pump(
        &self,
        handler: Arc<dyn MessageHandler>,
        max_batch_size: usize,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<()> {
        run_message_pump(self, handler, max_batch_size, shutdown).await
    }
}

/// Publisher and receiver over the same queue
pub trait Messenger: MessagePublisher + MessageReceiver {}

impl<T: MessagePublisher + MessageReceiver + ?Sized> Messenger for T {}

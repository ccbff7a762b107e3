//! Receive loop shared by message receivers.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::{MessageHandler, MessageReceiver};
use crate::{Error, Result};

/// Wait between polls when the queue is empty
pub const PUMP_IDLE_DELAY: Duration = Duration::from_millis(500);

/// Pump batches from `receiver` into `handler` until `shutdown` fires or
/// its sender is dropped.
pub async fn run_message_pump<R>(
    receiver: &R,
    handler: Arc<dyn MessageHandler>,
    max_batch_size: usize,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()>
where
    R: MessageReceiver + ?Sized,
{
    if max_batch_size == 0 {
        return Err(Error::InvalidArgument(
            "max_batch_size must be at least 1".to_string(),
        ));
    }

    info!("Message pump started, batch size: {}", max_batch_size);

    loop {
        tokio::select! {
            batch = receiver.receive(max_batch_size) => {
                let batch = batch?;
                if batch.is_empty() {
                    tokio::select! {
                        _ = tokio::time::sleep(PUMP_IDLE_DELAY) => {}
                        _ = shutdown.recv() => break,
                    }
                    continue;
                }

                debug!("Message pump received {} messages", batch.len());
                if let Err(e) = handler.handle(batch).await {
                    warn!("Message handler failed: {}", e);
                }
            }
            _ = shutdown.recv() => break,
        }
    }

    info!("Message pump shutting down");
    Ok(())
}

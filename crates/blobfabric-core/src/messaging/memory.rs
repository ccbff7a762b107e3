//! In-memory messenger.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use tracing::debug;
use uuid::Uuid;

use super::{MessagePublisher, MessageReceiver, QueueMessage};
use crate::error::MessagingError;
use crate::Result;

#[derive(Default)]
struct QueueState {
    queue: VecDeque<QueueMessage>,
    in_flight: HashMap<String, QueueMessage>,
    dead_letters: Vec<QueueMessage>,
}

impl QueueState {
    /// Put in-flight messages whose visibility expired back at the front.
    fn requeue_expired(&mut self) {
        let now = Utc::now();
        let mut expired: Vec<QueueMessage> = Vec::new();
        self.in_flight.retain(|_, msg| {
            let visible = msg.next_visible_time.map_or(true, |t| t <= now);
            if visible {
                expired.push(msg.clone());
            }
            !visible
        });
        expired.sort_by_key(|m| m.next_visible_time);
        for msg in expired.into_iter().rev() {
            self.queue.push_front(msg);
        }
    }
}

/// Queue held in process memory, for tests and local use.
///
/// Received messages stay in flight until confirmed or dead-lettered. If
/// neither happens within the visibility timeout they are delivered again
/// with an increased dequeue count.
pub struct InMemoryMessenger {
    state: Mutex<QueueState>,
    visibility_timeout: Duration,
}

impl Default for InMemoryMessenger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMessenger {
    /// Create a messenger with a 30 second visibility timeout
    pub fn new() -> Self {
        Self::with_visibility_timeout(Duration::seconds(30))
    }

    pub fn with_visibility_timeout(visibility_timeout: Duration) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            visibility_timeout,
        }
    }

    /// Messages waiting to be received.
    pub fn queue_len(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Messages received but not yet confirmed.
    pub fn in_flight_len(&self) -> usize {
        self.state.lock().in_flight.len()
    }

    /// Dead-lettered messages, oldest first. The reason is stored in the
    /// `dead_letter_reason` property.
    pub fn dead_letters(&self) -> Vec<QueueMessage> {
        self.state.lock().dead_letters.clone()
    }
}

#[async_trait]
impl MessagePublisher for InMemoryMessenger {
    async fn send(&self, messages: Vec<QueueMessage>) -> Result<()> {
        let mut state = self.state.lock();
        for mut msg in messages {
            if msg.id.is_empty() {
                msg.id = Uuid::new_v4().to_string();
            }
            debug!("Memory SEND: {} ({} bytes)", msg.id, msg.content.len());
            state.queue.push_back(msg);
        }
        Ok(())
    }
}

#[async_trait]
impl MessageReceiver for InMemoryMessenger {
    async fn receive(&self, max_batch_size: usize) -> Result<Vec<QueueMessage>> {
        let mut state = self.state.lock();
        state.requeue_expired();

        let visible_until = Utc::now() + self.visibility_timeout;
        let count = max_batch_size.min(state.queue.len());
        let mut batch = Vec::with_capacity(count);
        for mut msg in state.queue.drain(..count).collect::<Vec<_>>() {
            msg.dequeue_count += 1;
            msg.next_visible_time = Some(visible_until);
            state.in_flight.insert(msg.id.clone(), msg.clone());
            batch.push(msg);
        }
        Ok(batch)
    }

    async fn peek(&self, max_batch_size: usize) -> Result<Vec<QueueMessage>> {
        let mut state = self.state.lock();
        state.requeue_expired();
        Ok(state.queue.iter().take(max_batch_size).cloned().collect())
    }

    async fn confirm(&self, messages: &mut [QueueMessage]) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(missing) = messages
            .iter()
            .find(|m| !state.in_flight.contains_key(&m.id))
        {
            return Err(MessagingError::MessageNotFound(missing.id.clone()).into());
        }
        for msg in messages.iter() {
            debug!("Memory CONFIRM: {}", msg.id);
            state.in_flight.remove(&msg.id);
        }
        Ok(())
    }

    async fn dead_letter(&self, message: &mut QueueMessage, reason: &str) -> Result<()> {
        let mut state = self.state.lock();
        let mut dead = state
            .in_flight
            .remove(&message.id)
            .ok_or_else(|| MessagingError::MessageNotFound(message.id.clone()))?;
        debug!("Memory DEAD LETTER: {} ({})", dead.id, reason);
        dead.properties
            .insert("dead_letter_reason".to_string(), reason.to_string());
        state.dead_letters.push(dead);
        Ok(())
    }
}

//! Queue message model.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::{Error, Result};

/// Property holding the blob path of content offloaded to blob storage
pub const LARGE_CONTENT_PROPERTY: &str = "blobfabric.large-content-path";

/// One message unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueMessage {
    /// Message ID, assigned by the messenger when left empty
    pub id: String,
    pub content: Bytes,
    /// Number of times the message has been received
    pub dequeue_count: u32,
    /// When the message becomes visible to receivers again
    pub next_visible_time: Option<DateTime<Utc>>,
    pub properties: HashMap<String, String>,
}

impl QueueMessage {
    pub fn new(content: impl Into<Bytes>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Create a message with UTF-8 text content.
    pub fn from_text(text: &str) -> Self {
        Self::new(Bytes::copy_from_slice(text.as_bytes()))
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Content as UTF-8 text.
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.content.to_vec()).map_err(|e| {
            Error::Serialization(format!("Message {} content is not UTF-8: {}", self.id, e))
        })
    }

    /// Blob path of offloaded content, if any
    pub fn offload_path(&self) -> Option<&str> {
        self.properties
            .get(LARGE_CONTENT_PROPERTY)
            .map(String::as_str)
    }
}

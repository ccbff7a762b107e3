//! Transform sinks: bidirectional stream transforms applied around blob
//! content.
//!
//! A chain is an ordered `Vec<Arc<dyn TransformSink>>`. The SAME order is
//! used in both directions:
//!
//! - write: each sink wraps the previous writer, starting from the buffer
//!   that ends up in storage. The first sink is closest to the stored bytes
//!   and the last sink sees the caller's data first.
//! - read: each sink wraps the previous reader, starting from the raw
//!   stored stream. The first sink decodes the stored bytes first.
//!
//! Because every sink's reader inverts its own writer, the chain inverts as
//! a whole. To compress and then encrypt, list `[encryption, compression]`.

mod compression;
mod encryption;
mod sinked;

pub use compression::{CompressionSink, CompressionType, DEFAULT_ZSTD_LEVEL};
pub use encryption::{AesGcmSink, EncryptionKey, FRAME_SIZE};
pub use sinked::SinkedBlobStorage;

use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

use crate::storage::BlobReader;
use crate::Result;

/// Writer layer of a sink chain.
///
/// `finish` writes any final block and then finishes the wrapped layer.
/// It is distinct from `flush`: encoders may hold a partial block across
/// flushes but must emit it on finish.
pub trait SinkWrite: Write + Send {
    fn finish(self: Box<Self>) -> io::Result<()>;
}

/// A bidirectional stream transform
pub trait TransformSink: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Whether output of separate writes can be concatenated and still
    /// decode as the concatenation of the inputs.
    fn supports_append(&self) -> bool;

    /// Wrap a reader of transformed bytes into a reader of original bytes.
    fn open_read_stream(&self, inner: BlobReader) -> Result<BlobReader>;

    /// Wrap a writer of transformed bytes into a writer of original bytes.
    fn open_write_stream(&self, inner: Box<dyn SinkWrite>) -> Result<Box<dyn SinkWrite>>;
}

/// In-memory buffer at the bottom of a write chain.
///
/// Clones share the same storage, so the chain can own one handle while the
/// caller keeps another to take the result after `finish`.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    data: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything written so far, leaving the buffer empty.
    pub fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.data.lock())
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SinkWrite for SharedBuffer {
    fn finish(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

/// Run `data` through the write side of `sinks` and return the bytes to
/// store.
pub fn encode(sinks: &[Arc<dyn TransformSink>], data: &[u8]) -> Result<Vec<u8>> {
    let buffer = SharedBuffer::new();
    let mut writer: Box<dyn SinkWrite> = Box::new(buffer.clone());
    for sink in sinks {
        writer = sink.open_write_stream(writer)?;
    }
    writer.write_all(data)?;
    writer.finish()?;
    Ok(buffer.take())
}

/// Wrap a raw stored stream with the read side of `sinks`.
pub fn decode_stream(sinks: &[Arc<dyn TransformSink>], raw: BlobReader) -> Result<BlobReader> {
    sinks
        .iter()
        .try_fold(raw, |reader, sink| sink.open_read_stream(reader))
}

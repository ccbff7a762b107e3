//! AES-256-GCM encryption sink.
//!
//! Stream layout:
//!
//! ```text
//! [nonce prefix: 8 bytes]
//! [final: u8][len: u32 BE][ciphertext + tag: len bytes]   repeated
//! ```
//!
//! Plaintext is sealed in frames of at most [`FRAME_SIZE`] bytes. Frame `i`
//! uses nonce `prefix || i as u32 BE` and the final flag as associated data,
//! so reordered, dropped or truncated frames fail authentication. Exactly one
//! frame carries the final flag and it is always the last one, possibly
//! empty.

use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, KeyInit};
use rand::RngCore;
use std::io::{self, Read, Write};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{SinkWrite, TransformSink};
use crate::storage::BlobReader;
use crate::{Error, Result};

/// Plaintext bytes per frame
pub const FRAME_SIZE: usize = 64 * 1024;

const NONCE_PREFIX_LEN: usize = 8;
const TAG_LEN: usize = 16;
const FRAME_FINAL: u8 = 1;
const FRAME_MORE: u8 = 0;

/// 256-bit (32-byte) encryption key
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; 32]);

impl EncryptionKey {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a key from 64 hex characters.
    pub fn from_hex(hex_key: &str) -> Result<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex_key.trim(), &mut bytes).map_err(|e| {
            Error::Config(format!("Encryption key must be 64 hex characters: {}", e))
        })?;
        Ok(Self(bytes))
    }

    /// Generate a random key
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EncryptionKey([REDACTED])")
    }
}

/// Encrypts on write, decrypts and authenticates on read.
///
/// Output of two writes cannot be concatenated, so the sink does not
/// support append.
#[derive(Debug, Clone)]
pub struct AesGcmSink {
    key: EncryptionKey,
}

impl AesGcmSink {
    pub fn new(key: EncryptionKey) -> Self {
        Self { key }
    }

    fn cipher(&self) -> Result<Aes256Gcm> {
        Aes256Gcm::new_from_slice(&self.key.0)
            .map_err(|e| Error::Transform(format!("Invalid AES-256 key: {}", e)))
    }
}

impl TransformSink for AesGcmSink {
    fn name(&self) -> &str {
        "aes-gcm"
    }

    fn supports_append(&self) -> bool {
        false
    }

    fn open_read_stream(&self, inner: BlobReader) -> Result<BlobReader> {
        Ok(Box::new(DecryptReader {
            cipher: self.cipher()?,
            inner,
            prefix: None,
            counter: 0,
            plain: Vec::new(),
            pos: 0,
            done: false,
        }))
    }

    fn open_write_stream(&self, inner: Box<dyn SinkWrite>) -> Result<Box<dyn SinkWrite>> {
        let mut prefix = [0u8; NONCE_PREFIX_LEN];
        rand::thread_rng().fill_bytes(&mut prefix);
        Ok(Box::new(EncryptWriter {
            cipher: self.cipher()?,
            inner,
            prefix,
            counter: 0,
            pending: Vec::with_capacity(FRAME_SIZE),
            header_written: false,
        }))
    }
}

fn frame_nonce(prefix: &[u8; NONCE_PREFIX_LEN], counter: u32) -> [u8; 12] {
    let mut nonce = [0u8; 12];
    nonce[..NONCE_PREFIX_LEN].copy_from_slice(prefix);
    nonce[NONCE_PREFIX_LEN..].copy_from_slice(&counter.to_be_bytes());
    nonce
}

fn invalid_data(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}

struct EncryptWriter {
    cipher: Aes256Gcm,
    inner: Box<dyn SinkWrite>,
    prefix: [u8; NONCE_PREFIX_LEN],
    counter: u32,
    pending: Vec<u8>,
    header_written: bool,
}

impl EncryptWriter {
    fn write_header(&mut self) -> io::Result<()> {
        if !self.header_written {
            self.inner.write_all(&self.prefix)?;
            self.header_written = true;
        }
        Ok(())
    }

    fn seal_frame(&mut self, flag: u8, plaintext: &[u8]) -> io::Result<()> {
        self.write_header()?;

        let nonce = frame_nonce(&self.prefix, self.counter);
        let ciphertext = self
            .cipher
            .encrypt(
                aes_gcm::Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: &[flag],
                },
            )
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "AES-GCM encryption failed"))?;

        self.counter = self
            .counter
            .checked_add(1)
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "too many frames"))?;

        self.inner.write_all(&[flag])?;
        self.inner
            .write_all(&(ciphertext.len() as u32).to_be_bytes())?;
        self.inner.write_all(&ciphertext)
    }
}

impl Write for EncryptWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        // Keep at least one byte back so the final frame is never skipped.
        while self.pending.len() > FRAME_SIZE {
            let rest = self.pending.split_off(FRAME_SIZE);
            let frame = std::mem::replace(&mut self.pending, rest);
            self.seal_frame(FRAME_MORE, &frame)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl SinkWrite for EncryptWriter {
    fn finish(mut self: Box<Self>) -> io::Result<()> {
        let last = std::mem::take(&mut self.pending);
        self.seal_frame(FRAME_FINAL, &last)?;
        self.inner.finish()
    }
}

struct DecryptReader {
    cipher: Aes256Gcm,
    inner: BlobReader,
    prefix: Option<[u8; NONCE_PREFIX_LEN]>,
    counter: u32,
    plain: Vec<u8>,
    pos: usize,
    done: bool,
}

impl DecryptReader {
    fn read_exact_or_truncated(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.inner.read_exact(buf).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => invalid_data("encrypted stream is truncated"),
            _ => e,
        })
    }

    /// Decrypt the next frame into `plain`.
    fn next_frame(&mut self) -> io::Result<()> {
        let prefix = match self.prefix {
            Some(prefix) => prefix,
            None => {
                let mut prefix = [0u8; NONCE_PREFIX_LEN];
                self.read_exact_or_truncated(&mut prefix)?;
                self.prefix = Some(prefix);
                prefix
            }
        };

        let mut header = [0u8; 5];
        self.read_exact_or_truncated(&mut header)?;
        let flag = header[0];
        if flag != FRAME_FINAL && flag != FRAME_MORE {
            return Err(invalid_data("corrupt encrypted frame header"));
        }
        let len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;
        if !(TAG_LEN..=FRAME_SIZE + TAG_LEN).contains(&len) {
            return Err(invalid_data("corrupt encrypted frame length"));
        }

        let mut ciphertext = vec![0u8; len];
        self.read_exact_or_truncated(&mut ciphertext)?;

        let nonce = frame_nonce(&prefix, self.counter);
        self.plain = self
            .cipher
            .decrypt(
                aes_gcm::Nonce::from_slice(&nonce),
                Payload {
                    msg: &ciphertext,
                    aad: &[flag],
                },
            )
            .map_err(|_| invalid_data("encrypted frame failed authentication"))?;
        self.pos = 0;
        self.counter = self
            .counter
            .checked_add(1)
            .ok_or_else(|| invalid_data("too many frames"))?;

        if flag == FRAME_FINAL {
            self.done = true;
            let mut probe = [0u8; 1];
            if self.inner.read(&mut probe)? != 0 {
                return Err(invalid_data("data after final encrypted frame"));
            }
        }
        Ok(())
    }
}

impl Read for DecryptReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pos >= self.plain.len() {
            if self.done {
                return Ok(0);
            }
            self.next_frame()?;
        }

        let n = buf.len().min(self.plain.len() - self.pos);
        buf[..n].copy_from_slice(&self.plain[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

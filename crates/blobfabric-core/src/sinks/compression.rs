//! Compression sinks.

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

use super::{SinkWrite, TransformSink};
use crate::storage::BlobReader;
use crate::{Error, Result};

/// Default compression level for zstd
pub const DEFAULT_ZSTD_LEVEL: i32 = 3;

/// Default compression level for gzip
const DEFAULT_GZIP_LEVEL: u32 = 6;

/// Compression algorithm
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionType {
    #[default]
    Gzip,
    Zstd,
    Lz4,
}

/// Compresses on write, decompresses on read
#[derive(Debug, Clone)]
pub struct CompressionSink {
    algorithm: CompressionType,
    level: Option<i32>,
}

impl CompressionSink {
    /// Create a sink with the algorithm's default level.
    pub fn new(algorithm: CompressionType) -> Self {
        Self {
            algorithm,
            level: None,
        }
    }

    /// Create a sink with an explicit level. Lz4 has no levels and ignores it.
    pub fn with_level(algorithm: CompressionType, level: i32) -> Result<Self> {
        let valid = match algorithm {
            CompressionType::Gzip => (0..=9).contains(&level),
            CompressionType::Zstd => zstd::compression_level_range().contains(&level),
            CompressionType::Lz4 => true,
        };
        if !valid {
            return Err(Error::Config(format!(
                "Invalid {:?} compression level: {}",
                algorithm, level
            )));
        }
        Ok(Self {
            algorithm,
            level: Some(level),
        })
    }

    pub fn algorithm(&self) -> CompressionType {
        self.algorithm
    }
}

impl TransformSink for CompressionSink {
    fn name(&self) -> &str {
        match self.algorithm {
            CompressionType::Gzip => "gzip",
            CompressionType::Zstd => "zstd",
            CompressionType::Lz4 => "lz4",
        }
    }

    /// Gzip members and zstd frames decode back to back; lz4 frames do not.
    fn supports_append(&self) -> bool {
        !matches!(self.algorithm, CompressionType::Lz4)
    }

    fn open_read_stream(&self, inner: BlobReader) -> Result<BlobReader> {
        match self.algorithm {
            CompressionType::Gzip => Ok(Box::new(MultiGzDecoder::new(inner))),
            CompressionType::Zstd => {
                let decoder = zstd::Decoder::new(inner).map_err(|e| {
                    Error::Transform(format!("Failed to create zstd decoder: {}", e))
                })?;
                Ok(Box::new(decoder))
            }
            CompressionType::Lz4 => Ok(Box::new(lz4_flex::frame::FrameDecoder::new(inner))),
        }
    }

    fn open_write_stream(&self, inner: Box<dyn SinkWrite>) -> Result<Box<dyn SinkWrite>> {
        match self.algorithm {
            CompressionType::Gzip => {
                let level = self
                    .level
                    .map(|l| l as u32)
                    .unwrap_or(DEFAULT_GZIP_LEVEL);
                Ok(Box::new(GzipWriter(GzEncoder::new(
                    inner,
                    flate2::Compression::new(level),
                ))))
            }
            CompressionType::Zstd => {
                let level = self.level.unwrap_or(DEFAULT_ZSTD_LEVEL);
                let encoder = zstd::Encoder::new(inner, level).map_err(|e| {
                    Error::Transform(format!("Failed to create zstd encoder: {}", e))
                })?;
                Ok(Box::new(ZstdWriter(encoder)))
            }
            CompressionType::Lz4 => Ok(Box::new(Lz4Writer(
                lz4_flex::frame::FrameEncoder::new(inner),
            ))),
        }
    }
}

struct GzipWriter(GzEncoder<Box<dyn SinkWrite>>);

impl Write for GzipWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl SinkWrite for GzipWriter {
    fn finish(self: Box<Self>) -> io::Result<()> {
        self.0.finish()?.finish()
    }
}

struct ZstdWriter(zstd::Encoder<'static, Box<dyn SinkWrite>>);

impl Write for ZstdWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl SinkWrite for ZstdWriter {
    fn finish(self: Box<Self>) -> io::Result<()> {
        self.0.finish()?.finish()
    }
}

struct Lz4Writer(lz4_flex::frame::FrameEncoder<Box<dyn SinkWrite>>);

impl Write for Lz4Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl SinkWrite for Lz4Writer {
    fn finish(self: Box<Self>) -> io::Result<()> {
        let inner = self
            .0
            .finish()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        inner.finish()
    }
}

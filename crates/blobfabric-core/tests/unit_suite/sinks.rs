//! Sink chain unit tests.
//!
//! Tests for content written through `SinkedBlobStorage` covering:
//! - Single-sink roundtrips for empty, one-byte and multi-frame content
//! - Compress-then-encrypt chains
//! - Append support per sink
//! - Integrity failures on tampered or truncated content

use std::sync::Arc;

use blobfabric_core::sinks::FRAME_SIZE;
use blobfabric_core::{
    AesGcmSink, BlobStorage, BlobStorageExt, CompressionSink, CompressionType, EncryptionKey,
    Error, SinkedBlobStorage, TransformSink,
};
use bytes::Bytes;

use super::helpers::{generate_random_bytes, generate_repetitive_bytes, memory_storage};

fn compression(algorithm: CompressionType) -> Arc<dyn TransformSink> {
    Arc::new(CompressionSink::new(algorithm))
}

fn encryption(seed: u8) -> Arc<dyn TransformSink> {
    Arc::new(AesGcmSink::new(EncryptionKey::new([seed; 32])))
}

fn payloads() -> Vec<Bytes> {
    vec![
        Bytes::new(),
        Bytes::from_static(b"1"),
        Bytes::from(generate_random_bytes(FRAME_SIZE + 4096)),
    ]
}

// ============================================================================
// Roundtrips
// ============================================================================

#[tokio::test]
async fn sinks_single_sink_roundtrip() {
    let sinks = [
        compression(CompressionType::Gzip),
        compression(CompressionType::Zstd),
        compression(CompressionType::Lz4),
        encryption(1),
    ];
    for sink in sinks {
        let name = sink.name().to_string();
        let storage = SinkedBlobStorage::new(memory_storage(), vec![sink]);
        for data in payloads() {
            storage.write_bytes("/blob.bin", data.clone()).await.unwrap();
            assert_eq!(
                storage.read_bytes("/blob.bin").await.unwrap(),
                Some(data.clone()),
                "{} with {} bytes",
                name,
                data.len()
            );
        }
    }
}

#[tokio::test]
async fn sinks_compress_then_encrypt_roundtrip() {
    let inner = memory_storage();
    // First sink sits next to the stored bytes, so this compresses first
    // and encrypts the compressed stream.
    let storage = SinkedBlobStorage::new(
        inner.clone(),
        vec![encryption(2), compression(CompressionType::Zstd)],
    );

    let data = Bytes::from(generate_repetitive_bytes(200_000));
    storage.write_bytes("/big", data.clone()).await.unwrap();
    assert_eq!(storage.read_bytes("/big").await.unwrap(), Some(data.clone()));

    let stored = inner.read_bytes("/big").await.unwrap().unwrap();
    assert!(stored.len() < data.len() / 10);

    storage.write_bytes("/empty", Bytes::new()).await.unwrap();
    assert_eq!(storage.read_bytes("/empty").await.unwrap(), Some(Bytes::new()));
}

#[tokio::test]
async fn sinks_encrypt_then_compress_roundtrip() {
    let storage = SinkedBlobStorage::new(
        memory_storage(),
        vec![compression(CompressionType::Gzip), encryption(3)],
    );
    for data in payloads() {
        storage.write_bytes("/b", data.clone()).await.unwrap();
        assert_eq!(storage.read_bytes("/b").await.unwrap(), Some(data));
    }
}

#[tokio::test]
async fn sinks_read_through_wrong_chain_fails() {
    let inner = memory_storage();
    let writer = SinkedBlobStorage::new(inner.clone(), vec![encryption(4)]);
    writer.write_text("/secret", "top secret").await.unwrap();

    let wrong_key = SinkedBlobStorage::new(inner.clone(), vec![encryption(5)]);
    assert!(wrong_key.read_bytes("/secret").await.is_err());

    let plain: Arc<dyn BlobStorage> = inner;
    let raw = plain.read_bytes("/secret").await.unwrap().unwrap();
    assert!(!raw.windows(6).any(|w| w == b"secret"));
}

// ============================================================================
// Append
// ============================================================================

#[tokio::test]
async fn sinks_append_through_streaming_compression() {
    for algorithm in [CompressionType::Gzip, CompressionType::Zstd] {
        let storage = SinkedBlobStorage::new(memory_storage(), vec![compression(algorithm)]);
        for part in ["alpha,", "beta,", "gamma"] {
            storage
                .write("/log", Bytes::copy_from_slice(part.as_bytes()), true)
                .await
                .unwrap();
        }
        assert_eq!(
            storage.read_text("/log").await.unwrap().as_deref(),
            Some("alpha,beta,gamma"),
            "{:?}",
            algorithm
        );
    }
}

#[tokio::test]
async fn sinks_append_rejected_when_any_sink_cannot_append() {
    let chains = [
        vec![encryption(6)],
        vec![compression(CompressionType::Lz4)],
        vec![compression(CompressionType::Gzip), encryption(6)],
    ];
    for sinks in chains {
        let storage = SinkedBlobStorage::new(memory_storage(), sinks);
        let result = storage
            .write("/log", Bytes::from_static(b"entry"), true)
            .await;
        assert!(matches!(result, Err(Error::Unsupported(_))));
    }
}

// ============================================================================
// Integrity
// ============================================================================

#[tokio::test]
async fn sinks_tampered_ciphertext_fails_read() {
    let inner = memory_storage();
    let storage = SinkedBlobStorage::new(inner.clone(), vec![encryption(7)]);
    storage
        .write_bytes("/t", Bytes::from(generate_random_bytes(1000)))
        .await
        .unwrap();

    let mut raw = inner.read_bytes("/t").await.unwrap().unwrap().to_vec();
    raw[20] ^= 0x80;
    inner.write_bytes("/t", Bytes::from(raw)).await.unwrap();

    assert!(storage.read_bytes("/t").await.is_err());
}

#[tokio::test]
async fn sinks_truncated_ciphertext_fails_read() {
    let inner = memory_storage();
    let storage = SinkedBlobStorage::new(inner.clone(), vec![encryption(8)]);
    storage
        .write_bytes("/t", Bytes::from(generate_random_bytes(FRAME_SIZE * 2)))
        .await
        .unwrap();

    let raw = inner.read_bytes("/t").await.unwrap().unwrap();
    inner
        .write_bytes("/t", raw.slice(..raw.len() / 2))
        .await
        .unwrap();

    assert!(storage.read_bytes("/t").await.is_err());
}

#[tokio::test]
async fn sinks_missing_blob_is_none() {
    let storage = SinkedBlobStorage::new(
        memory_storage(),
        vec![compression(CompressionType::Gzip), encryption(9)],
    );
    assert!(storage.read_bytes("/nope").await.unwrap().is_none());
}

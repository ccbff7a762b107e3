//! Listing unit tests.
//!
//! Tests for recursive listing through the generic storage covering:
//! - Pagination and recursion
//! - Prefix and browse filters at every level
//! - The global max-results cap
//! - Skipped denied branches and aborted walks

use blobfabric_core::{
    BlobStorage, BlobStorageExt, Error, GenericBlobStorage, ListOptions, StorageError,
};

use super::helpers::{memory_storage, sample_tree, sorted_paths};

// ============================================================================
// Recursion and pagination
// ============================================================================

#[tokio::test]
async fn listing_flat_root() {
    let storage = GenericBlobStorage::new(sample_tree(2));
    let blobs = storage.list(&ListOptions::new()).await.unwrap();

    assert_eq!(
        sorted_paths(&blobs),
        vec!["/a.txt", "/b.txt", "/c.log", "/docs", "/logs", "/media"]
    );
    // six entries at two per page
    assert_eq!(storage.primitives().list_calls(), 3);
}

#[tokio::test]
async fn listing_recursive_returns_files_and_folders() {
    let storage = GenericBlobStorage::new(sample_tree(3));
    let blobs = storage
        .list(&ListOptions::new().recurse(true))
        .await
        .unwrap();

    assert_eq!(blobs.len(), 16);
    assert_eq!(blobs.iter().filter(|b| b.is_folder()).count(), 4);
    assert!(sorted_paths(&blobs).contains(&"/docs/deep/d4.log".to_string()));
}

#[tokio::test]
async fn listing_recursive_from_subfolder() {
    let storage = GenericBlobStorage::new(sample_tree(1));
    let blobs = storage
        .list(&ListOptions::new().folder("docs/").recurse(true))
        .await
        .unwrap();

    assert_eq!(
        sorted_paths(&blobs),
        vec![
            "/docs/d1.txt",
            "/docs/d2.txt",
            "/docs/deep",
            "/docs/deep/d3.txt",
            "/docs/deep/d4.log"
        ]
    );
}

// ============================================================================
// Filters
// ============================================================================

#[tokio::test]
async fn listing_prefix_applies_at_every_level() {
    let storage = GenericBlobStorage::new(sample_tree(2));
    let blobs = storage
        .list(&ListOptions::new().recurse(true).prefix("d"))
        .await
        .unwrap();

    assert_eq!(
        sorted_paths(&blobs),
        vec![
            "/docs",
            "/docs/d1.txt",
            "/docs/d2.txt",
            "/docs/deep",
            "/docs/deep/d3.txt",
            "/docs/deep/d4.log"
        ]
    );
}

#[tokio::test]
async fn listing_prefix_with_separator_is_rejected_before_any_call() {
    let storage = GenericBlobStorage::new(sample_tree(2));
    for prefix in ["ab/c", "ab\\c"] {
        let result = storage.list(&ListOptions::new().prefix(prefix)).await;
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }
    assert_eq!(storage.primitives().list_calls(), 0);
}

#[tokio::test]
async fn listing_browse_filter_keeps_only_matches() {
    let storage = GenericBlobStorage::new(sample_tree(4));
    let options = ListOptions::new()
        .recurse(true)
        .filter(|b| b.is_file() && b.name.ends_with(".log"));
    let blobs = storage.list(&options).await.unwrap();

    assert_eq!(
        sorted_paths(&blobs),
        vec![
            "/c.log",
            "/docs/deep/d4.log",
            "/logs/l1.log",
            "/logs/l2.log",
            "/logs/l3.log"
        ]
    );
}

// ============================================================================
// Max results
// ============================================================================

#[tokio::test]
async fn listing_max_results_is_a_global_cap() {
    for max in 1..=20 {
        let storage = GenericBlobStorage::new(sample_tree(2));
        let blobs = storage
            .list(&ListOptions::new().recurse(true).max_results(max))
            .await
            .unwrap();
        assert_eq!(blobs.len(), max.min(16), "max_results = {}", max);
    }
}

#[tokio::test]
async fn listing_max_results_stops_further_listing() {
    let storage = GenericBlobStorage::new(sample_tree(100));
    let blobs = storage
        .list(&ListOptions::new().recurse(true).max_results(3))
        .await
        .unwrap();

    assert_eq!(blobs.len(), 3);
    // the root level alone already fills the budget
    assert_eq!(storage.primitives().list_calls(), 1);
}

// ============================================================================
// Failure policy
// ============================================================================

#[tokio::test]
async fn listing_skips_denied_subfolder() {
    let mut provider = sample_tree(2);
    provider.denied.insert("/docs".to_string());
    let storage = GenericBlobStorage::new(provider);

    let blobs = storage
        .list(&ListOptions::new().recurse(true))
        .await
        .unwrap();
    let paths = sorted_paths(&blobs);

    assert!(paths.contains(&"/docs".to_string()));
    assert!(!paths.iter().any(|p| p.starts_with("/docs/")));
    assert!(paths.contains(&"/logs/l3.log".to_string()));
    assert_eq!(blobs.len(), 16 - 5);
}

#[tokio::test]
async fn listing_backend_failure_aborts() {
    let mut provider = sample_tree(2);
    provider.failing.insert("/media".to_string());
    let storage = GenericBlobStorage::new(provider);

    let result = storage.list(&ListOptions::new().recurse(true)).await;
    assert!(matches!(
        result,
        Err(Error::Storage(StorageError::Backend(_)))
    ));
}

#[tokio::test]
async fn listing_memory_backend_recursively() {
    let storage = memory_storage();
    for path in ["/x/1", "/x/y/2", "/x/y/z/3", "/top"] {
        storage.write_text(path, "data").await.unwrap();
    }

    let blobs = storage
        .list(&ListOptions::new().folder("/x").recurse(true))
        .await
        .unwrap();
    let files: Vec<_> = blobs.into_iter().filter(|b| b.is_file()).collect();
    assert_eq!(sorted_paths(&files), vec!["/x/1", "/x/y/2", "/x/y/z/3"]);
}

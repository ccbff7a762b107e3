use anyhow::Result;
use blobfabric_core::BlobStorage;

/// Print one line per path. Returns false when any path is missing.
pub async fn run(storage: &dyn BlobStorage, paths: &[String]) -> Result<bool> {
    let found = storage.exists(paths).await?;
    for (path, exists) in paths.iter().zip(&found) {
        println!("{}\t{}", if *exists { "yes" } else { "no" }, path);
    }
    Ok(found.iter().all(|f| *f))
}

use anyhow::Result;
use blobfabric_core::BlobStorage;
use tracing::info;

pub async fn run(storage: &dyn BlobStorage, paths: &[String]) -> Result<()> {
    storage.delete(paths).await?;
    info!("Deleted {} paths", paths.len());
    Ok(())
}

use anyhow::{bail, Result};
use blobfabric_core::{BlobStorage, BlobStorageExt};
use std::io::Write;

pub async fn run(storage: &dyn BlobStorage, path: &str) -> Result<()> {
    let Some(data) = storage.read_bytes(path).await? else {
        bail!("Blob not found: {}", path);
    };

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&data)?;
    stdout.flush()?;
    Ok(())
}

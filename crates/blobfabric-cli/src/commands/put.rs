use anyhow::{Context, Result};
use blobfabric_core::BlobStorage;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::info;

pub async fn run(storage: &dyn BlobStorage, path: &str, file: Option<&str>, append: bool) -> Result<()> {
    let data = read_input(file, tokio::io::stdin()).await?;

    let len = data.len();
    storage.write(path, Bytes::from(data), append).await?;
    info!(
        "{} {} bytes to {}",
        if append { "Appended" } else { "Wrote" },
        len,
        path
    );
    Ok(())
}

/// Content of `file`, or everything readable from `stdin` when no file is given.
async fn read_input<R: AsyncRead + Unpin>(file: Option<&str>, mut stdin: R) -> Result<Vec<u8>> {
    match file {
        Some(file) => tokio::fs::read(file)
            .await
            .with_context(|| format!("Failed to read {}", file)),
        None => {
            let mut data = Vec::new();
            stdin
                .read_to_end(&mut data)
                .await
                .context("Failed to read stdin")?;
            Ok(data)
        }
    }
}

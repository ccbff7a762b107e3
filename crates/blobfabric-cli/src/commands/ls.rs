use anyhow::Result;
use blobfabric_core::{BlobStorage, ListOptions};
use tracing::info;

use super::OutputFormat;

pub async fn run(
    storage: &dyn BlobStorage,
    folder: &str,
    recursive: bool,
    prefix: Option<String>,
    max: Option<usize>,
    format: &str,
) -> Result<()> {
    let mut options = ListOptions::new().folder(folder).recurse(recursive);
    if let Some(prefix) = prefix {
        options = options.prefix(prefix);
    }
    if let Some(max) = max {
        options = options.max_results(max);
    }

    info!("Listing {}", folder);
    let mut blobs = storage.list(&options).await?;
    blobs.sort_by_key(|b| b.full_path());

    match OutputFormat::parse(format) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&blobs)?);
        }
        OutputFormat::Text => {
            if blobs.is_empty() {
                println!("No blobs found in {}", folder);
            }
            for blob in &blobs {
                let size = blob
                    .size
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{:>12}  {}", size, blob);
            }
        }
    }

    Ok(())
}

use anyhow::{bail, Result};
use blobfabric_core::{BlobStorage, BlobStorageExt};

use super::OutputFormat;

pub async fn run(storage: &dyn BlobStorage, path: &str, format: &str) -> Result<()> {
    let Some(blob) = storage.get_blob(path).await? else {
        bail!("Blob not found: {}", path);
    };

    match OutputFormat::parse(format) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&blob)?);
        }
        OutputFormat::Text => {
            println!("Path:          {}", blob.full_path());
            println!("Kind:          {:?}", blob.kind);
            if let Some(size) = blob.size {
                println!("Size:          {} bytes", size);
            }
            if let Some(modified) = blob.last_modified {
                println!("Last modified: {}", modified.format("%Y-%m-%d %H:%M:%S UTC"));
            }
            if let Some(md5) = &blob.md5 {
                println!("MD5:           {}", md5);
            }
            let mut properties: Vec<_> = blob.properties.iter().collect();
            properties.sort();
            for (key, value) in properties {
                println!("{:<14} {}", format!("{}:", key), value);
            }
        }
    }

    Ok(())
}

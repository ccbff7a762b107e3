pub mod cat;
pub mod exists;
pub mod ls;
pub mod put;
pub mod rm;
pub mod stat;

use anyhow::{Context, Result};
use blobfabric_core::{create_storage, BlobStorage, Config};
use std::sync::Arc;
use tracing::debug;

/// Output format for listing and metadata commands
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Load the configuration file and build the storage it describes.
pub fn open_storage(config_path: &str) -> Result<Arc<dyn BlobStorage>> {
    let config = Config::load(config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;
    debug!("Loaded configuration: {:?}", config);
    Ok(create_storage(&config)?)
}

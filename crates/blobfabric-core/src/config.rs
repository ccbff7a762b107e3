//! Configuration types.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::messaging::LargeMessageConfig;
use crate::sinks::{AesGcmSink, CompressionSink, CompressionType, EncryptionKey, TransformSink};
use crate::storage::StorageBackendConfig;
use crate::{Error, Result};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Storage backend configuration
    pub storage: StorageBackendConfig,

    /// Sink chain applied to blob content, first entry closest to storage
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,

    /// Offload settings for large messages
    #[serde(default)]
    pub large_message: Option<LargeMessageConfig>,
}

/// One transform sink
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkConfig {
    Compression {
        #[serde(default)]
        algorithm: CompressionType,
        /// Compression level, algorithm default when absent
        #[serde(default)]
        level: Option<i32>,
    },
    AesGcm {
        /// Key as 64 hex characters
        #[serde(default)]
        key_hex: Option<String>,
        /// Environment variable holding the hex key
        #[serde(default)]
        key_env: Option<String>,
    },
}

impl std::fmt::Debug for SinkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compression { algorithm, level } => f
                .debug_struct("Compression")
                .field("algorithm", algorithm)
                .field("level", level)
                .finish(),
            Self::AesGcm { key_hex, key_env } => f
                .debug_struct("AesGcm")
                .field("key_hex", &key_hex.as_ref().map(|_| "[REDACTED]"))
                .field("key_env", key_env)
                .finish(),
        }
    }
}

impl SinkConfig {
    /// Build the sink this entry describes.
    pub fn build(&self) -> Result<Arc<dyn TransformSink>> {
        match self {
            Self::Compression { algorithm, level } => {
                let sink = match level {
                    Some(level) => CompressionSink::with_level(*algorithm, *level)?,
                    None => CompressionSink::new(*algorithm),
                };
                Ok(Arc::new(sink))
            }
            Self::AesGcm { key_hex, key_env } => {
                let key = match (key_hex, key_env) {
                    (Some(hex_key), None) => EncryptionKey::from_hex(hex_key)?,
                    (None, Some(var)) => {
                        let hex_key = std::env::var(var).map_err(|e| {
                            Error::Config(format!("Encryption key variable {}: {}", var, e))
                        })?;
                        EncryptionKey::from_hex(&hex_key)?
                    }
                    _ => {
                        return Err(Error::Config(
                            "aes_gcm sink needs exactly one of key_hex or key_env".to_string(),
                        ))
                    }
                };
                Ok(Arc::new(AesGcmSink::new(key)))
            }
        }
    }
}

impl Config {
    /// Parse configuration from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&contents)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(large_message) = &self.large_message {
            if large_message.threshold_bytes == 0 {
                return Err(Error::Config(
                    "large_message.threshold_bytes must be greater than 0".to_string(),
                ));
            }
        }

        for sink in &self.sinks {
            if let SinkConfig::AesGcm { key_hex, key_env } = sink {
                if key_hex.is_some() == key_env.is_some() {
                    return Err(Error::Config(
                        "aes_gcm sink needs exactly one of key_hex or key_env".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Build the configured sink chain, in order.
    pub fn build_sinks(&self) -> Result<Vec<Arc<dyn TransformSink>>> {
        self.sinks.iter().map(SinkConfig::build).collect()
    }
}

//! Server configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Demo server configuration, loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Bind address.
    #[builder(default = "0.0.0.0:8080".to_owned(), setter(into))]
    pub gateway_listen: String,
    /// Log level filter used when `RUST_LOG` is unset.
    #[builder(default = "info".to_owned(), setter(into))]
    pub log_level: String,
    /// Directory whose files are loaded into the bucket at startup. When
    /// unset, a small demo tree is seeded instead.
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub seed_dir: Option<PathBuf>,
    /// Bodies above this size are spilled to temp files.
    #[builder(default = blobfs_store::MemoryBucket::default_max_memory_size())]
    pub max_memory_object_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GATEWAY_LISTEN` | `0.0.0.0:8080` |
    /// | `LOG_LEVEL` | `info` |
    /// | `BLOBFS_SEED_DIR` | *(unset: demo tree)* |
    /// | `BLOBFS_MAX_MEMORY_OBJECT_SIZE` | `524288` |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Ok(v) = std::env::var("BLOBFS_SEED_DIR") {
            if !v.trim().is_empty() {
                config.seed_dir = Some(PathBuf::from(v));
            }
        }
        if let Ok(v) = std::env::var("BLOBFS_MAX_MEMORY_OBJECT_SIZE") {
            if let Ok(n) = v.trim().parse() {
                config.max_memory_object_size = n;
            }
        }

        config
    }
}

//! blobfs configuration.
//!
//! Provides [`BlobFsConfig`], the single tuning surface of the filesystem
//! layer. Values can be built in code or loaded from environment variables.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Filesystem configuration.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use blobfs_core::BlobFsConfig;
///
/// let config = BlobFsConfig::builder()
///     .request_timeout(Duration::from_secs(5))
///     .build();
/// assert!(config.has_request_timeout());
/// assert!(!BlobFsConfig::default().has_request_timeout());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct BlobFsConfig {
    /// Deadline applied to each individual `stat`, `readdir`, `read` and
    /// `seek` call. Zero disables the per-call deadline.
    #[builder(default)]
    #[serde(default, with = "duration_millis")]
    pub request_timeout: Duration,
}

impl BlobFsConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `BLOBFS_REQUEST_TIMEOUT_MS` | `0` (no deadline) |
    ///
    /// Unparseable values fall back to the default.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("BLOBFS_REQUEST_TIMEOUT_MS") {
            if let Ok(ms) = v.trim().parse::<u64>() {
                config.request_timeout = Duration::from_millis(ms);
            }
        }

        config
    }

    /// Whether a per-call deadline is configured.
    #[must_use]
    pub fn has_request_timeout(&self) -> bool {
        !self.request_timeout.is_zero()
    }
}

/// Serialize a [`Duration`] as whole milliseconds.
mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let ms = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(ms)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

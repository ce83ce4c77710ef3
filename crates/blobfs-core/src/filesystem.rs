//! Filesystem root: hands out [`BlobFile`] handles over a shared bucket.

use std::sync::Arc;

use blobfs_store::ObjectStore;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::config::BlobFsConfig;
use crate::file::BlobFile;

/// Read-only hierarchical view of an object-store bucket.
///
/// Cloning is cheap; clones share the bucket and the cancellation token.
/// The bucket is never mutated or closed by this type.
#[derive(Debug, Clone)]
pub struct BlobFileSystem {
    bucket: Arc<dyn ObjectStore>,
    cancel: CancellationToken,
    config: BlobFsConfig,
}

impl BlobFileSystem {
    /// Filesystem over `bucket` with the default configuration.
    #[must_use]
    pub fn new(bucket: Arc<dyn ObjectStore>) -> Self {
        Self::with_config(bucket, BlobFsConfig::default())
    }

    /// Filesystem over `bucket` with an explicit configuration.
    #[must_use]
    pub fn with_config(bucket: Arc<dyn ObjectStore>, config: BlobFsConfig) -> Self {
        Self {
            bucket,
            cancel: CancellationToken::new(),
            config,
        }
    }

    /// Use `cancel` as the ambient cancellation for every handle opened
    /// afterwards. Each handle observes a child of this token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Open a handle on `path`.
    ///
    /// One leading `/` is stripped; `""` and `"/"` both name the root. This
    /// never touches the bucket, so it cannot fail: missing paths surface as
    /// [`BlobFsError::NotExist`](crate::BlobFsError::NotExist) on first use.
    #[must_use]
    pub fn open(&self, path: &str) -> BlobFile {
        let name = path.strip_prefix('/').unwrap_or(path);
        trace!(path, name, "opening handle");
        BlobFile::new(
            name.to_owned(),
            Arc::clone(&self.bucket),
            self.cancel.child_token(),
            self.config.clone(),
        )
    }

    /// The shared bucket.
    #[must_use]
    pub fn bucket(&self) -> &Arc<dyn ObjectStore> {
        &self.bucket
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &BlobFsConfig {
        &self.config
    }
}

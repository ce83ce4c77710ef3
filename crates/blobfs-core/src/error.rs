//! Error types for blobfs handles.
//!
//! End of data is not an error: byte reads return `Ok(0)` and bounded
//! directory reads report it through
//! [`DirEntries::end_of_listing`](crate::DirEntries::end_of_listing).

use std::time::Duration;

use blobfs_store::StoreError;

/// Error returned by [`BlobFile`](crate::BlobFile) operations.
#[derive(Debug, thiserror::Error)]
pub enum BlobFsError {
    /// Neither a blob nor a non-empty virtual directory exists at the path.
    #[error("file does not exist: {name}")]
    NotExist {
        /// The normalized key that was resolved.
        name: String,
    },

    /// The per-call deadline elapsed.
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        /// The handle operation that timed out.
        operation: &'static str,
        /// The configured deadline.
        timeout: Duration,
    },

    /// The ambient cancellation token fired.
    #[error("{operation} was cancelled")]
    Cancelled {
        /// The handle operation that was cancelled.
        operation: &'static str,
    },

    /// Any other error reported by the object store, unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BlobFsError {
    /// Whether this error means the path does not exist.
    #[must_use]
    pub fn is_not_exist(&self) -> bool {
        matches!(self, Self::NotExist { .. })
    }
}

/// Convenience result type for blobfs operations.
pub type BlobFsResult<T> = Result<T, BlobFsError>;

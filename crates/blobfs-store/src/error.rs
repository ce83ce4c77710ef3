//! Error types reported by object-store implementations.
//!
//! [`StoreError`] is the only error type that crosses the store boundary.
//! Callers are expected to distinguish "not found" through
//! [`StoreError::is_not_found`] and propagate everything else unchanged.
//!
//! # Usage
//!
//! ```
//! use blobfs_store::StoreError;
//!
//! let err = StoreError::NotFound {
//!     key: "missing.txt".to_owned(),
//! };
//! assert!(err.is_not_found());
//! ```

/// Error returned by an [`ObjectStore`](crate::ObjectStore) primitive.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No blob is stored under the requested key.
    #[error("the specified key does not exist: {key}")]
    NotFound {
        /// The key that was not found.
        key: String,
    },

    /// A range read started past the end of the blob.
    #[error("range start {offset} is beyond the end of {key} ({size} bytes)")]
    InvalidRange {
        /// The key that was read.
        key: String,
        /// The requested start offset.
        offset: u64,
        /// The blob size in bytes.
        size: u64,
    },

    /// An I/O error from the backing medium.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl StoreError {
    /// Whether this error means the key does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Convenience result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

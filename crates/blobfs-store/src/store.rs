//! The object-store capability set.
//!
//! Both traits use `#[async_trait]` because they must be object safe: blobfs
//! holds the bucket as `Arc<dyn ObjectStore>` and each handle owns a
//! `Box<dyn ListCursor>`.

use std::fmt;

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::error::StoreResult;
use crate::types::{Attributes, ListObject, ListOptions};

/// Forward-only byte stream returned by [`ObjectStore::open_range`].
///
/// Dropping the stream releases whatever the store holds for it.
pub type ByteStream = Box<dyn AsyncRead + Send + Unpin>;

/// A bucket of blobs addressed by flat keys.
///
/// Implementations must be safe to share between many concurrent readers.
#[async_trait]
pub trait ObjectStore: Send + Sync + fmt::Debug {
    /// Look up the attributes of the blob stored under exactly `key`.
    ///
    /// Returns [`StoreError::NotFound`](crate::StoreError::NotFound) when no
    /// such blob exists.
    async fn attributes(&self, key: &str) -> StoreResult<Attributes>;

    /// Start a lazy listing. No I/O happens until the cursor is advanced.
    fn list(&self, options: ListOptions) -> Box<dyn ListCursor>;

    /// Open a stream over `key` starting at byte `offset`.
    ///
    /// `length` bounds the number of bytes returned; `None` reads to the end.
    async fn open_range(&self, key: &str, offset: u64, length: Option<u64>)
    -> StoreResult<ByteStream>;
}

/// Resumable iteration state over one listing call.
#[async_trait]
pub trait ListCursor: Send {
    /// Advance to the next entry.
    ///
    /// `Ok(None)` signals exhaustion; calling again after exhaustion keeps
    /// returning `Ok(None)`.
    async fn next(&mut self) -> StoreResult<Option<ListObject>>;
}

//! The [`BlobFile`] handle: stat, directory reads and seekable byte reads
//! over a single path in a bucket.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use blobfs_store::{ByteStream, DELIMITER, ListCursor, ListOptions, ObjectStore, StoreError};
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::BlobFsConfig;
use crate::error::{BlobFsError, BlobFsResult};
use crate::fileinfo::FileInfo;
use crate::readdir::{DirEntries, collect_entries};
use crate::reader::{Whence, target_offset};
use crate::resolver::{Resolution, dir_prefix, resolve};

/// An open path in a [`BlobFileSystem`](crate::BlobFileSystem).
///
/// Metadata, the directory cursor and the byte stream are all created lazily
/// on first use and owned exclusively by the handle. Dropping the handle
/// releases them; [`close`](Self::close) does the same explicitly.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use blobfs_core::{BlobFileSystem, Whence};
/// use blobfs_store::MemoryBucket;
/// use bytes::Bytes;
///
/// # tokio_test::block_on(async {
/// let bucket = MemoryBucket::default();
/// bucket.write("foo", Bytes::from("foo")).await.unwrap();
///
/// let fs = BlobFileSystem::new(Arc::new(bucket));
/// let mut file = fs.open("/foo");
/// file.seek(1, Whence::Start).await.unwrap();
///
/// let mut rest = Vec::new();
/// file.read_to_end(&mut rest).await.unwrap();
/// assert_eq!(rest, b"oo");
/// file.close().unwrap();
/// # });
/// ```
pub struct BlobFile {
    name: String,
    bucket: Arc<dyn ObjectStore>,
    cancel: CancellationToken,
    config: BlobFsConfig,
    info: Option<FileInfo>,
    cursor: Option<Box<dyn ListCursor>>,
    stream: Option<ByteStream>,
    offset: u64,
}

impl fmt::Debug for BlobFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobFile")
            .field("name", &self.name)
            .field("offset", &self.offset)
            .field("info", &self.info)
            .field("listing", &self.cursor.is_some())
            .field("streaming", &self.stream.is_some())
            .finish_non_exhaustive()
    }
}

impl BlobFile {
    pub(crate) fn new(
        name: String,
        bucket: Arc<dyn ObjectStore>,
        cancel: CancellationToken,
        config: BlobFsConfig,
    ) -> Self {
        Self {
            name,
            bucket,
            cancel,
            config,
            info: None,
            cursor: None,
            stream: None,
            offset: 0,
        }
    }

    /// The normalized key this handle was opened on.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current byte offset of the reader.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Resolve the path to a blob or virtual directory.
    ///
    /// The first successful resolution is cached for the lifetime of the
    /// handle.
    ///
    /// # Errors
    ///
    /// [`BlobFsError::NotExist`] when nothing is stored at or below the path;
    /// attribute lookup failures other than "not found" as
    /// [`BlobFsError::Store`].
    pub async fn stat(&mut self) -> BlobFsResult<FileInfo> {
        let (cancel, timeout) = self.call_context();
        guard("stat", timeout, &cancel, self.resolve_info()).await
    }

    /// Read the next batch of directory entries.
    ///
    /// `max_count <= 0` returns every remaining entry. A positive `max_count`
    /// returns at most that many and sets
    /// [`end_of_listing`](DirEntries::end_of_listing) when the listing ran out
    /// first. Successive calls continue where the previous one stopped.
    ///
    /// # Errors
    ///
    /// Listing failures from the store. Entries collected during the failing
    /// call are dropped and the cursor keeps its position.
    pub async fn readdir(&mut self, max_count: isize) -> BlobFsResult<DirEntries> {
        let (cancel, timeout) = self.call_context();
        guard("readdir", timeout, &cancel, self.next_entries(max_count)).await
    }

    /// Read into `buf`, returning the number of bytes read; `0` means end of
    /// data.
    ///
    /// The first read without a prior [`seek`](Self::seek) opens the blob at
    /// offset 0.
    ///
    /// # Errors
    ///
    /// [`BlobFsError::NotExist`] when the implicit open cannot resolve the
    /// path, or the store's error.
    pub async fn read(&mut self, buf: &mut [u8]) -> BlobFsResult<usize> {
        let (cancel, timeout) = self.call_context();
        guard("read", timeout, &cancel, self.read_some(buf)).await
    }

    /// Read everything from the current offset to the end of the blob,
    /// appending to `buf`.
    ///
    /// # Errors
    ///
    /// Same as [`read`](Self::read).
    pub async fn read_to_end(&mut self, buf: &mut Vec<u8>) -> BlobFsResult<usize> {
        let (cancel, timeout) = self.call_context();
        guard("read", timeout, &cancel, self.read_rest(buf)).await
    }

    /// Move the reader and return the new absolute offset.
    ///
    /// The target is clamped to `[0, size]`. Any open stream is released and
    /// a new one is opened at the target, so every seek costs one range
    /// request.
    ///
    /// # Errors
    ///
    /// [`BlobFsError::NotExist`] when the path cannot be resolved for its
    /// size, or the store's error when the range cannot be opened.
    pub async fn seek(&mut self, offset: i64, whence: Whence) -> BlobFsResult<u64> {
        let (cancel, timeout) = self.call_context();
        guard("seek", timeout, &cancel, self.seek_to(offset, whence)).await
    }

    /// [`seek`](Self::seek) with a raw `0`/`1`/`2` whence code.
    ///
    /// Unknown codes leave the handle untouched and return the current
    /// offset.
    ///
    /// # Errors
    ///
    /// Same as [`seek`](Self::seek).
    pub async fn seek_raw(&mut self, offset: i64, whence: i32) -> BlobFsResult<u64> {
        match Whence::from_raw(whence) {
            Some(whence) => self.seek(offset, whence).await,
            None => {
                debug!(name = %self.name, whence, "ignoring seek with unknown whence");
                Ok(self.offset)
            }
        }
    }

    /// Release the handle and any open stream.
    ///
    /// # Errors
    ///
    /// Never fails for in-process streams; the signature matches the other
    /// handle operations.
    #[allow(clippy::unnecessary_wraps)]
    pub fn close(mut self) -> BlobFsResult<()> {
        if self.stream.take().is_some() {
            trace!(name = %self.name, offset = self.offset, "released stream on close");
        }
        Ok(())
    }

    fn call_context(&self) -> (CancellationToken, Duration) {
        (self.cancel.clone(), self.config.request_timeout)
    }

    async fn resolve_info(&mut self) -> BlobFsResult<FileInfo> {
        if let Some(info) = &self.info {
            return Ok(info.clone());
        }

        let info = match resolve(self.bucket.as_ref(), &self.name).await? {
            Resolution::Blob(attrs) => FileInfo::blob(self.name.clone(), attrs),
            Resolution::Directory => FileInfo::directory(self.name.clone()),
            Resolution::Missing => {
                return Err(BlobFsError::NotExist {
                    name: self.name.clone(),
                });
            }
        };

        debug!(name = %self.name, is_dir = info.is_dir(), size = info.size(), "resolved path");
        self.info = Some(info.clone());
        Ok(info)
    }

    async fn next_entries(&mut self, max_count: isize) -> BlobFsResult<DirEntries> {
        let cursor = match self.cursor.take() {
            Some(cursor) => cursor,
            None => {
                let prefix = dir_prefix(&self.name);
                trace!(name = %self.name, prefix = %prefix, "opening directory listing");
                self.bucket.list(ListOptions::new(prefix, DELIMITER))
            }
        };
        let cursor = self.cursor.insert(cursor);

        let batch = collect_entries(cursor.as_mut(), max_count).await?;
        debug!(
            name = %self.name,
            max_count,
            count = batch.len(),
            end_of_listing = batch.end_of_listing,
            "readdir completed"
        );
        Ok(batch)
    }

    /// Drop the current stream and open a new one at the clamped target.
    async fn open_at(&mut self, offset: i64, whence: Whence) -> BlobFsResult<ByteStream> {
        self.stream = None;
        let size = self.resolve_info().await?.size();
        let target = target_offset(whence, offset, self.offset, size);

        let stream = self.bucket.open_range(&self.name, target, None).await?;
        trace!(name = %self.name, ?whence, offset, target, size, "opened range stream");
        self.offset = target;
        Ok(stream)
    }

    async fn seek_to(&mut self, offset: i64, whence: Whence) -> BlobFsResult<u64> {
        let stream = self.open_at(offset, whence).await?;
        self.stream = Some(stream);
        Ok(self.offset)
    }

    async fn active_stream(&mut self) -> BlobFsResult<&mut ByteStream> {
        let stream = match self.stream.take() {
            Some(stream) => stream,
            None => self.open_at(0, Whence::Start).await?,
        };
        Ok(self.stream.insert(stream))
    }

    async fn read_some(&mut self, buf: &mut [u8]) -> BlobFsResult<usize> {
        let stream = self.active_stream().await?;
        let n = stream.read(buf).await.map_err(StoreError::Io)?;
        self.offset += n as u64;
        Ok(n)
    }

    async fn read_rest(&mut self, buf: &mut Vec<u8>) -> BlobFsResult<usize> {
        let stream = self.active_stream().await?;
        let n = stream.read_to_end(buf).await.map_err(StoreError::Io)?;
        self.offset += n as u64;
        Ok(n)
    }
}

/// Run one handle operation under the ambient cancellation token and, when
/// configured, a per-call deadline.
async fn guard<T, F>(
    operation: &'static str,
    timeout: Duration,
    cancel: &CancellationToken,
    fut: F,
) -> BlobFsResult<T>
where
    F: Future<Output = BlobFsResult<T>>,
{
    let bounded = async {
        if timeout.is_zero() {
            return fut.await;
        }
        match tokio::time::timeout(timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                debug!(operation, ?timeout, "operation timed out");
                Err(BlobFsError::Timeout { operation, timeout })
            }
        }
    };

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(BlobFsError::Cancelled { operation }),
        result = bounded => result,
    }
}

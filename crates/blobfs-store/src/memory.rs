//! In-memory bucket with automatic spillover to temp files for large bodies.
//!
//! [`MemoryBucket`] keeps two structures:
//!
//! - a sorted key index (`BTreeMap` behind a `parking_lot::RwLock`) holding
//!   the [`Attributes`] of every blob, which gives listings their
//!   lexicographic order;
//! - a [`DashMap`] of bodies. Bodies below the configured threshold stay in
//!   memory as [`Bytes`]; larger ones are written to temporary files that are
//!   removed when the entry is dropped.
//!
//! Listings are paginated: a cursor fetches `page_size` entries at a time and
//! resumes after the last key it returned, so concurrent writes become visible
//! to a running listing the way they would with a remote store.

use std::collections::{BTreeMap, VecDeque};
use std::io::SeekFrom;
use std::ops::Bound;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, trace, warn};

use crate::checksums;
use crate::error::{StoreError, StoreResult};
use crate::store::{ByteStream, ListCursor, ObjectStore};
use crate::types::{Attributes, ListObject, ListOptions};

/// Default maximum body size (in bytes) kept in memory before spilling to
/// disk. The default is 512 KiB.
const DEFAULT_MAX_MEMORY_SIZE: usize = 524_288;

/// Default number of entries fetched per listing page.
const DEFAULT_PAGE_SIZE: usize = 1000;

// ---------------------------------------------------------------------------
// StoredData
// ---------------------------------------------------------------------------

/// Internal representation of a stored body.
///
/// When a [`StoredData::OnDisk`] value is dropped, the temporary file is
/// removed.
enum StoredData {
    /// Small bodies kept entirely in memory.
    InMemory {
        /// The raw bytes.
        data: Bytes,
    },
    /// Large bodies spilled to a temp file.
    OnDisk {
        /// Path to the temporary file.
        path: PathBuf,
        /// Size of the stored data in bytes.
        size: u64,
    },
}

impl std::fmt::Debug for StoredData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InMemory { data } => f
                .debug_struct("InMemory")
                .field("size", &data.len())
                .finish(),
            Self::OnDisk { path, size } => f
                .debug_struct("OnDisk")
                .field("path", path)
                .field("size", size)
                .finish(),
        }
    }
}

impl Drop for StoredData {
    fn drop(&mut self) {
        if let Self::OnDisk { path, .. } = self {
            if let Err(e) = std::fs::remove_file(path.as_path()) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "failed to remove temp file");
                }
            } else {
                trace!(path = %path.display(), "removed temp file");
            }
        }
    }
}

impl StoredData {
    /// Detach a readable source from the map entry so no map guard is held
    /// across an await point.
    fn source(&self) -> BodySource {
        match self {
            Self::InMemory { data } => BodySource::Memory(data.clone()),
            Self::OnDisk { path, size } => BodySource::Disk {
                path: path.clone(),
                size: *size,
            },
        }
    }
}

/// Owned handle to a body, detached from the [`DashMap`] entry.
enum BodySource {
    Memory(Bytes),
    Disk { path: PathBuf, size: u64 },
}

impl BodySource {
    fn size(&self) -> u64 {
        match self {
            Self::Memory(data) => data.len() as u64,
            Self::Disk { size, .. } => *size,
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryBucket
// ---------------------------------------------------------------------------

struct Inner {
    /// Sorted attribute index; drives listing order.
    index: RwLock<BTreeMap<String, Attributes>>,
    /// Body data keyed by object key.
    bodies: DashMap<String, StoredData>,
    /// Max size in bytes for in-memory bodies before spilling to disk.
    max_memory_size: usize,
    /// Entries returned per listing page.
    page_size: usize,
}

/// Thread-safe in-memory bucket implementing [`ObjectStore`].
///
/// Cloning is cheap and yields a handle to the same bucket.
///
/// # Examples
///
/// ```
/// use blobfs_store::{MemoryBucket, ObjectStore};
/// use bytes::Bytes;
///
/// # tokio_test::block_on(async {
/// let bucket = MemoryBucket::default();
/// bucket.write("docs/readme.txt", Bytes::from("hello")).await.unwrap();
///
/// let attrs = bucket.attributes("docs/readme.txt").await.unwrap();
/// assert_eq!(attrs.size, 5);
/// # });
/// ```
#[derive(Clone)]
pub struct MemoryBucket {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for MemoryBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBucket")
            .field("objects_count", &self.inner.bodies.len())
            .field("max_memory_size", &self.inner.max_memory_size)
            .field("page_size", &self.inner.page_size)
            .finish()
    }
}

impl Default for MemoryBucket {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MEMORY_SIZE)
    }
}

impl MemoryBucket {
    /// Create an empty bucket with the given memory threshold.
    #[must_use]
    pub fn new(max_memory_size: usize) -> Self {
        Self::with_page_size(max_memory_size, DEFAULT_PAGE_SIZE)
    }

    /// Create an empty bucket whose listings return `page_size` entries per
    /// page (at least one).
    #[must_use]
    pub fn with_page_size(max_memory_size: usize, page_size: usize) -> Self {
        debug!(max_memory_size, page_size, "creating MemoryBucket");
        Self {
            inner: Arc::new(Inner {
                index: RwLock::new(BTreeMap::new()),
                bodies: DashMap::new(),
                max_memory_size,
                page_size: page_size.max(1),
            }),
        }
    }

    /// Return the default maximum in-memory body size (512 KiB).
    #[must_use]
    pub fn default_max_memory_size() -> usize {
        DEFAULT_MAX_MEMORY_SIZE
    }

    /// Store a blob under `key`, replacing any previous one.
    pub async fn write(&self, key: &str, data: Bytes) -> StoreResult<Attributes> {
        self.write_with_content_type(key, data, None).await
    }

    /// Store a blob under `key` with an explicit content type.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Internal`] if a temp file cannot be created or
    /// written for a body above the memory threshold.
    pub async fn write_with_content_type(
        &self,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> StoreResult<Attributes> {
        let attrs = Attributes {
            size: data.len() as u64,
            mod_time: Utc::now(),
            md5: Some(checksums::compute_md5(&data)),
            content_type: content_type.map(str::to_owned),
        };

        let stored = self.store_data(data).await?;

        // Body first so a listed key always has a readable body.
        self.inner.bodies.insert(key.to_owned(), stored);
        self.inner.index.write().insert(key.to_owned(), attrs.clone());

        trace!(key, size = attrs.size, "stored blob");
        Ok(attrs)
    }

    /// Remove the blob under `key`. Returns whether it existed.
    pub fn delete(&self, key: &str) -> bool {
        let existed = self.inner.index.write().remove(key).is_some();
        self.inner.bodies.remove(key);
        if existed {
            trace!(key, "deleted blob");
        }
        existed
    }

    /// Number of stored blobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.index.read().len()
    }

    /// Whether the bucket holds no blobs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.index.read().is_empty()
    }

    /// Remove every blob.
    pub fn reset(&self) {
        debug!("resetting MemoryBucket");
        self.inner.index.write().clear();
        self.inner.bodies.clear();
    }

    // -----------------------------------------------------------------------
    // Private helpers
    // -----------------------------------------------------------------------

    async fn store_data(&self, data: Bytes) -> StoreResult<StoredData> {
        if data.len() > self.inner.max_memory_size {
            spill_to_disk(&data).await
        } else {
            Ok(StoredData::InMemory { data })
        }
    }
}

/// Write data to a temporary file and return a [`StoredData::OnDisk`].
async fn spill_to_disk(data: &[u8]) -> StoreResult<StoredData> {
    let size = data.len() as u64;

    // Persist the named temp file so it outlives the handle; cleanup happens
    // in `StoredData::drop`.
    let temp = tempfile::NamedTempFile::new()
        .map_err(|e| StoreError::Internal(anyhow::anyhow!("failed to create temp file: {e}")))?;
    let path = temp.path().to_path_buf();
    temp.persist(&path).map_err(|e| {
        StoreError::Internal(anyhow::anyhow!(
            "failed to persist temp file {}: {e}",
            path.display()
        ))
    })?;

    tokio::fs::write(&path, data).await.map_err(|e| {
        StoreError::Internal(anyhow::anyhow!(
            "failed to write temp file {}: {e}",
            path.display()
        ))
    })?;

    trace!(path = %path.display(), size, "spilled data to disk");
    Ok(StoredData::OnDisk { path, size })
}

#[async_trait]
impl ObjectStore for MemoryBucket {
    async fn attributes(&self, key: &str) -> StoreResult<Attributes> {
        self.inner
            .index
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_owned(),
            })
    }

    fn list(&self, options: ListOptions) -> Box<dyn ListCursor> {
        Box::new(MemoryCursor {
            inner: Arc::clone(&self.inner),
            options,
            marker: None,
            page: VecDeque::new(),
            exhausted: false,
        })
    }

    async fn open_range(
        &self,
        key: &str,
        offset: u64,
        length: Option<u64>,
    ) -> StoreResult<ByteStream> {
        let source = self
            .inner
            .bodies
            .get(key)
            .map(|entry| entry.value().source())
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_owned(),
            })?;

        let size = source.size();
        if offset > size {
            return Err(StoreError::InvalidRange {
                key: key.to_owned(),
                offset,
                size,
            });
        }
        let end = length.map_or(size, |len| offset.saturating_add(len).min(size));

        trace!(key, offset, end, "opening range stream");
        match source {
            BodySource::Memory(data) => {
                let invalid = || StoreError::InvalidRange {
                    key: key.to_owned(),
                    offset,
                    size,
                };
                let start = usize::try_from(offset).map_err(|_| invalid())?;
                let end = usize::try_from(end).map_err(|_| invalid())?;
                Ok(Box::new(std::io::Cursor::new(data.slice(start..end))))
            }
            BodySource::Disk { path, .. } => {
                let mut file = tokio::fs::File::open(&path).await?;
                file.seek(SeekFrom::Start(offset)).await?;
                Ok(Box::new(file.take(end - offset)))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Paginated cursor over a [`MemoryBucket`] listing.
struct MemoryCursor {
    inner: Arc<Inner>,
    options: ListOptions,
    /// Last key (or common prefix) handed out; the next page starts after it.
    marker: Option<String>,
    page: VecDeque<ListObject>,
    exhausted: bool,
}

impl MemoryCursor {
    fn fetch_page(&mut self) {
        let index = self.inner.index.read();
        let (entries, is_truncated) = list_page(
            &index,
            &self.options.prefix,
            &self.options.delimiter,
            self.marker.as_deref(),
            self.inner.page_size,
        );
        drop(index);

        trace!(
            prefix = %self.options.prefix,
            count = entries.len(),
            is_truncated,
            "fetched listing page"
        );

        if let Some(last) = entries.last() {
            self.marker = Some(last.key.clone());
        }
        self.exhausted = !is_truncated;
        self.page.extend(entries);
    }
}

#[async_trait]
impl ListCursor for MemoryCursor {
    async fn next(&mut self) -> StoreResult<Option<ListObject>> {
        if self.page.is_empty() && !self.exhausted {
            self.fetch_page();
        }
        Ok(self.page.pop_front())
    }
}

/// Build one listing page from the sorted index, applying prefix, delimiter,
/// start-after and page-size filtering.
///
/// Common prefixes count towards the page size and are emitted at the
/// position of their first descendant, which keeps the page in key order.
/// Returns the entries and whether more remain.
fn list_page(
    index: &BTreeMap<String, Attributes>,
    prefix: &str,
    delimiter: &str,
    start_after: Option<&str>,
    max_entries: usize,
) -> (Vec<ListObject>, bool) {
    let use_delim = !delimiter.is_empty();
    let lower = match start_after {
        Some(marker) => Bound::Excluded(marker),
        None => Bound::Included(prefix),
    };

    let mut entries = Vec::new();
    let mut last_prefix: Option<&str> = None;
    let mut is_truncated = false;

    for (key, attrs) in index.range::<str, _>((lower, Bound::Unbounded)) {
        if !key.starts_with(prefix) {
            // Keys sharing the prefix are contiguous; nothing further matches.
            break;
        }

        if use_delim {
            let after_prefix = &key[prefix.len()..];
            if let Some(pos) = after_prefix.find(delimiter) {
                let common = &key[..prefix.len() + pos + delimiter.len()];
                if last_prefix == Some(common) || start_after.is_some_and(|m| common <= m) {
                    continue;
                }
                if entries.len() >= max_entries {
                    is_truncated = true;
                    break;
                }
                entries.push(ListObject::dir(common));
                last_prefix = Some(common);
                continue;
            }
        }

        if entries.len() >= max_entries {
            is_truncated = true;
            break;
        }
        entries.push(ListObject::blob(key.as_str(), attrs));
    }

    (entries, is_truncated)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Batched directory enumeration over a listing cursor.

use blobfs_store::{ListCursor, StoreResult};

use crate::FileInfo;

/// One batch of directory entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirEntries {
    /// Entries in listing order.
    pub entries: Vec<FileInfo>,
    /// Set when a bounded read ran out of entries before filling its batch.
    ///
    /// Unbounded reads never set this flag.
    pub end_of_listing: bool,
}

impl DirEntries {
    /// Number of entries in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the batch holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry names, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(FileInfo::name)
    }
}

impl IntoIterator for DirEntries {
    type Item = FileInfo;
    type IntoIter = std::vec::IntoIter<FileInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Pull entries from `cursor`.
///
/// A non-positive `max_count` drains the cursor. A positive one stops after
/// that many entries, or earlier with `end_of_listing` set when the cursor
/// runs dry. On error the partially collected batch is discarded; entries
/// already pulled from the cursor are not replayed.
pub(crate) async fn collect_entries(
    cursor: &mut dyn ListCursor,
    max_count: isize,
) -> StoreResult<DirEntries> {
    let limit = usize::try_from(max_count).ok().filter(|n| *n > 0);
    let mut batch = DirEntries {
        entries: Vec::with_capacity(limit.unwrap_or(0).min(1024)),
        end_of_listing: false,
    };

    loop {
        if limit.is_some_and(|n| batch.entries.len() >= n) {
            return Ok(batch);
        }
        match cursor.next().await? {
            Some(entry) => batch.entries.push(FileInfo::from(entry)),
            None => {
                batch.end_of_listing = limit.is_some();
                return Ok(batch);
            }
        }
    }
}

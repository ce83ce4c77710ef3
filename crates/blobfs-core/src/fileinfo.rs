//! Stat-like descriptors for blobs and virtual directories.

use blobfs_store::{Attributes, ListObject};
use chrono::{DateTime, Utc};

/// What a resolved name turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKind {
    /// A stored blob and its attribute snapshot.
    Blob(Attributes),
    /// A virtual directory derived from keys sharing a prefix.
    Directory,
}

/// Resolved, immutable metadata for a path.
///
/// Directories always report size 0 and no modification time.
///
/// # Examples
///
/// ```
/// use blobfs_core::FileInfo;
///
/// let dir = FileInfo::directory("photos/2024/");
/// assert_eq!(dir.name(), "2024");
/// assert!(dir.is_dir());
/// assert_eq!(dir.size(), 0);
/// assert!(dir.mod_time().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    key: String,
    kind: FileKind,
}

impl FileInfo {
    /// Descriptor for the blob stored under `key`.
    #[must_use]
    pub fn blob(key: impl Into<String>, attrs: Attributes) -> Self {
        Self {
            key: key.into(),
            kind: FileKind::Blob(attrs),
        }
    }

    /// Descriptor for the virtual directory `key`.
    #[must_use]
    pub fn directory(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: FileKind::Directory,
        }
    }

    /// Last non-empty `/`-separated segment of the key.
    #[must_use]
    pub fn name(&self) -> &str {
        self.key.trim_matches('/').rsplit('/').next().unwrap_or_default()
    }

    /// The full key this descriptor was built from.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Blob or directory.
    #[must_use]
    pub fn kind(&self) -> &FileKind {
        &self.kind
    }

    /// Whether this is a virtual directory.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, FileKind::Directory)
    }

    /// Size in bytes; 0 for directories.
    #[must_use]
    pub fn size(&self) -> u64 {
        match &self.kind {
            FileKind::Blob(attrs) => attrs.size,
            FileKind::Directory => 0,
        }
    }

    /// Modification time; `None` for directories.
    #[must_use]
    pub fn mod_time(&self) -> Option<DateTime<Utc>> {
        match &self.kind {
            FileKind::Blob(attrs) => Some(attrs.mod_time),
            FileKind::Directory => None,
        }
    }

    /// Underlying attribute snapshot for blobs.
    #[must_use]
    pub fn attributes(&self) -> Option<&Attributes> {
        match &self.kind {
            FileKind::Blob(attrs) => Some(attrs),
            FileKind::Directory => None,
        }
    }
}

impl From<ListObject> for FileInfo {
    fn from(entry: ListObject) -> Self {
        match entry.attributes() {
            Some(attrs) => Self::blob(entry.key, attrs),
            None => Self::directory(entry.key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(size: u64) -> Attributes {
        Attributes {
            size,
            mod_time: Utc::now(),
            md5: None,
            content_type: None,
        }
    }

    #[test]
    fn test_should_use_last_segment_as_name() {
        assert_eq!(FileInfo::blob("foo", attrs(1)).name(), "foo");
        assert_eq!(FileInfo::blob("biz/fuz", attrs(1)).name(), "fuz");
        assert_eq!(FileInfo::directory("biz/").name(), "biz");
        assert_eq!(FileInfo::directory("/a/b//").name(), "b");
    }

    #[test]
    fn test_should_give_root_an_empty_name() {
        assert_eq!(FileInfo::directory("").name(), "");
        assert_eq!(FileInfo::directory("/").name(), "");
    }

    #[test]
    fn test_should_report_blob_metadata() {
        let a = attrs(3);
        let info = FileInfo::blob("foo", a.clone());
        assert!(!info.is_dir());
        assert_eq!(info.size(), 3);
        assert_eq!(info.mod_time(), Some(a.mod_time));
        assert_eq!(info.attributes(), Some(&a));
    }

    #[test]
    fn test_should_never_report_size_or_time_for_directories() {
        let info = FileInfo::directory("biz");
        assert!(info.is_dir());
        assert_eq!(info.size(), 0);
        assert!(info.mod_time().is_none());
        assert!(info.attributes().is_none());
        assert_eq!(info.kind(), &FileKind::Directory);
    }

    #[test]
    fn test_should_convert_list_entries() {
        let dir = FileInfo::from(ListObject::dir("biz/"));
        assert!(dir.is_dir());
        assert_eq!(dir.key(), "biz/");

        let blob = FileInfo::from(ListObject::blob("foo", &attrs(3)));
        assert!(!blob.is_dir());
        assert_eq!(blob.size(), 3);
    }
}

//! Value types exchanged with an object store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Attribute snapshot of a stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attributes {
    /// Blob size in bytes.
    pub size: u64,
    /// Last modification time.
    pub mod_time: DateTime<Utc>,
    /// Hex-encoded MD5 digest of the content, when the store computes one.
    pub md5: Option<String>,
    /// Content type recorded at write time, if any.
    pub content_type: Option<String>,
}

/// Options for a listing call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Only keys starting with this prefix are returned.
    pub prefix: String,
    /// When non-empty, keys containing the delimiter after the prefix are
    /// collapsed into a single directory entry ending with the delimiter.
    pub delimiter: String,
}

impl ListOptions {
    /// Listing of the direct children of `prefix`, grouped by `delimiter`.
    #[must_use]
    pub fn new(prefix: impl Into<String>, delimiter: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            delimiter: delimiter.into(),
        }
    }
}

/// One entry of a listing page.
///
/// Directory entries (`is_dir == true`) carry the common prefix as their key,
/// including the trailing delimiter, and zero size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListObject {
    /// Full key, or common prefix for directory entries.
    pub key: String,
    /// Whether this entry is a one-level-deeper common prefix.
    pub is_dir: bool,
    /// Blob size in bytes (0 for directories).
    pub size: u64,
    /// Modification time (absent for directories).
    pub mod_time: Option<DateTime<Utc>>,
    /// Hex-encoded MD5 digest (absent for directories).
    pub md5: Option<String>,
}

impl ListObject {
    /// Entry describing a blob with the given attributes.
    #[must_use]
    pub fn blob(key: impl Into<String>, attrs: &Attributes) -> Self {
        Self {
            key: key.into(),
            is_dir: false,
            size: attrs.size,
            mod_time: Some(attrs.mod_time),
            md5: attrs.md5.clone(),
        }
    }

    /// Entry describing a common prefix.
    #[must_use]
    pub fn dir(prefix: impl Into<String>) -> Self {
        Self {
            key: prefix.into(),
            is_dir: true,
            size: 0,
            mod_time: None,
            md5: None,
        }
    }

    /// Attribute snapshot for blob entries; `None` for directories.
    #[must_use]
    pub fn attributes(&self) -> Option<Attributes> {
        if self.is_dir {
            return None;
        }
        Some(Attributes {
            size: self.size,
            mod_time: self.mod_time.unwrap_or_default(),
            md5: self.md5.clone(),
            content_type: None,
        })
    }
}

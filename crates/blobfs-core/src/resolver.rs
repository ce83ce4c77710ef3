//! Metadata resolution: is a name a blob, a virtual directory, or nothing?
//!
//! Object stores only know flat keys, so a directory exists exactly when at
//! least one key lives below `name/`. Resolution tries the exact key first
//! and falls back to a one-entry probe listing.

use blobfs_store::{Attributes, DELIMITER, ListOptions, ObjectStore, StoreResult};
use tracing::debug;

/// Outcome of resolving a name against a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A blob is stored under exactly this key.
    Blob(Attributes),
    /// At least one key is stored below `name/`.
    Directory,
    /// Neither.
    Missing,
}

/// Resolve `name` against `bucket`.
///
/// The empty name is the root and always resolves to a directory. Attribute
/// lookup errors other than "not found" are returned unchanged; any failure
/// of the directory probe resolves to [`Resolution::Missing`].
///
/// # Examples
///
/// ```
/// use blobfs_core::resolver::{Resolution, resolve};
/// use blobfs_store::MemoryBucket;
/// use bytes::Bytes;
///
/// # tokio_test::block_on(async {
/// let bucket = MemoryBucket::default();
/// bucket.write("dir/child", Bytes::from("x")).await.unwrap();
///
/// assert_eq!(resolve(&bucket, "dir").await.unwrap(), Resolution::Directory);
/// assert_eq!(resolve(&bucket, "nope").await.unwrap(), Resolution::Missing);
/// # });
/// ```
pub async fn resolve(bucket: &dyn ObjectStore, name: &str) -> StoreResult<Resolution> {
    if name.is_empty() {
        return Ok(Resolution::Directory);
    }

    match bucket.attributes(name).await {
        Ok(attrs) => return Ok(Resolution::Blob(attrs)),
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e),
    }

    let prefix = dir_prefix(name);
    let mut probe = bucket.list(ListOptions::new(prefix.as_str(), DELIMITER));
    match probe.next().await {
        Ok(Some(_)) => Ok(Resolution::Directory),
        Ok(None) => Ok(Resolution::Missing),
        Err(e) => {
            debug!(name, prefix = %prefix, error = %e, "directory probe failed");
            Ok(Resolution::Missing)
        }
    }
}

/// Listing prefix for the children of `name`: the name with exactly one
/// trailing delimiter, or the empty prefix for the root.
pub(crate) fn dir_prefix(name: &str) -> String {
    if name.is_empty() || name.ends_with(DELIMITER) {
        name.to_owned()
    } else {
        format!("{name}{DELIMITER}")
    }
}

//! Content digests recorded with stored blobs.

use md5::{Digest, Md5};

/// Compute the hex-encoded MD5 digest of `data`.
///
/// # Examples
///
/// ```
/// use blobfs_store::checksums::compute_md5;
///
/// assert_eq!(compute_md5(b"foo"), "acbd18db4cc2f85cedef654fccc4a4d8");
/// ```
#[must_use]
pub fn compute_md5(data: &[u8]) -> String {
    let hash = Md5::digest(data);
    hex::encode(hash)
}

/// Quoted form of an MD5 digest, suitable for an HTTP `ETag` header.
///
/// # Examples
///
/// ```
/// use blobfs_store::checksums::quoted_etag;
///
/// assert_eq!(quoted_etag("abc"), "\"abc\"");
/// ```
#[must_use]
pub fn quoted_etag(md5_hex: &str) -> String {
    format!("\"{md5_hex}\"")
}

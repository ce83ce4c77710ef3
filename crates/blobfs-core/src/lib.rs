//! Read-only hierarchical filesystem over an object-store bucket.
//!
//! Object stores hold flat keys. blobfs presents them as a tree: a key is a
//! file, and any prefix ending at a `/` that has at least one key below it is
//! a directory. Handles support `stat`, batched `readdir`, and seekable reads
//! implemented by re-opening range streams.
//!
//! # Architecture
//!
//! ```text
//! BlobFileSystem::open(path)
//!        |
//!        v
//!     BlobFile ----- stat ------> resolver  (attributes, then 1-entry probe)
//!        |  \------- readdir ---> readdir   (delimiter listing cursor)
//!        |  \------- read/seek -> reader    (range stream, reopened per seek)
//!        v
//!   dyn ObjectStore (blobfs-store)
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use blobfs_core::BlobFileSystem;
//! use blobfs_store::MemoryBucket;
//! use bytes::Bytes;
//!
//! # tokio_test::block_on(async {
//! let bucket = MemoryBucket::default();
//! bucket.write("biz/fuz", Bytes::from("fuz")).await.unwrap();
//!
//! let fs = BlobFileSystem::new(Arc::new(bucket));
//! let mut root = fs.open("/");
//! let listing = root.readdir(0).await.unwrap();
//! assert_eq!(listing.names().collect::<Vec<_>>(), ["biz"]);
//! assert!(listing.entries[0].is_dir());
//! # });
//! ```

pub mod config;
pub mod error;
pub mod file;
pub mod fileinfo;
pub mod filesystem;
pub mod readdir;
pub mod reader;
pub mod resolver;

#[cfg(test)]
mod testing;

pub use config::BlobFsConfig;
pub use error::{BlobFsError, BlobFsResult};
pub use file::BlobFile;
pub use fileinfo::{FileInfo, FileKind};
pub use filesystem::BlobFileSystem;
pub use readdir::DirEntries;
pub use reader::Whence;

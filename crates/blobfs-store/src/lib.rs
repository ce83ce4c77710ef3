//! Object-store capability set consumed by blobfs, plus an in-memory bucket.
//!
//! blobfs only ever needs three primitives from a bucket: an attribute lookup,
//! a prefix + delimiter listing, and a forward-only range read. This crate
//! defines those primitives as the object-safe [`ObjectStore`] and
//! [`ListCursor`] traits and ships [`MemoryBucket`], a thread-safe in-memory
//! implementation used by tests and the demo server.
//!
//! # Architecture
//!
//! ```text
//! blobfs-core (BlobFileSystem / BlobFile)
//!        |
//!        v
//!   ObjectStore (attributes, list, open_range)
//!        |
//!        v
//!   MemoryBucket (sorted key index + in-memory/spillover bodies)
//! ```

pub mod checksums;
pub mod error;
pub mod memory;
pub mod store;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryBucket;
pub use store::{ByteStream, ListCursor, ObjectStore};
pub use types::{Attributes, ListObject, ListOptions};

/// Separator used to derive virtual directories from flat keys.
pub const DELIMITER: &str = "/";

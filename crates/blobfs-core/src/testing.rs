//! Store wrapper that injects failures, for unit tests.

use std::time::Duration;

use async_trait::async_trait;
use blobfs_store::{
    Attributes, ByteStream, ListCursor, ListObject, ListOptions, MemoryBucket, ObjectStore,
    StoreError, StoreResult,
};

/// Failure injected by [`FaultyStore`].
#[derive(Debug, Clone, Copy)]
pub(crate) enum Fault {
    /// Every attribute lookup fails with an internal error.
    Attributes,
    /// Listings fail after yielding this many entries.
    ListAfter(usize),
    /// Every attribute lookup sleeps this long first.
    SlowAttributes(Duration),
}

/// [`MemoryBucket`] wrapper applying one [`Fault`].
#[derive(Debug)]
pub(crate) struct FaultyStore {
    inner: MemoryBucket,
    fault: Option<Fault>,
}

impl FaultyStore {
    pub(crate) fn new(inner: MemoryBucket) -> Self {
        Self { inner, fault: None }
    }

    pub(crate) fn with(mut self, fault: Fault) -> Self {
        self.fault = Some(fault);
        self
    }
}

#[async_trait]
impl ObjectStore for FaultyStore {
    async fn attributes(&self, key: &str) -> StoreResult<Attributes> {
        match self.fault {
            Some(Fault::Attributes) => Err(StoreError::Internal(anyhow::anyhow!(
                "injected attribute failure for {key}"
            ))),
            Some(Fault::SlowAttributes(delay)) => {
                tokio::time::sleep(delay).await;
                self.inner.attributes(key).await
            }
            _ => self.inner.attributes(key).await,
        }
    }

    fn list(&self, options: ListOptions) -> Box<dyn ListCursor> {
        let cursor = self.inner.list(options);
        match self.fault {
            Some(Fault::ListAfter(limit)) => Box::new(FailingCursor {
                inner: cursor,
                remaining: limit,
            }),
            _ => cursor,
        }
    }

    async fn open_range(
        &self,
        key: &str,
        offset: u64,
        length: Option<u64>,
    ) -> StoreResult<ByteStream> {
        self.inner.open_range(key, offset, length).await
    }
}

struct FailingCursor {
    inner: Box<dyn ListCursor>,
    remaining: usize,
}

#[async_trait]
impl ListCursor for FailingCursor {
    async fn next(&mut self) -> StoreResult<Option<ListObject>> {
        if self.remaining == 0 {
            return Err(StoreError::Internal(anyhow::anyhow!("injected listing failure")));
        }
        self.remaining -= 1;
        self.inner.next().await
    }
}

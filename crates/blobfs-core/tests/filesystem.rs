//! End-to-end behaviour of `BlobFileSystem` over an in-memory bucket.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use blobfs_core::{BlobFileSystem, BlobFsConfig, BlobFsError, Whence};
use blobfs_store::{
    Attributes, ByteStream, ListCursor, ListOptions, MemoryBucket, ObjectStore, StoreError,
    StoreResult,
};
use bytes::Bytes;

async fn seed(bucket: &MemoryBucket, entries: &[(&str, &str)]) {
    for (key, body) in entries {
        bucket
            .write(key, Bytes::from(body.to_string()))
            .await
            .unwrap_or_else(|e| panic!("write {key} failed: {e}"));
    }
}

async fn scenario() -> BlobFileSystem {
    let bucket = MemoryBucket::default();
    seed(&bucket, &[("foo", "foo"), ("bar", "bar"), ("biz/fuz", "fuz")]).await;
    BlobFileSystem::new(Arc::new(bucket))
}

/// Store whose attribute lookups always fail with a non-"not found" error.
#[derive(Debug)]
struct BrokenAttributes(MemoryBucket);

#[async_trait]
impl ObjectStore for BrokenAttributes {
    async fn attributes(&self, _key: &str) -> StoreResult<Attributes> {
        Err(StoreError::Internal(anyhow::anyhow!("permission denied")))
    }

    fn list(&self, options: ListOptions) -> Box<dyn ListCursor> {
        self.0.list(options)
    }

    async fn open_range(
        &self,
        key: &str,
        offset: u64,
        length: Option<u64>,
    ) -> StoreResult<ByteStream> {
        self.0.open_range(key, offset, length).await
    }
}

/// Store whose attribute lookups take longer than any sane deadline.
#[derive(Debug)]
struct SlowStore(MemoryBucket);

#[async_trait]
impl ObjectStore for SlowStore {
    async fn attributes(&self, key: &str) -> StoreResult<Attributes> {
        tokio::time::sleep(Duration::from_millis(300)).await;
        self.0.attributes(key).await
    }

    fn list(&self, options: ListOptions) -> Box<dyn ListCursor> {
        self.0.list(options)
    }

    async fn open_range(
        &self,
        key: &str,
        offset: u64,
        length: Option<u64>,
    ) -> StoreResult<ByteStream> {
        self.0.open_range(key, offset, length).await
    }
}

#[tokio::test]
async fn test_should_list_root_in_key_order() {
    let fs = scenario().await;
    let mut root = fs.open("/");

    let listing = root.readdir(0).await.expect("readdir");
    assert_eq!(listing.names().collect::<Vec<_>>(), ["bar", "biz", "foo"]);
    assert!(!listing.end_of_listing);

    let flags: Vec<bool> = listing.entries.iter().map(|e| e.is_dir()).collect();
    assert_eq!(flags, [false, true, false]);
    assert_eq!(listing.entries[0].size(), 3);
}

#[tokio::test]
async fn test_should_read_whole_blob() {
    let fs = scenario().await;
    let mut file = fs.open("/foo");

    let mut data = Vec::new();
    file.read_to_end(&mut data).await.expect("read_to_end");
    assert_eq!(data, b"foo");
    file.close().expect("close");
}

#[tokio::test]
async fn test_should_seek_from_each_origin() {
    let fs = scenario().await;
    let mut file = fs.open("/foo");

    assert_eq!(file.seek(1, Whence::Start).await.expect("seek"), 1);
    let mut data = Vec::new();
    file.read_to_end(&mut data).await.expect("read");
    assert_eq!(data, b"oo");

    assert_eq!(file.seek(2, Whence::End).await.expect("seek"), 1);
    data.clear();
    file.read_to_end(&mut data).await.expect("read");
    assert_eq!(data, b"oo");

    assert_eq!(file.seek(100, Whence::Start).await.expect("seek"), 3);
    data.clear();
    file.read_to_end(&mut data).await.expect("read");
    assert!(data.is_empty());
}

#[tokio::test]
async fn test_should_match_relative_and_absolute_seeks() {
    let bucket = MemoryBucket::default();
    let content = "the quick brown fox";
    seed(&bucket, &[("fox.txt", content)]).await;
    let fs = BlobFileSystem::new(Arc::new(bucket));

    let len = i64::try_from(content.len()).expect("length fits");
    for k in 0..=len {
        for n in [-3_i64, 0, 2, 5] {
            let mut relative = fs.open("fox.txt");
            relative.seek(k, Whence::Start).await.expect("seek start");
            let via_current = relative.seek(n, Whence::Current).await.expect("seek current");

            let mut absolute = fs.open("fox.txt");
            let direct = absolute
                .seek((k + n).clamp(0, len), Whence::Start)
                .await
                .expect("seek absolute");
            assert_eq!(via_current, direct, "k={k} n={n}");
        }

        let mut from_end = fs.open("fox.txt");
        let offset = from_end.seek(k, Whence::End).await.expect("seek end");
        assert_eq!(offset, u64::try_from(len - k).expect("non-negative"));

        let mut tail = Vec::new();
        from_end.read_to_end(&mut tail).await.expect("read");
        let start = usize::try_from(len - k).expect("non-negative");
        assert_eq!(tail, &content.as_bytes()[start..]);
    }
}

#[tokio::test]
async fn test_should_read_in_small_chunks() {
    let fs = scenario().await;
    let mut file = fs.open("biz/fuz");

    let mut collected = Vec::new();
    let mut buf = [0u8; 1];
    loop {
        let n = file.read(&mut buf).await.expect("read");
        if n == 0 {
            break;
        }
        collected.extend_from_slice(&buf[..n]);
    }
    assert_eq!(collected, b"fuz");
    assert_eq!(file.offset(), 3);
}

#[tokio::test]
async fn test_should_stat_blob() {
    let fs = scenario().await;
    let info = fs.open("/foo").stat().await.expect("stat");
    assert_eq!(info.name(), "foo");
    assert!(!info.is_dir());
    assert_eq!(info.size(), 3);
    assert!(info.mod_time().is_some());
}

#[tokio::test]
async fn test_should_stat_virtual_directory() {
    let fs = scenario().await;
    for path in ["/biz", "/biz/", "biz"] {
        let info = fs.open(path).stat().await.expect("stat");
        assert_eq!(info.name(), "biz", "path {path}");
        assert!(info.is_dir());
        assert_eq!(info.size(), 0);
        assert!(info.mod_time().is_none());
    }
}

#[tokio::test]
async fn test_should_report_not_exist_for_unknown_path() {
    let fs = scenario().await;

    let err = fs.open("/some_random_path").stat().await.expect_err("stat");
    assert!(err.is_not_exist());

    let mut buf = [0u8; 4];
    let err = fs
        .open("/some_random_path")
        .read(&mut buf)
        .await
        .expect_err("read");
    assert!(err.is_not_exist());

    let err = fs
        .open("/some_random_path")
        .seek(0, Whence::Start)
        .await
        .expect_err("seek");
    assert!(matches!(err, BlobFsError::NotExist { ref name } if name == "some_random_path"));
}

#[tokio::test]
async fn test_should_page_bounded_readdir() {
    let fs = scenario().await;

    let mut root = fs.open("/");
    let first = root.readdir(1).await.expect("readdir");
    assert_eq!(first.names().collect::<Vec<_>>(), ["bar"]);
    assert!(!first.end_of_listing);

    let rest = root.readdir(4).await.expect("readdir");
    assert_eq!(rest.names().collect::<Vec<_>>(), ["biz", "foo"]);
    assert!(rest.end_of_listing);

    let mut root = fs.open("/");
    let all = root.readdir(4).await.expect("readdir");
    assert_eq!(all.len(), 3);
    assert!(all.end_of_listing);
}

#[tokio::test]
async fn test_should_list_directory_children_only() {
    let bucket = MemoryBucket::default();
    seed(
        &bucket,
        &[("biz/fuz", "fuz"), ("biz/deep/er", "x"), ("bizarre", "y")],
    )
    .await;
    let fs = BlobFileSystem::new(Arc::new(bucket));

    let listing = fs.open("/biz").readdir(0).await.expect("readdir");
    assert_eq!(listing.names().collect::<Vec<_>>(), ["deep", "fuz"]);
    assert!(listing.entries[0].is_dir());
    assert!(!listing.entries[1].is_dir());
}

#[tokio::test]
async fn test_should_list_across_store_pages() {
    let bucket = MemoryBucket::with_page_size(MemoryBucket::default_max_memory_size(), 2);
    let keys: Vec<String> = (0..7).map(|i| format!("dir/file-{i}")).collect();
    for key in &keys {
        bucket
            .write(key, Bytes::from_static(b"x"))
            .await
            .expect("write");
    }
    let fs = BlobFileSystem::new(Arc::new(bucket));

    let mut dir = fs.open("dir");
    let mut names = Vec::new();
    loop {
        let batch = dir.readdir(3).await.expect("readdir");
        names.extend(batch.names().map(str::to_owned));
        if batch.end_of_listing {
            break;
        }
    }
    let expected: Vec<String> = (0..7).map(|i| format!("file-{i}")).collect();
    assert_eq!(names, expected);
}

#[tokio::test]
async fn test_should_treat_empty_bucket_root_as_directory() {
    let fs = BlobFileSystem::new(Arc::new(MemoryBucket::default()));
    let mut root = fs.open("/");

    let info = root.stat().await.expect("stat");
    assert!(info.is_dir());
    assert_eq!(info.name(), "");

    let listing = root.readdir(5).await.expect("readdir");
    assert!(listing.is_empty());
    assert!(listing.end_of_listing);
}

#[tokio::test]
async fn test_should_close_never_used_handle() {
    let fs = scenario().await;
    fs.open("/foo").close().expect("close");
    fs.open("/nothing/here").close().expect("close");
}

#[tokio::test]
async fn test_should_propagate_attribute_errors() {
    let bucket = MemoryBucket::default();
    seed(&bucket, &[("foo", "foo")]).await;
    let fs = BlobFileSystem::new(Arc::new(BrokenAttributes(bucket)));

    let err = fs.open("foo").stat().await.expect_err("stat");
    assert!(!err.is_not_exist());
    assert!(matches!(err, BlobFsError::Store(StoreError::Internal(_))));
    assert!(err.to_string().contains("permission denied"));
}

#[tokio::test]
async fn test_should_time_out_slow_store_calls() {
    let bucket = MemoryBucket::default();
    seed(&bucket, &[("foo", "foo")]).await;
    let store: Arc<dyn ObjectStore> = Arc::new(SlowStore(bucket));

    let bounded = BlobFileSystem::with_config(
        Arc::clone(&store),
        BlobFsConfig::builder()
            .request_timeout(Duration::from_millis(20))
            .build(),
    );
    let err = bounded.open("foo").stat().await.expect_err("stat");
    assert!(matches!(err, BlobFsError::Timeout { operation: "stat", .. }));

    let unbounded = BlobFileSystem::new(store);
    let info = unbounded.open("foo").stat().await.expect("stat");
    assert_eq!(info.size(), 3);
}

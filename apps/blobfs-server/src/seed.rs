//! Populating the in-memory bucket at startup.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blobfs_store::MemoryBucket;
use bytes::Bytes;
use tracing::{debug, info};

/// Small tree served when no seed directory is configured.
const DEMO_TREE: &[(&str, &str)] = &[("foo", "foo"), ("bar", "bar"), ("biz/fuz", "fuz")];

/// Write the demo tree into `bucket`.
pub async fn seed_demo(bucket: &MemoryBucket) -> Result<usize> {
    for (key, body) in DEMO_TREE {
        bucket
            .write(key, Bytes::from_static(body.as_bytes()))
            .await
            .with_context(|| format!("failed to seed {key}"))?;
    }
    info!(count = DEMO_TREE.len(), "seeded demo tree");
    Ok(DEMO_TREE.len())
}

/// Copy every regular file under `root` into `bucket`, keyed by its
/// `/`-separated path relative to `root`.
pub async fn seed_from_dir(bucket: &MemoryBucket, root: &Path) -> Result<usize> {
    let mut pending: Vec<PathBuf> = vec![root.to_path_buf()];
    let mut count = 0;

    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("failed to read directory {}", dir.display()))?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(path);
                continue;
            }
            if !file_type.is_file() {
                continue;
            }

            let key = object_key(root, &path)?;
            let data = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let content_type = mime_guess::from_path(&path).first().map(|m| m.to_string());

            bucket
                .write_with_content_type(&key, Bytes::from(data), content_type.as_deref())
                .await
                .with_context(|| format!("failed to store {key}"))?;
            debug!(key = %key, "seeded file");
            count += 1;
        }
    }

    info!(root = %root.display(), count, "seeded bucket from directory");
    Ok(count)
}

fn object_key(root: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .with_context(|| format!("{} is outside {}", path.display(), root.display()))?;
    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(segments.join("/"))
}

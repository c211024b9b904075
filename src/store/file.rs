// src/store/file.rs
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{validate_key, Store, StoreError, StoreReader};

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// One file per key under `base_dir`, named exactly like the key.
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Open (and create if missing) the store directory.
    pub async fn open(base_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).await?;
        tracing::debug!(dir = %base_dir.display(), "file store opened");
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.base_dir.join(key))
    }

    fn tmp_path_for(&self, key: &str) -> PathBuf {
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        self.base_dir
            .join(format!(".{key}.{}.{seq}.tmp", std::process::id()))
    }
}

/// Write `value` to `path` and flush it to disk before returning.
async fn write_synced(path: &Path, value: &[u8]) -> std::io::Result<()> {
    let mut f = fs::File::create(path).await?;
    f.write_all(value).await?;
    f.sync_all().await
}

#[async_trait]
impl Store for FileStore {
    async fn has_key(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        // Rename is atomic within a directory; readers see old or new, never partial.
        let tmp = self.tmp_path_for(key);
        // Synced before the rename so a crash never leaves an empty key behind.
        if let Err(e) = write_synced(&tmp, value).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<StoreReader, StoreError> {
        let path = self.path_for(key)?;
        match fs::File::open(&path).await {
            Ok(f) => Ok(Box::pin(f)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

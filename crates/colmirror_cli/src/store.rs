//! File-backed cache store.

use async_trait::async_trait;
use colmirror_engine::{
    CacheError, CacheResult, CacheSnapshot, CacheStore, MemoryCache, NonFatalError,
};
use colmirror_protocol::{AccountId, Collection, CollectionMeta, Item, SyncToken};
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// Returns the cache file of an account inside a state directory.
pub fn cache_path(state_dir: &Path, account: &AccountId) -> PathBuf {
    state_dir.join(format!("{account}.json"))
}

/// A cache kept in memory and written to a JSON file after every mutation.
///
/// Writes go to a temporary file that is then renamed over the cache file,
/// so a crash leaves either the old or the new content on disk.
pub struct FileCache {
    path: PathBuf,
    inner: MemoryCache,
    save_lock: Mutex<()>,
}

impl FileCache {
    /// Opens the cache at `path`, starting empty if the file does not exist.
    pub async fn open(path: impl Into<PathBuf>) -> CacheResult<Self> {
        let path = path.into();
        let snapshot = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| CacheError::Serialization(e.to_string()))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => CacheSnapshot::default(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), "opened cache file");

        Ok(Self {
            path,
            inner: MemoryCache::from_snapshot(snapshot),
            save_lock: Mutex::new(()),
        })
    }

    /// Path of the cache file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a copy of the current content.
    pub fn snapshot(&self) -> CacheSnapshot {
        self.inner.snapshot()
    }

    async fn save(&self) -> CacheResult<()> {
        let _lock = self.save_lock.lock().await;
        let bytes = serde_json::to_vec_pretty(&self.inner.snapshot())
            .map_err(|e| CacheError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, bytes).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CacheStore for FileCache {
    async fn upsert_collection(
        &self,
        collection: &Collection,
        meta: &CollectionMeta,
    ) -> CacheResult<()> {
        self.inner.upsert_collection(collection, meta).await?;
        self.save().await
    }

    async fn evict_collection(&self, uid: &str) -> CacheResult<()> {
        self.inner.evict_collection(uid).await?;
        self.save().await
    }

    async fn upsert_items(&self, collection_uid: &str, items: &[Item]) -> CacheResult<()> {
        self.inner.upsert_items(collection_uid, items).await?;
        self.save().await
    }

    async fn general_token(&self) -> CacheResult<Option<SyncToken>> {
        self.inner.general_token().await
    }

    async fn set_general_token(&self, token: Option<&SyncToken>) -> CacheResult<()> {
        self.inner.set_general_token(token).await?;
        self.save().await
    }

    async fn collection_token(&self, uid: &str) -> CacheResult<Option<SyncToken>> {
        self.inner.collection_token(uid).await
    }

    async fn set_collection_token(
        &self,
        uid: &str,
        token: Option<&SyncToken>,
    ) -> CacheResult<()> {
        self.inner.set_collection_token(uid, token).await?;
        self.save().await
    }

    async fn record_non_fatal_error(&self, error: NonFatalError) -> CacheResult<()> {
        self.inner.record_non_fatal_error(error).await?;
        self.save().await
    }
}

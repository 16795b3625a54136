//! Local cache store abstraction.
//!
//! The sync engine never reasons about how the cache stores its data. It
//! only calls the idempotent mutations and the cursor accessors of
//! [`CacheStore`]; cursors live next to the data they describe so a store
//! can persist both together.

use crate::error::{CacheError, CacheResult, NonFatalError};
use async_trait::async_trait;
use colmirror_protocol::{Collection, CollectionMeta, Item, SyncToken};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Mutation and cursor API of the local cache.
///
/// Every mutation must be idempotent. A batch passed to
/// [`CacheStore::upsert_items`] must become visible all at once.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Inserts or replaces a collection.
    async fn upsert_collection(
        &self,
        collection: &Collection,
        meta: &CollectionMeta,
    ) -> CacheResult<()>;

    /// Removes a collection, its items and its cursor.
    async fn evict_collection(&self, uid: &str) -> CacheResult<()>;

    /// Applies one page of items of a collection as a single batch.
    async fn upsert_items(&self, collection_uid: &str, items: &[Item]) -> CacheResult<()>;

    /// Reads the collection-list cursor.
    async fn general_token(&self) -> CacheResult<Option<SyncToken>>;

    /// Writes the collection-list cursor.
    async fn set_general_token(&self, token: Option<&SyncToken>) -> CacheResult<()>;

    /// Reads the item cursor of a collection.
    async fn collection_token(&self, uid: &str) -> CacheResult<Option<SyncToken>>;

    /// Writes the item cursor of a collection.
    async fn set_collection_token(&self, uid: &str, token: Option<&SyncToken>)
        -> CacheResult<()>;

    /// Appends to the queue of errors shown to the user later.
    async fn record_non_fatal_error(&self, error: NonFatalError) -> CacheResult<()>;
}

/// A cached collection with its decoded metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedCollection {
    /// Collection record as last listed.
    pub collection: Collection,
    /// Decoded metadata.
    pub meta: CollectionMeta,
}

/// The full content of a cache, in a serializable form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSnapshot {
    /// Cached collections by uid. Remotely deleted collections are kept
    /// with their `deleted` flag set.
    pub collections: BTreeMap<String, CachedCollection>,
    /// Live items by collection uid, then item uid.
    pub items: BTreeMap<String, BTreeMap<String, Item>>,
    /// Collection-list cursor.
    pub general_token: Option<SyncToken>,
    /// Item cursors by collection uid.
    pub collection_tokens: BTreeMap<String, SyncToken>,
    /// Queued non-fatal errors, oldest first.
    pub non_fatal_errors: Vec<NonFatalError>,
}

impl CacheSnapshot {
    /// Iterates over collections that are not deleted.
    pub fn live_collections(&self) -> impl Iterator<Item = &CachedCollection> {
        self.collections
            .values()
            .filter(|cached| !cached.collection.deleted)
    }

    /// Returns the number of live items of a collection.
    pub fn item_count(&self, collection_uid: &str) -> usize {
        self.items.get(collection_uid).map_or(0, BTreeMap::len)
    }

    fn upsert_collection(&mut self, collection: &Collection, meta: &CollectionMeta) {
        self.collections.insert(
            collection.uid.clone(),
            CachedCollection {
                collection: collection.clone(),
                meta: meta.clone(),
            },
        );
    }

    fn evict_collection(&mut self, uid: &str) {
        self.collections.remove(uid);
        self.items.remove(uid);
        self.collection_tokens.remove(uid);
    }

    fn upsert_items(&mut self, collection_uid: &str, items: &[Item]) {
        let cached = self.items.entry(collection_uid.to_string()).or_default();
        for item in items {
            if item.deleted {
                cached.remove(&item.uid);
            } else {
                cached.insert(item.uid.clone(), item.clone());
            }
        }
    }

    fn set_collection_token(&mut self, uid: &str, token: Option<&SyncToken>) {
        match token {
            Some(token) => {
                self.collection_tokens.insert(uid.to_string(), token.clone());
            }
            None => {
                self.collection_tokens.remove(uid);
            }
        }
    }
}

/// A mutation applied to a [`MemoryCache`], in application order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// A collection was upserted.
    CollectionUpserted(String),
    /// A collection was evicted.
    CollectionEvicted(String),
    /// A batch of items was applied to a collection.
    ItemsUpserted {
        /// Collection uid.
        collection: String,
        /// Number of items in the batch.
        count: usize,
    },
    /// The collection-list cursor was written.
    GeneralTokenSet(Option<SyncToken>),
    /// An item cursor was written.
    CollectionTokenSet(String, Option<SyncToken>),
    /// A non-fatal error was queued.
    NonFatalErrorRecorded,
}

/// An in-memory cache store.
///
/// Keeps a journal of applied mutations so tests can assert on ordering.
#[derive(Debug, Default)]
pub struct MemoryCache {
    state: RwLock<CacheSnapshot>,
    journal: RwLock<Vec<CacheEvent>>,
    fail_item_batches: AtomicBool,
}

impl MemoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache holding a previously saved snapshot.
    pub fn from_snapshot(snapshot: CacheSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
            ..Self::default()
        }
    }

    /// Returns a copy of the current content.
    pub fn snapshot(&self) -> CacheSnapshot {
        self.state.read().clone()
    }

    /// Returns the mutations applied so far.
    pub fn journal(&self) -> Vec<CacheEvent> {
        self.journal.read().clone()
    }

    /// Clears the mutation journal.
    pub fn clear_journal(&self) {
        self.journal.write().clear();
    }

    /// Makes every following item batch fail with a backend error.
    pub fn set_fail_item_batches(&self, fail: bool) {
        self.fail_item_batches.store(fail, Ordering::SeqCst);
    }

    /// Returns the queued non-fatal errors.
    pub fn non_fatal_errors(&self) -> Vec<NonFatalError> {
        self.state.read().non_fatal_errors.clone()
    }

    fn log(&self, event: CacheEvent) {
        self.journal.write().push(event);
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn upsert_collection(
        &self,
        collection: &Collection,
        meta: &CollectionMeta,
    ) -> CacheResult<()> {
        self.state.write().upsert_collection(collection, meta);
        self.log(CacheEvent::CollectionUpserted(collection.uid.clone()));
        Ok(())
    }

    async fn evict_collection(&self, uid: &str) -> CacheResult<()> {
        self.state.write().evict_collection(uid);
        self.log(CacheEvent::CollectionEvicted(uid.to_string()));
        Ok(())
    }

    async fn upsert_items(&self, collection_uid: &str, items: &[Item]) -> CacheResult<()> {
        if self.fail_item_batches.load(Ordering::SeqCst) {
            return Err(CacheError::Backend(format!(
                "refusing item batch for {collection_uid}"
            )));
        }
        self.state.write().upsert_items(collection_uid, items);
        self.log(CacheEvent::ItemsUpserted {
            collection: collection_uid.to_string(),
            count: items.len(),
        });
        Ok(())
    }

    async fn general_token(&self) -> CacheResult<Option<SyncToken>> {
        Ok(self.state.read().general_token.clone())
    }

    async fn set_general_token(&self, token: Option<&SyncToken>) -> CacheResult<()> {
        self.state.write().general_token = token.cloned();
        self.log(CacheEvent::GeneralTokenSet(token.cloned()));
        Ok(())
    }

    async fn collection_token(&self, uid: &str) -> CacheResult<Option<SyncToken>> {
        Ok(self.state.read().collection_tokens.get(uid).cloned())
    }

    async fn set_collection_token(
        &self,
        uid: &str,
        token: Option<&SyncToken>,
    ) -> CacheResult<()> {
        self.state.write().set_collection_token(uid, token);
        self.log(CacheEvent::CollectionTokenSet(uid.to_string(), token.cloned()));
        Ok(())
    }

    async fn record_non_fatal_error(&self, error: NonFatalError) -> CacheResult<()> {
        self.state.write().non_fatal_errors.push(error);
        self.log(CacheEvent::NonFatalErrorRecorded);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colmirror_protocol::{AccountId, RemoteError};

    fn meta() -> CollectionMeta {
        CollectionMeta::new("etebase.md.note", "Notes")
    }

    #[tokio::test]
    async fn items_are_replaced_and_tombstones_removed() {
        let cache = MemoryCache::new();
        cache
            .upsert_items(
                "c1",
                &[
                    Item::new("a", "1", b"one".to_vec()),
                    Item::new("b", "2", b"two".to_vec()),
                ],
            )
            .await
            .unwrap();
        cache
            .upsert_items(
                "c1",
                &[Item::new("a", "3", b"uno".to_vec()), Item::tombstone("b", "4")],
            )
            .await
            .unwrap();

        let snapshot = cache.snapshot();
        assert_eq!(snapshot.item_count("c1"), 1);
        assert_eq!(snapshot.items["c1"]["a"].content, b"uno");
    }

    #[tokio::test]
    async fn eviction_drops_items_and_cursor() {
        let cache = MemoryCache::new();
        let collection = Collection::new("c1", "1");
        cache.upsert_collection(&collection, &meta()).await.unwrap();
        cache
            .upsert_items("c1", &[Item::new("a", "2", vec![])])
            .await
            .unwrap();
        cache
            .set_collection_token("c1", Some(&SyncToken::new("2")))
            .await
            .unwrap();

        cache.evict_collection("c1").await.unwrap();

        let snapshot = cache.snapshot();
        assert!(snapshot.collections.is_empty());
        assert_eq!(snapshot.item_count("c1"), 0);
        assert_eq!(cache.collection_token("c1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn deleted_collections_are_not_live() {
        let cache = MemoryCache::new();
        let mut collection = Collection::new("c1", "1");
        collection.deleted = true;
        cache.upsert_collection(&collection, &meta()).await.unwrap();

        let snapshot = cache.snapshot();
        assert_eq!(snapshot.collections.len(), 1);
        assert_eq!(snapshot.live_collections().count(), 0);
    }

    #[tokio::test]
    async fn journal_and_failure_injection() {
        let cache = MemoryCache::new();
        cache
            .set_general_token(Some(&SyncToken::new("5")))
            .await
            .unwrap();
        cache
            .record_non_fatal_error(NonFatalError::from_remote(
                &AccountId::from("alice"),
                &RemoteError::permission_denied("no"),
            ))
            .await
            .unwrap();

        cache.set_fail_item_batches(true);
        assert!(cache.upsert_items("c1", &[]).await.is_err());

        assert_eq!(
            cache.journal(),
            vec![
                CacheEvent::GeneralTokenSet(Some(SyncToken::new("5"))),
                CacheEvent::NonFatalErrorRecorded,
            ]
        );
        assert_eq!(cache.non_fatal_errors().len(), 1);
    }

    #[tokio::test]
    async fn snapshot_restores_state() {
        let cache = MemoryCache::new();
        cache
            .set_collection_token("c1", Some(&SyncToken::new("9")))
            .await
            .unwrap();

        let restored = MemoryCache::from_snapshot(cache.snapshot());
        assert_eq!(
            restored.collection_token("c1").await.unwrap(),
            Some(SyncToken::new("9"))
        );
        assert!(restored.journal().is_empty());
    }
}

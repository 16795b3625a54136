//! Remote service client abstraction.

use async_trait::async_trait;
use colmirror_protocol::{
    AccountId, Collection, CollectionListResponse, CollectionMeta, ItemListResponse, ListOptions,
    RemoteError, RemoteResult,
};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Notify;

/// Client of the remote collection/item service, bound to one account
/// session.
///
/// Implementations own encryption, authentication and transport, and map
/// every failure onto a [`colmirror_protocol::RemoteErrorKind`].
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Account this client acts for.
    fn account(&self) -> &AccountId;

    /// Lists collection changes after `options.stoken`.
    async fn list_collections(&self, options: &ListOptions)
        -> RemoteResult<CollectionListResponse>;

    /// Returns the decoded metadata of a listed collection.
    async fn collection_meta(&self, collection: &Collection) -> RemoteResult<CollectionMeta>;

    /// Lists item changes of one collection after `options.stoken`.
    async fn list_items(
        &self,
        collection: &Collection,
        options: &ListOptions,
    ) -> RemoteResult<ItemListResponse>;
}

/// A call received by [`MockRemote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    /// `list_collections` with its options.
    ListCollections(ListOptions),
    /// `collection_meta` for a collection uid.
    CollectionMeta(String),
    /// `list_items` for a collection uid with its options.
    ListItems(String, ListOptions),
}

/// A scripted remote client for testing.
///
/// Pages and errors are queued up front and served in order; every call is
/// recorded.
#[derive(Debug)]
pub struct MockRemote {
    account: AccountId,
    collection_pages: Mutex<VecDeque<RemoteResult<CollectionListResponse>>>,
    item_pages: Mutex<HashMap<String, VecDeque<RemoteResult<ItemListResponse>>>>,
    metas: Mutex<HashMap<String, CollectionMeta>>,
    calls: Mutex<Vec<RemoteCall>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl MockRemote {
    /// Creates a mock remote for an account.
    pub fn new(account: impl Into<AccountId>) -> Self {
        Self {
            account: account.into(),
            collection_pages: Mutex::new(VecDeque::new()),
            item_pages: Mutex::new(HashMap::new()),
            metas: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            gate: Mutex::new(None),
        }
    }

    /// Queues a collection page.
    pub fn push_collection_page(&self, page: CollectionListResponse) {
        self.collection_pages.lock().push_back(Ok(page));
    }

    /// Queues a failure of the collection listing.
    pub fn push_collection_error(&self, error: RemoteError) {
        self.collection_pages.lock().push_back(Err(error));
    }

    /// Queues an item page for a collection.
    pub fn push_item_page(&self, collection_uid: &str, page: ItemListResponse) {
        self.item_pages
            .lock()
            .entry(collection_uid.to_string())
            .or_default()
            .push_back(Ok(page));
    }

    /// Queues a failure of a collection's item listing.
    pub fn push_item_error(&self, collection_uid: &str, error: RemoteError) {
        self.item_pages
            .lock()
            .entry(collection_uid.to_string())
            .or_default()
            .push_back(Err(error));
    }

    /// Sets the metadata returned for a collection.
    pub fn set_meta(&self, collection_uid: &str, meta: CollectionMeta) {
        self.metas.lock().insert(collection_uid.to_string(), meta);
    }

    /// Suspends the next `list_collections` call until the returned handle
    /// is notified.
    pub fn pause_next_listing(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock() = Some(Arc::clone(&notify));
        notify
    }

    /// Returns every call received so far.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().clone()
    }

    /// Returns the number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn record(&self, call: RemoteCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl RemoteClient for MockRemote {
    fn account(&self) -> &AccountId {
        &self.account
    }

    async fn list_collections(
        &self,
        options: &ListOptions,
    ) -> RemoteResult<CollectionListResponse> {
        self.record(RemoteCall::ListCollections(options.clone()));
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.collection_pages
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::other("no scripted collection page")))
    }

    async fn collection_meta(&self, collection: &Collection) -> RemoteResult<CollectionMeta> {
        self.record(RemoteCall::CollectionMeta(collection.uid.clone()));
        self.metas
            .lock()
            .get(&collection.uid)
            .cloned()
            .ok_or_else(|| RemoteError::http(404, format!("no metadata for {}", collection.uid)))
    }

    async fn list_items(
        &self,
        collection: &Collection,
        options: &ListOptions,
    ) -> RemoteResult<ItemListResponse> {
        self.record(RemoteCall::ListItems(
            collection.uid.clone(),
            options.clone(),
        ));
        self.item_pages
            .lock()
            .get_mut(&collection.uid)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(RemoteError::other(format!(
                    "no scripted item page for {}",
                    collection.uid
                )))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colmirror_protocol::{RemoteErrorKind, SyncToken};

    #[tokio::test]
    async fn mock_remote_serves_pages_in_order() {
        let remote = MockRemote::new("alice");
        remote.push_collection_page(CollectionListResponse::new(
            vec![],
            Some(SyncToken::new("1")),
            false,
        ));
        remote.push_collection_error(RemoteError::network("offline"));

        let first = remote.list_collections(&ListOptions::default()).await.unwrap();
        assert_eq!(first.stoken, Some(SyncToken::new("1")));

        let second = remote.list_collections(&ListOptions::default()).await;
        assert_eq!(second.unwrap_err().kind, RemoteErrorKind::Network);

        assert_eq!(remote.call_count(), 2);
    }

    #[tokio::test]
    async fn mock_remote_unscripted_calls_fail() {
        let remote = MockRemote::new("alice");
        let collection = Collection::new("c1", "1");

        let err = remote.collection_meta(&collection).await.unwrap_err();
        assert_eq!(err.status, Some(404));

        let err = remote
            .list_items(&collection, &ListOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::Other);

        assert_eq!(
            remote.calls(),
            vec![
                RemoteCall::CollectionMeta("c1".into()),
                RemoteCall::ListItems("c1".into(), ListOptions::default()),
            ]
        );
    }
}

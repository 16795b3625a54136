//! Remote client adapter over an in-process reference server.

#![allow(dead_code)]

use async_trait::async_trait;
use colmirror_engine::RemoteClient;
use colmirror_protocol::{
    AccountId, Collection, CollectionListResponse, CollectionMeta, ItemListResponse, ListOptions,
    RemoteError, RemoteResult,
};
use colmirror_server::{ServerConfig, SyncServer};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const NOTE: &str = "etebase.md.note";

/// Connects one account to a shared server, with one-shot fault injection
/// on item listings.
pub struct InMemoryRemote {
    account: AccountId,
    server: Arc<SyncServer>,
    item_calls: AtomicUsize,
    item_faults: Mutex<HashMap<usize, RemoteError>>,
}

impl InMemoryRemote {
    pub fn new(server: &Arc<SyncServer>, account: &str) -> Self {
        Self {
            account: AccountId::from(account),
            server: Arc::clone(server),
            item_calls: AtomicUsize::new(0),
            item_faults: Mutex::new(HashMap::new()),
        }
    }

    /// Fails the `index`-th `list_items` call (zero based) once.
    pub fn fail_item_call(&self, index: usize, error: RemoteError) {
        self.item_faults.lock().insert(index, error);
    }

    pub fn clear_faults(&self) {
        self.item_faults.lock().clear();
    }

    pub fn item_calls(&self) -> usize {
        self.item_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteClient for InMemoryRemote {
    fn account(&self) -> &AccountId {
        &self.account
    }

    async fn list_collections(
        &self,
        options: &ListOptions,
    ) -> RemoteResult<CollectionListResponse> {
        Ok(self
            .server
            .handle_list_collections(&self.account, options)?)
    }

    async fn collection_meta(&self, collection: &Collection) -> RemoteResult<CollectionMeta> {
        Ok(self
            .server
            .handle_collection_meta(&self.account, &collection.uid)?)
    }

    async fn list_items(
        &self,
        collection: &Collection,
        options: &ListOptions,
    ) -> RemoteResult<ItemListResponse> {
        let call = self.item_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.item_faults.lock().remove(&call) {
            return Err(error);
        }
        Ok(self
            .server
            .handle_list_items(&self.account, &collection.uid, options)?)
    }
}

pub fn server() -> Arc<SyncServer> {
    Arc::new(SyncServer::new(ServerConfig::default()))
}

pub fn note_meta(name: &str) -> CollectionMeta {
    CollectionMeta::new(NOTE, name)
}

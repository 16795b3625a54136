//! Remote client backed by an in-process reference server.

use async_trait::async_trait;
use colmirror_engine::RemoteClient;
use colmirror_protocol::{
    AccountId, Collection, CollectionListResponse, CollectionMeta, ItemListResponse, ListOptions,
    RemoteResult,
};
use colmirror_server::SyncServer;
use std::sync::Arc;

/// Acts for one account against a [`SyncServer`].
pub struct ServerRemote {
    account: AccountId,
    server: Arc<SyncServer>,
}

impl ServerRemote {
    /// Creates a client for `account`.
    pub fn new(account: AccountId, server: Arc<SyncServer>) -> Self {
        Self { account, server }
    }
}

#[async_trait]
impl RemoteClient for ServerRemote {
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
        Ok(self
            .server
            .handle_list_items(&self.account, &collection.uid, options)?)
    }
}

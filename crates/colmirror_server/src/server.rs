//! Reference service facade.

use crate::changelog::ServerLog;
use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::{HandlerContext, RequestHandler};
use colmirror_protocol::{
    AccountId, CollectionListResponse, CollectionMeta, ItemListResponse, ListOptions,
};
use std::sync::Arc;

/// The reference collection/item service.
///
/// It serves paginated change listings from a shared [`ServerLog`] and is
/// meant to be driven in-process: tests and the command-line host wrap it in
/// a remote client adapter instead of talking to it over the network.
///
/// # Example
///
/// ```
/// use colmirror_protocol::{AccountId, CollectionMeta, ListOptions};
/// use colmirror_server::{ServerConfig, SyncServer};
///
/// let server = SyncServer::new(ServerConfig::default());
/// let alice = AccountId::from("alice");
/// server
///     .log()
///     .create_collection(&alice, CollectionMeta::new("etebase.md.note", "Notes"), vec![])
///     .unwrap();
///
/// let page = server
///     .handle_list_collections(&alice, &ListOptions::default())
///     .unwrap();
/// assert_eq!(page.data.len(), 1);
/// assert!(page.done);
/// ```
pub struct SyncServer {
    handler: RequestHandler,
    context: Arc<HandlerContext>,
}

impl SyncServer {
    /// Creates a server with an empty log.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_log(config, Arc::new(ServerLog::new()))
    }

    /// Creates a server over an existing log.
    pub fn with_log(config: ServerConfig, log: Arc<ServerLog>) -> Self {
        let context = Arc::new(HandlerContext::new(config, log));
        let handler = RequestHandler::new(Arc::clone(&context));

        Self { handler, context }
    }

    /// Lists collection changes for an account.
    pub fn handle_list_collections(
        &self,
        account: &AccountId,
        options: &ListOptions,
    ) -> ServerResult<CollectionListResponse> {
        self.handler.handle_list_collections(account, options)
    }

    /// Returns the metadata of a collection.
    pub fn handle_collection_meta(
        &self,
        account: &AccountId,
        uid: &str,
    ) -> ServerResult<CollectionMeta> {
        self.handler.handle_collection_meta(account, uid)
    }

    /// Lists item changes of a collection.
    pub fn handle_list_items(
        &self,
        account: &AccountId,
        uid: &str,
        options: &ListOptions,
    ) -> ServerResult<ItemListResponse> {
        self.handler.handle_list_items(account, uid, options)
    }

    /// Returns the change log, for seeding and mutating remote state.
    pub fn log(&self) -> &Arc<ServerLog> {
        &self.context.log
    }

    /// Enables or disables maintenance mode.
    pub fn set_available(&self, available: bool) {
        self.context.set_available(available);
    }

    /// Returns the current server revision.
    pub fn revision(&self) -> u64 {
        self.context.log.revision()
    }
}

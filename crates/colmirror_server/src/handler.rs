//! Request handlers for the list endpoints.

use crate::changelog::{CollectionChange, ServerLog};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use colmirror_protocol::{
    AccountId, CollectionListResponse, CollectionMeta, ItemListResponse, ListOptions,
    RemovedMembership, SyncToken,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Context for request handling.
pub struct HandlerContext {
    /// Server configuration.
    pub config: ServerConfig,
    /// Change log (shared across all handlers).
    pub log: Arc<ServerLog>,
    /// Cleared while the service is in maintenance mode.
    available: AtomicBool,
}

impl HandlerContext {
    /// Creates a new handler context.
    pub fn new(config: ServerConfig, log: Arc<ServerLog>) -> Self {
        Self {
            config,
            log,
            available: AtomicBool::new(true),
        }
    }

    /// Enables or disables maintenance mode.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Returns false while in maintenance mode.
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

/// Parses a cursor issued by this service. A missing cursor starts at zero.
fn parse_token(token: Option<&SyncToken>) -> ServerResult<u64> {
    match token {
        None => Ok(0),
        Some(token) => token
            .as_str()
            .parse()
            .map_err(|_| ServerError::InvalidToken(token.to_string())),
    }
}

/// Handler for list requests.
pub struct RequestHandler {
    context: Arc<HandlerContext>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }

    fn check_available(&self) -> ServerResult<()> {
        if self.context.is_available() {
            Ok(())
        } else {
            Err(ServerError::Unavailable)
        }
    }

    fn hide_unknown(&self, error: ServerError) -> ServerError {
        match error {
            ServerError::NotFound(what) if self.context.config.hide_unknown_collections => {
                ServerError::NotAuthorized(what)
            }
            other => other,
        }
    }

    /// Handles a collection list request.
    pub fn handle_list_collections(
        &self,
        account: &AccountId,
        options: &ListOptions,
    ) -> ServerResult<CollectionListResponse> {
        self.check_available()?;
        let since = parse_token(options.stoken.as_ref())?;
        let limit = self.context.config.clamp_limit(options.limit);

        let (changes, more) = self.context.log.collection_changes(account, since, limit);
        let stoken = changes
            .last()
            .map(|change| SyncToken::new(change.revision().to_string()))
            .or_else(|| options.stoken.clone());

        let mut page = CollectionListResponse::new(Vec::new(), stoken, !more);
        for change in changes {
            match change {
                CollectionChange::Upserted { collection, .. } => page.data.push(collection),
                CollectionChange::MembershipRemoved { uid, .. } => {
                    page.removed_memberships.push(RemovedMembership { uid })
                }
            }
        }

        debug!(
            %account,
            since,
            collections = page.data.len(),
            removed = page.removed_memberships.len(),
            done = page.done,
            "served collection page"
        );
        Ok(page)
    }

    /// Handles a collection metadata request.
    pub fn handle_collection_meta(
        &self,
        account: &AccountId,
        uid: &str,
    ) -> ServerResult<CollectionMeta> {
        self.check_available()?;
        self.context
            .log
            .collection_meta(account, uid)
            .map_err(|e| self.hide_unknown(e))
    }

    /// Handles an item list request for one collection.
    pub fn handle_list_items(
        &self,
        account: &AccountId,
        uid: &str,
        options: &ListOptions,
    ) -> ServerResult<ItemListResponse> {
        self.check_available()?;
        let since = parse_token(options.stoken.as_ref())?;
        let limit = self.context.config.clamp_limit(options.limit);

        let (items, more) = self
            .context
            .log
            .item_changes(account, uid, since, limit)
            .map_err(|e| self.hide_unknown(e))?;
        let stoken = items
            .last()
            .map(|(_, revision)| SyncToken::new(revision.to_string()))
            .or_else(|| options.stoken.clone());
        let data: Vec<_> = items.into_iter().map(|(item, _)| item).collect();

        debug!(%account, collection = uid, since, items = data.len(), done = !more, "served item page");
        Ok(ItemListResponse::new(data, stoken, !more))
    }
}

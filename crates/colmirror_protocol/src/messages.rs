//! Paginated list messages.

use crate::record::{Collection, Item};
use crate::token::SyncToken;
use crate::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};

/// Parameters of one page request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    /// Cursor to list changes after, `None` for a full listing.
    pub stoken: Option<SyncToken>,
    /// Maximum number of entries to return.
    pub limit: u32,
}

impl ListOptions {
    /// Creates a new page request.
    pub fn new(stoken: Option<SyncToken>, limit: u32) -> Self {
        Self { stoken, limit }
    }
}

impl Default for ListOptions {
    fn default() -> Self {
        Self::new(None, DEFAULT_PAGE_SIZE)
    }
}

/// A collection whose membership was revoked for the listing account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovedMembership {
    /// Uid of the collection the account lost access to.
    pub uid: String,
}

/// One page of collection changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionListResponse {
    /// New or updated collections, in server order.
    pub data: Vec<Collection>,
    /// Continuation cursor after this page.
    pub stoken: Option<SyncToken>,
    /// Whether this is the final page.
    pub done: bool,
    /// Memberships removed within this page's range.
    #[serde(default)]
    pub removed_memberships: Vec<RemovedMembership>,
}

impl CollectionListResponse {
    /// Creates a page without membership removals.
    pub fn new(data: Vec<Collection>, stoken: Option<SyncToken>, done: bool) -> Self {
        Self {
            data,
            stoken,
            done,
            removed_memberships: Vec::new(),
        }
    }

    /// Adds membership removals to the page.
    pub fn with_removed(mut self, uids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.removed_memberships
            .extend(uids.into_iter().map(|uid| RemovedMembership { uid: uid.into() }));
        self
    }
}

/// One page of item changes for a single collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemListResponse {
    /// New, updated or deleted items, in server order.
    pub data: Vec<Item>,
    /// Continuation cursor after this page.
    pub stoken: Option<SyncToken>,
    /// Whether this is the final page.
    pub done: bool,
}

impl ItemListResponse {
    /// Creates a new item page.
    pub fn new(data: Vec<Item>, stoken: Option<SyncToken>, done: bool) -> Self {
        Self { data, stoken, done }
    }
}

//! Server-side change log.

use crate::error::{ServerError, ServerResult};
use colmirror_protocol::{AccessLevel, AccountId, Collection, CollectionMeta, Item};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Membership {
    access: AccessLevel,
    /// Revision at which the account (re)gained access.
    since: u64,
}

#[derive(Debug, Clone)]
struct ItemRecord {
    content: Vec<u8>,
    deleted: bool,
    revision: u64,
    mtime: Option<u64>,
}

#[derive(Debug, Clone)]
struct CollectionRecord {
    meta: CollectionMeta,
    content: Vec<u8>,
    deleted: bool,
    revision: u64,
    /// Revision of the latest item change.
    items_revision: u64,
    members: HashMap<AccountId, Membership>,
    items: BTreeMap<String, ItemRecord>,
}

impl CollectionRecord {
    fn to_collection(&self, uid: &str, access: AccessLevel) -> Collection {
        Collection {
            uid: uid.to_string(),
            etag: self.revision.to_string(),
            deleted: self.deleted,
            access_level: access,
            content: self.content.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct Removal {
    account: AccountId,
    uid: String,
    revision: u64,
}

/// A change visible to one account when listing collections.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionChange {
    /// The collection was created, updated, deleted or shared with the account.
    Upserted {
        /// Collection as seen by the account.
        collection: Collection,
        /// Revision of the change.
        revision: u64,
    },
    /// The account lost access to the collection.
    MembershipRemoved {
        /// Uid of the collection.
        uid: String,
        /// Revision of the change.
        revision: u64,
    },
}

impl CollectionChange {
    /// Returns the revision at which the change happened.
    pub fn revision(&self) -> u64 {
        match self {
            CollectionChange::Upserted { revision, .. }
            | CollectionChange::MembershipRemoved { revision, .. } => *revision,
        }
    }
}

#[derive(Debug, Default)]
struct LogState {
    last_revision: u64,
    collections: BTreeMap<String, CollectionRecord>,
    removals: Vec<Removal>,
}

fn live_mut<'a>(
    collections: &'a mut BTreeMap<String, CollectionRecord>,
    uid: &str,
) -> ServerResult<&'a mut CollectionRecord> {
    match collections.get_mut(uid) {
        Some(record) if !record.deleted => Ok(record),
        Some(_) => Err(ServerError::InvalidRequest(format!(
            "collection {uid} is deleted"
        ))),
        None => Err(ServerError::NotFound(format!("collection {uid}"))),
    }
}

/// Revisioned log of every collection, item and membership change.
///
/// Every mutation is stamped with the next value of a single revision
/// counter. Listings return changes with a revision above the client's
/// cursor in revision order, so the revision of the last returned change is
/// a valid continuation cursor.
pub struct ServerLog {
    state: RwLock<LogState>,
}

impl ServerLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LogState::default()),
        }
    }

    /// Returns the revision of the latest change.
    pub fn revision(&self) -> u64 {
        self.state.read().last_revision
    }

    /// Creates a collection owned by `owner` and returns its generated uid.
    pub fn create_collection(
        &self,
        owner: &AccountId,
        meta: CollectionMeta,
        content: Vec<u8>,
    ) -> ServerResult<String> {
        let uid = Uuid::new_v4().simple().to_string();
        self.insert_collection(&uid, owner, meta, content)?;
        Ok(uid)
    }

    /// Creates a collection with a caller-chosen uid.
    pub fn insert_collection(
        &self,
        uid: &str,
        owner: &AccountId,
        meta: CollectionMeta,
        content: Vec<u8>,
    ) -> ServerResult<u64> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        if state.collections.contains_key(uid) {
            return Err(ServerError::InvalidRequest(format!(
                "collection {uid} already exists"
            )));
        }

        state.last_revision += 1;
        let revision = state.last_revision;
        let mut members = HashMap::new();
        members.insert(
            owner.clone(),
            Membership {
                access: AccessLevel::Admin,
                since: revision,
            },
        );
        state.collections.insert(
            uid.to_string(),
            CollectionRecord {
                meta,
                content,
                deleted: false,
                revision,
                items_revision: revision,
                members,
                items: BTreeMap::new(),
            },
        );
        Ok(revision)
    }

    /// Replaces the metadata of a collection.
    pub fn update_collection_meta(&self, uid: &str, meta: CollectionMeta) -> ServerResult<u64> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let revision = state.last_revision + 1;
        let record = live_mut(&mut state.collections, uid)?;
        record.meta = meta;
        record.revision = revision;
        state.last_revision = revision;
        Ok(revision)
    }

    /// Marks a collection as deleted. Members keep seeing the deletion.
    pub fn delete_collection(&self, uid: &str) -> ServerResult<u64> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let revision = state.last_revision + 1;
        let record = live_mut(&mut state.collections, uid)?;
        record.deleted = true;
        record.content.clear();
        record.revision = revision;
        state.last_revision = revision;
        Ok(revision)
    }

    /// Grants `account` access to a collection.
    pub fn add_member(
        &self,
        uid: &str,
        account: &AccountId,
        access: AccessLevel,
    ) -> ServerResult<u64> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let revision = state.last_revision + 1;
        let record = live_mut(&mut state.collections, uid)?;
        record.members.insert(
            account.clone(),
            Membership {
                access,
                since: revision,
            },
        );
        state.last_revision = revision;
        Ok(revision)
    }

    /// Revokes the access of `account` to a collection.
    pub fn remove_member(&self, uid: &str, account: &AccountId) -> ServerResult<u64> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let record = state
            .collections
            .get_mut(uid)
            .ok_or_else(|| ServerError::NotFound(format!("collection {uid}")))?;
        if record.members.remove(account).is_none() {
            return Err(ServerError::InvalidRequest(format!(
                "{account} is not a member of {uid}"
            )));
        }

        state.last_revision += 1;
        let revision = state.last_revision;
        state.removals.push(Removal {
            account: account.clone(),
            uid: uid.to_string(),
            revision,
        });
        Ok(revision)
    }

    /// Creates or replaces an item.
    pub fn put_item(
        &self,
        collection_uid: &str,
        item_uid: &str,
        content: Vec<u8>,
        mtime: Option<u64>,
    ) -> ServerResult<u64> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let revision = state.last_revision + 1;
        let record = live_mut(&mut state.collections, collection_uid)?;
        record.items.insert(
            item_uid.to_string(),
            ItemRecord {
                content,
                deleted: false,
                revision,
                mtime,
            },
        );
        record.items_revision = revision;
        state.last_revision = revision;
        Ok(revision)
    }

    /// Creates an item with a generated uid and returns the uid.
    pub fn add_item(&self, collection_uid: &str, content: Vec<u8>) -> ServerResult<String> {
        let uid = Uuid::new_v4().simple().to_string();
        self.put_item(collection_uid, &uid, content, None)?;
        Ok(uid)
    }

    /// Marks an item as deleted.
    pub fn delete_item(&self, collection_uid: &str, item_uid: &str) -> ServerResult<u64> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let revision = state.last_revision + 1;
        let record = live_mut(&mut state.collections, collection_uid)?;
        let item = record
            .items
            .get_mut(item_uid)
            .ok_or_else(|| ServerError::NotFound(format!("item {item_uid}")))?;
        item.deleted = true;
        item.content.clear();
        item.revision = revision;
        record.items_revision = revision;
        state.last_revision = revision;
        Ok(revision)
    }

    /// Returns true if `account` can access the collection.
    pub fn is_member(&self, uid: &str, account: &AccountId) -> bool {
        self.state
            .read()
            .collections
            .get(uid)
            .is_some_and(|record| record.members.contains_key(account))
    }

    /// Returns the number of collections, deleted ones included.
    pub fn collection_count(&self) -> usize {
        self.state.read().collections.len()
    }

    /// Returns the collection changes visible to `account` after `since`.
    ///
    /// A collection is listed again when its record, its items or the
    /// account's membership changed.
    /// At most `limit` changes are returned; the flag tells whether more
    /// changes remain after them.
    pub fn collection_changes(
        &self,
        account: &AccountId,
        since: u64,
        limit: u32,
    ) -> (Vec<CollectionChange>, bool) {
        let state = self.state.read();

        let upserts = state.collections.iter().filter_map(|(uid, record)| {
            let membership = record.members.get(account)?;
            let revision = record
                .revision
                .max(record.items_revision)
                .max(membership.since);
            (revision > since).then(|| CollectionChange::Upserted {
                collection: record.to_collection(uid, membership.access),
                revision,
            })
        });
        let removals = state
            .removals
            .iter()
            .filter(|removal| &removal.account == account && removal.revision > since)
            .map(|removal| CollectionChange::MembershipRemoved {
                uid: removal.uid.clone(),
                revision: removal.revision,
            });

        let mut changes: Vec<_> = upserts.chain(removals).collect();
        changes.sort_by_key(CollectionChange::revision);
        let more = changes.len() > limit as usize;
        changes.truncate(limit as usize);
        (changes, more)
    }

    /// Returns the metadata of a collection `account` can access.
    pub fn collection_meta(&self, account: &AccountId, uid: &str) -> ServerResult<CollectionMeta> {
        let state = self.state.read();
        let record = Self::visible(&state, account, uid)?;
        Ok(record.meta.clone())
    }

    /// Returns the item changes of a collection after `since`, with their
    /// revisions.
    pub fn item_changes(
        &self,
        account: &AccountId,
        uid: &str,
        since: u64,
        limit: u32,
    ) -> ServerResult<(Vec<(Item, u64)>, bool)> {
        let state = self.state.read();
        let record = Self::visible(&state, account, uid)?;

        let mut items: Vec<(Item, u64)> = record
            .items
            .iter()
            .filter(|(_, item)| item.revision > since)
            .map(|(item_uid, item)| {
                let entry = Item {
                    uid: item_uid.clone(),
                    etag: item.revision.to_string(),
                    deleted: item.deleted,
                    content: item.content.clone(),
                    mtime: item.mtime,
                };
                (entry, item.revision)
            })
            .collect();
        items.sort_by_key(|(_, revision)| *revision);
        let more = items.len() > limit as usize;
        items.truncate(limit as usize);
        Ok((items, more))
    }

    fn visible<'a>(
        state: &'a LogState,
        account: &AccountId,
        uid: &str,
    ) -> ServerResult<&'a CollectionRecord> {
        let record = state
            .collections
            .get(uid)
            .ok_or_else(|| ServerError::NotFound(format!("collection {uid}")))?;
        if !record.members.contains_key(account) {
            return Err(ServerError::NotAuthorized(format!(
                "{account} is not a member of {uid}"
            )));
        }
        Ok(record)
    }
}

impl Default for ServerLog {
    fn default() -> Self {
        Self::new()
    }
}

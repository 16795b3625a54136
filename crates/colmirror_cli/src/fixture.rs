//! Remote state fixtures.
//!
//! A fixture is a JSON document describing the collections, items and
//! memberships of a remote service. The CLI replays it into an in-process
//! reference server and syncs against that.
//!
//! ```json
//! {
//!   "collections": [
//!     {
//!       "uid": "work",
//!       "owner": "alice",
//!       "type": "etebase.md.note",
//!       "name": "Work",
//!       "members": [{ "account": "bob", "access": "read_only" }],
//!       "items": [{ "uid": "todo", "content": "ship it" }]
//!     }
//!   ],
//!   "revoked": [{ "collection": "work", "account": "bob" }]
//! }
//! ```

use colmirror_protocol::{AccessLevel, AccountId, CollectionMeta};
use colmirror_server::{ServerConfig, ServerError, SyncServer};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Errors while loading a fixture.
#[derive(Error, Debug)]
pub enum FixtureError {
    /// The fixture file could not be read.
    #[error("cannot read fixture: {0}")]
    Io(#[from] std::io::Error),

    /// The fixture is not valid JSON or has an unexpected shape.
    #[error("invalid fixture: {0}")]
    Parse(#[from] serde_json::Error),

    /// The fixture describes an impossible history.
    #[error("fixture rejected by server: {0}")]
    Server(#[from] ServerError),
}

/// Remote state to replay.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Fixture {
    /// Collections, created in order.
    pub collections: Vec<FixtureCollection>,
    /// Memberships revoked after every collection was created.
    pub revoked: Vec<FixtureRevocation>,
}

/// A collection of a fixture.
#[derive(Debug, Deserialize)]
pub struct FixtureCollection {
    /// Collection uid.
    pub uid: String,
    /// Owning account.
    pub owner: String,
    /// Decoded metadata.
    #[serde(flatten)]
    pub meta: CollectionMeta,
    /// Additional members.
    #[serde(default)]
    pub members: Vec<FixtureMember>,
    /// Items, written in order.
    #[serde(default)]
    pub items: Vec<FixtureItem>,
    /// Deletes the collection after its items were written.
    #[serde(default)]
    pub deleted: bool,
}

/// A shared membership.
#[derive(Debug, Deserialize)]
pub struct FixtureMember {
    /// Member account.
    pub account: String,
    /// Granted access.
    #[serde(default = "default_access")]
    pub access: AccessLevel,
}

fn default_access() -> AccessLevel {
    AccessLevel::ReadWrite
}

/// An item of a fixture collection.
#[derive(Debug, Deserialize)]
pub struct FixtureItem {
    /// Item uid.
    pub uid: String,
    /// Item content as text.
    #[serde(default)]
    pub content: String,
    /// Modification time in milliseconds since the Unix epoch.
    #[serde(default)]
    pub mtime: Option<u64>,
    /// Deletes the item right after writing it.
    #[serde(default)]
    pub deleted: bool,
}

/// A revoked membership.
#[derive(Debug, Deserialize)]
pub struct FixtureRevocation {
    /// Collection uid.
    pub collection: String,
    /// Account losing access.
    pub account: String,
}

impl Fixture {
    /// Reads a fixture file.
    pub async fn load(path: &Path) -> Result<Self, FixtureError> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::from_json(&text)
    }

    /// Parses a fixture document.
    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Replays the fixture into a new server.
    pub fn into_server(self, config: ServerConfig) -> Result<SyncServer, FixtureError> {
        let server = SyncServer::new(config);
        let log = server.log();

        for collection in self.collections {
            let uid = collection.uid;
            log.insert_collection(
                &uid,
                &AccountId::new(collection.owner),
                collection.meta,
                Vec::new(),
            )?;
            for member in collection.members {
                log.add_member(&uid, &AccountId::new(member.account), member.access)?;
            }
            for item in collection.items {
                log.put_item(&uid, &item.uid, item.content.into_bytes(), item.mtime)?;
                if item.deleted {
                    log.delete_item(&uid, &item.uid)?;
                }
            }
            if collection.deleted {
                log.delete_collection(&uid)?;
            }
        }

        for revocation in self.revoked {
            log.remove_member(&revocation.collection, &AccountId::new(revocation.account))?;
        }

        Ok(server)
    }
}

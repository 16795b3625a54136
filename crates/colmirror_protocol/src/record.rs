//! Collection and item records as returned by the remote service.

use serde::{Deserialize, Serialize};

/// Access level of the current account on a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Owner or administrator.
    Admin,
    /// May read and write items.
    ReadWrite,
    /// May only read.
    ReadOnly,
}

/// A container of items.
///
/// `content` is opaque to the sync engine: decryption happens inside the
/// remote client, which exposes the decoded metadata through a separate
/// call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Stable unique identifier.
    pub uid: String,
    /// Revision tag of this version.
    pub etag: String,
    /// Whether the collection was deleted remotely.
    #[serde(default)]
    pub deleted: bool,
    /// Access level of the listing account.
    pub access_level: AccessLevel,
    /// Opaque collection content.
    #[serde(default)]
    pub content: Vec<u8>,
}

impl Collection {
    /// Creates a live collection record.
    pub fn new(uid: impl Into<String>, etag: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            etag: etag.into(),
            deleted: false,
            access_level: AccessLevel::Admin,
            content: Vec::new(),
        }
    }
}

/// Decoded collection metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionMeta {
    /// Type tag, matched against the sync allow-list.
    #[serde(rename = "type")]
    pub collection_type: String,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional display color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Modification time in milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtime: Option<u64>,
}

impl CollectionMeta {
    /// Creates metadata with a type and a name.
    pub fn new(collection_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            collection_type: collection_type.into(),
            name: name.into(),
            description: None,
            color: None,
            mtime: None,
        }
    }
}

/// A leaf entity belonging to exactly one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Stable unique identifier.
    pub uid: String,
    /// Revision tag of this version.
    pub etag: String,
    /// Whether the item was deleted remotely.
    #[serde(default)]
    pub deleted: bool,
    /// Opaque item content.
    #[serde(default)]
    pub content: Vec<u8>,
    /// Modification time in milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtime: Option<u64>,
}

impl Item {
    /// Creates a live item record.
    pub fn new(uid: impl Into<String>, etag: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            uid: uid.into(),
            etag: etag.into(),
            deleted: false,
            content,
            mtime: None,
        }
    }

    /// Creates a deletion marker for an item.
    pub fn tombstone(uid: impl Into<String>, etag: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            etag: etag.into(),
            deleted: true,
            content: Vec::new(),
            mtime: None,
        }
    }
}

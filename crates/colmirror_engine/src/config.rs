//! Configuration for the sync engine.

use colmirror_protocol::{DEFAULT_PAGE_SIZE, NOTES_COLLECTION_TYPE};
use serde::Deserialize;

/// Configuration for sync operations.
///
/// Can be deserialized from a partial document; missing fields take their
/// default values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Number of collections or items requested per page.
    pub page_size: u32,
    /// Collection types mirrored into the cache. Collections of any other
    /// type are listed but never cached.
    pub collection_types: Vec<String>,
}

impl SyncConfig {
    /// Creates the default configuration: pages of 20, notes collections.
    pub fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            collection_types: vec![NOTES_COLLECTION_TYPE.to_string()],
        }
    }

    /// Sets the page size. Zero is raised to one.
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = size.max(1);
        self
    }

    /// Replaces the collection type allow-list.
    pub fn with_collection_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.collection_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Returns true if collections of this type are mirrored.
    pub fn accepts(&self, collection_type: &str) -> bool {
        self.collection_types.iter().any(|t| t == collection_type)
    }

    /// Page size to request, never zero.
    pub(crate) fn limit(&self) -> u32 {
        self.page_size.max(1)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

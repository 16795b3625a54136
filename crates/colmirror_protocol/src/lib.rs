//! # colmirror Sync Protocol
//!
//! Protocol types shared by the sync engine and the reference remote
//! service.
//!
//! This crate provides:
//! - `SyncToken` cursors and `AccountId` identities
//! - `Collection`, `CollectionMeta` and `Item` records
//! - Paginated list requests and responses
//! - The closed `RemoteErrorKind` classification of remote failures
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod messages;
mod record;
mod token;

pub use error::{RemoteError, RemoteErrorKind, RemoteResult};
pub use messages::{CollectionListResponse, ItemListResponse, ListOptions, RemovedMembership};
pub use record::{AccessLevel, Collection, CollectionMeta, Item};
pub use token::{AccountId, SyncToken};

/// Collection type of the notes collections mirrored by default.
pub const NOTES_COLLECTION_TYPE: &str = "etebase.md.note";

/// Default number of entries requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

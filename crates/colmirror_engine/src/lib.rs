//! # Colmirror Sync Engine
//!
//! Mirrors the collections and items of a remote account into a local cache.
//!
//! This crate provides:
//! - Per-account sync managers with single-flight runs
//! - Two-level cursor pagination (collections, then items per collection)
//! - Error classification into ignored, recorded and propagated failures
//! - A registry handing out one manager per account
//! - Remote client and cache store abstractions, with in-memory versions
//!
//! ## Architecture
//!
//! A run lists collection changes page by page from the stored general
//! cursor. For each listed collection of a mirrored type it upserts the
//! collection, then lists item changes from that collection's own cursor.
//! Collections whose membership was revoked are evicted before the general
//! cursor moves past them.
//!
//! ## Key Invariants
//!
//! - A cursor is written only after the cache mutations it covers
//! - An interrupted run persists the cursor of its last applied page
//! - At most one run per account is in flight; extra calls are skipped
//! - Cache mutations are idempotent, so replayed pages are harmless

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod config;
mod error;
mod manager;
mod registry;
mod remote;
mod state;

pub use cache::{CacheEvent, CacheSnapshot, CacheStore, CachedCollection, MemoryCache};
pub use config::SyncConfig;
pub use error::{CacheError, CacheResult, ErrorDisposition, NonFatalError, SyncError, SyncResult};
pub use manager::{SyncManager, SyncOutcome, SyncSummary};
pub use registry::ManagerRegistry;
pub use remote::{MockRemote, RemoteCall, RemoteClient};
pub use state::{SyncFlag, SyncGuard, SyncState, SyncStats};

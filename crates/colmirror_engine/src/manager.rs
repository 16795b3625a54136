//! Per-account sync orchestration.

use crate::cache::CacheStore;
use crate::config::SyncConfig;
use crate::error::{CacheResult, ErrorDisposition, NonFatalError, SyncError, SyncResult};
use crate::remote::RemoteClient;
use crate::state::{SyncFlag, SyncState, SyncStats};
use colmirror_protocol::{AccountId, Collection, ListOptions, RemoteErrorKind, SyncToken};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Counters of one completed sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Collection pages fetched.
    pub pages: u64,
    /// Collections upserted and brought up to date.
    pub collections_synced: u64,
    /// Listed collections whose type is not mirrored.
    pub collections_skipped: u64,
    /// Collections evicted after a membership removal.
    pub collections_evicted: u64,
    /// Items applied to the cache.
    pub items_applied: u64,
    /// Wall time of the run.
    pub duration: Duration,
}

/// Result of a call to [`SyncManager::sync`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The run completed.
    Synced(SyncSummary),
    /// Another run was in flight; nothing was done.
    Skipped,
    /// The run stopped on a recoverable remote error that was swallowed.
    Suppressed(RemoteErrorKind),
}

impl SyncOutcome {
    /// Returns true if the run completed.
    pub fn is_synced(&self) -> bool {
        matches!(self, SyncOutcome::Synced(_))
    }

    /// Returns true if the call was rejected by the single-flight guard.
    pub fn is_skipped(&self) -> bool {
        matches!(self, SyncOutcome::Skipped)
    }

    /// Returns true if a recoverable error was swallowed.
    pub fn is_suppressed(&self) -> bool {
        matches!(self, SyncOutcome::Suppressed(_))
    }

    /// Tri-state view: `Some(true)` completed, `Some(false)` skipped, `None`
    /// suppressed.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            SyncOutcome::Synced(_) => Some(true),
            SyncOutcome::Skipped => Some(false),
            SyncOutcome::Suppressed(_) => None,
        }
    }
}

/// Settles a loop result with the outcome of its cursor write.
///
/// A failed write fails a successful loop. When the loop itself failed, its
/// error wins and the write failure is only logged.
fn settle<T>(outcome: SyncResult<T>, written: CacheResult<()>, scope: &str) -> SyncResult<T> {
    match (outcome, written) {
        (outcome, Ok(())) => outcome,
        (Ok(_), Err(error)) => Err(error.into()),
        (Err(original), Err(error)) => {
            warn!(scope, %error, "failed to persist cursor of an aborted sync");
            Err(original)
        }
    }
}

/// Mirrors the collections and items of one account into a cache.
///
/// At most one run is in flight per manager: a call made while another is
/// running returns [`SyncOutcome::Skipped`] at once. Cursors are written only
/// after the cache mutations they cover, so an interrupted run resumes from
/// the last applied page.
pub struct SyncManager<C: CacheStore> {
    account: AccountId,
    config: SyncConfig,
    cache: Arc<C>,
    flag: SyncFlag,
    stats: RwLock<SyncStats>,
}

impl<C: CacheStore> SyncManager<C> {
    /// Creates a manager for an account.
    pub fn new(account: AccountId, config: SyncConfig, cache: Arc<C>) -> Self {
        Self {
            account,
            config,
            cache,
            flag: SyncFlag::new(),
            stats: RwLock::new(SyncStats::default()),
        }
    }

    /// Account this manager syncs.
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// Configuration in use.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Cache the manager writes to.
    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    /// Gets the current state.
    pub fn state(&self) -> SyncState {
        self.flag.state()
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Runs a sync, swallowing recoverable remote errors.
    ///
    /// Network and temporary-unavailability errors yield
    /// [`SyncOutcome::Suppressed`]. Permission and HTTP errors do too, after
    /// being queued with [`CacheStore::record_non_fatal_error`]. Any other
    /// error is returned.
    pub async fn sync<R>(&self, remote: &R) -> SyncResult<SyncOutcome>
    where
        R: RemoteClient + ?Sized,
    {
        self.run(remote, false).await
    }

    /// Runs a sync and returns every error unchanged.
    pub async fn sync_strict<R>(&self, remote: &R) -> SyncResult<SyncOutcome>
    where
        R: RemoteClient + ?Sized,
    {
        self.run(remote, true).await
    }

    async fn run<R>(&self, remote: &R, strict: bool) -> SyncResult<SyncOutcome>
    where
        R: RemoteClient + ?Sized,
    {
        let Some(_guard) = self.flag.try_acquire() else {
            debug!(account = %self.account, "sync already in flight, skipping");
            self.stats.write().runs_skipped += 1;
            return Ok(SyncOutcome::Skipped);
        };

        let start = Instant::now();
        let fetched = if remote.account() == &self.account {
            self.fetch_all_collections(remote).await
        } else {
            Err(SyncError::AccountMismatch {
                expected: self.account.clone(),
                actual: remote.account().clone(),
            })
        };
        let error = match fetched {
            Ok(mut summary) => {
                summary.duration = start.elapsed();
                self.record_success(&summary);
                info!(
                    account = %self.account,
                    collections = summary.collections_synced,
                    items = summary.items_applied,
                    evicted = summary.collections_evicted,
                    elapsed_ms = summary.duration.as_millis() as u64,
                    "sync completed"
                );
                return Ok(SyncOutcome::Synced(summary));
            }
            Err(error) => error,
        };

        self.stats.write().last_error = Some(error.to_string());
        let disposition = if strict {
            ErrorDisposition::Propagate
        } else {
            error.disposition()
        };

        match disposition {
            ErrorDisposition::Ignore(kind) => {
                debug!(account = %self.account, %error, "ignoring transient sync error");
                self.stats.write().runs_suppressed += 1;
                Ok(SyncOutcome::Suppressed(kind))
            }
            ErrorDisposition::Record(kind) => {
                warn!(account = %self.account, %error, "sync failed, queueing non-fatal error");
                if let SyncError::Remote(remote_error) = &error {
                    self.cache
                        .record_non_fatal_error(NonFatalError::from_remote(
                            &self.account,
                            remote_error,
                        ))
                        .await?;
                }
                self.stats.write().runs_suppressed += 1;
                Ok(SyncOutcome::Suppressed(kind))
            }
            ErrorDisposition::Propagate => {
                self.stats.write().runs_failed += 1;
                Err(error)
            }
        }
    }

    fn record_success(&self, summary: &SyncSummary) {
        let mut stats = self.stats.write();
        stats.runs_completed += 1;
        stats.collections_synced += summary.collections_synced;
        stats.items_applied += summary.items_applied;
        stats.collections_evicted += summary.collections_evicted;
        stats.last_sync_time = Some(Instant::now());
        stats.last_duration = Some(summary.duration);
        stats.last_error = None;
    }

    /// Pulls every collection change, then persists the general cursor if it
    /// moved.
    async fn fetch_all_collections<R>(&self, remote: &R) -> SyncResult<SyncSummary>
    where
        R: RemoteClient + ?Sized,
    {
        let stored = self.cache.general_token().await?;
        let mut cursor = stored.clone();
        let mut summary = SyncSummary::default();

        let pulled = self
            .pull_collection_pages(remote, &mut cursor, &mut summary)
            .await;

        if cursor == stored {
            return pulled.map(|()| summary);
        }
        let written = self.cache.set_general_token(cursor.as_ref()).await;
        settle(pulled, written, "general").map(|()| summary)
    }

    async fn pull_collection_pages<R>(
        &self,
        remote: &R,
        cursor: &mut Option<SyncToken>,
        summary: &mut SyncSummary,
    ) -> SyncResult<()>
    where
        R: RemoteClient + ?Sized,
    {
        loop {
            let options = ListOptions::new(cursor.clone(), self.config.limit());
            let page = remote.list_collections(&options).await?;
            summary.pages += 1;

            for collection in &page.data {
                let meta = remote.collection_meta(collection).await?;
                if !self.config.accepts(&meta.collection_type) {
                    debug!(
                        account = %self.account,
                        collection = %collection.uid,
                        collection_type = %meta.collection_type,
                        "skipping collection of unsynced type"
                    );
                    summary.collections_skipped += 1;
                    continue;
                }

                self.cache.upsert_collection(collection, &meta).await?;
                summary.items_applied += self.fetch_collection(remote, collection).await?;
                summary.collections_synced += 1;
            }

            for removed in &page.removed_memberships {
                debug!(account = %self.account, collection = %removed.uid, "evicting collection");
                self.cache.evict_collection(&removed.uid).await?;
                summary.collections_evicted += 1;
            }

            *cursor = page.stoken;
            if page.done {
                return Ok(());
            }
        }
    }

    /// Brings the items of one collection up to date and returns how many
    /// were applied.
    async fn fetch_collection<R>(&self, remote: &R, collection: &Collection) -> SyncResult<u64>
    where
        R: RemoteClient + ?Sized,
    {
        let stored = self.cache.collection_token(&collection.uid).await?;
        let mut cursor = stored.clone();

        let pulled = self.pull_item_pages(remote, collection, &mut cursor).await;

        if cursor == stored {
            return pulled;
        }
        let written = self
            .cache
            .set_collection_token(&collection.uid, cursor.as_ref())
            .await;
        settle(pulled, written, &collection.uid)
    }

    async fn pull_item_pages<R>(
        &self,
        remote: &R,
        collection: &Collection,
        cursor: &mut Option<SyncToken>,
    ) -> SyncResult<u64>
    where
        R: RemoteClient + ?Sized,
    {
        let mut applied = 0u64;
        loop {
            let options = ListOptions::new(cursor.clone(), self.config.limit());
            let page = remote.list_items(collection, &options).await?;

            if !page.data.is_empty() {
                self.cache.upsert_items(&collection.uid, &page.data).await?;
                applied += page.data.len() as u64;
            }
            debug!(
                account = %self.account,
                collection = %collection.uid,
                items = page.data.len(),
                done = page.done,
                "applied item page"
            );

            *cursor = page.stoken;
            if page.done {
                return Ok(applied);
            }
        }
    }
}

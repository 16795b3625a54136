//! CLI command implementations.

pub mod inspect;
pub mod sync;
pub mod watch;

use crate::fixture::Fixture;
use crate::remote::ServerRemote;
use crate::store::{cache_path, FileCache};
use colmirror_engine::{ManagerRegistry, SyncConfig, SyncOutcome};
use colmirror_protocol::AccountId;
use colmirror_server::ServerConfig;
use std::path::Path;
use std::sync::Arc;

/// Builds the sync configuration from an optional JSON file, then applies
/// command-line overrides.
pub async fn load_config(
    path: Option<&Path>,
    page_size: Option<u32>,
) -> Result<SyncConfig, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(path) => {
            let bytes = tokio::fs::read(path).await?;
            serde_json::from_slice(&bytes)?
        }
        None => SyncConfig::default(),
    };
    if let Some(size) = page_size {
        config = config.with_page_size(size);
    }
    Ok(config)
}

/// A remote replayed from a fixture, and a registry whose managers write to
/// the account's cache file.
pub(crate) struct Session {
    pub remote: Arc<ServerRemote>,
    pub registry: ManagerRegistry<FileCache>,
}

impl Session {
    pub(crate) async fn open(
        state_dir: &Path,
        fixture: &Path,
        account: &str,
        config: SyncConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let server = Fixture::load(fixture)
            .await?
            .into_server(ServerConfig::default())?;
        let account = AccountId::from(account);
        let cache = FileCache::open(cache_path(state_dir, &account)).await?;

        Ok(Self {
            remote: Arc::new(ServerRemote::new(account, Arc::new(server))),
            registry: ManagerRegistry::with_shared_cache(config, Arc::new(cache)),
        })
    }
}

pub(crate) fn describe(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Synced(summary) => format!(
            "synced {} collections ({} skipped, {} evicted), {} items in {} pages",
            summary.collections_synced,
            summary.collections_skipped,
            summary.collections_evicted,
            summary.items_applied,
            summary.pages
        ),
        SyncOutcome::Skipped => "skipped: a sync was already running".to_string(),
        SyncOutcome::Suppressed(kind) => format!("gave up for now: {kind}"),
    }
}

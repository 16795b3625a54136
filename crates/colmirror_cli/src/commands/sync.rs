//! Sync command implementation.

use super::{describe, Session};
use colmirror_engine::SyncConfig;
use std::path::Path;

/// Runs one sync of `account` against the remote described by `fixture`.
///
/// In strict mode every error is returned; otherwise recoverable remote
/// failures are reported as an outcome and queued in the cache.
pub async fn run(
    state_dir: &Path,
    fixture: &Path,
    account: &str,
    strict: bool,
    config: SyncConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = Session::open(state_dir, fixture, account, config).await?;
    let manager = session.registry.manager_for(session.remote.as_ref());

    let outcome = if strict {
        manager.sync_strict(session.remote.as_ref()).await?
    } else {
        manager.sync(session.remote.as_ref()).await?
    };

    println!("{account}: {}", describe(&outcome));
    println!("cache: {}", manager.cache().path().display());
    Ok(())
}

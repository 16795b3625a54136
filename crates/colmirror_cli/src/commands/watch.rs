//! Watch command implementation.

use super::{describe, Session};
use colmirror_engine::{SyncConfig, SyncOutcome};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Tally of the outcomes of a watch session.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct WatchReport {
    /// Triggers that completed a sync.
    pub synced: u32,
    /// Triggers rejected because a sync was in flight.
    pub skipped: u32,
    /// Triggers that ended with a swallowed remote error.
    pub suppressed: u32,
    /// Triggers that ended with an error.
    pub failed: u32,
}

/// Triggers a sync every `interval` for `ticks` ticks.
///
/// Each trigger runs on its own task, so a slow sync overlaps the next tick
/// and that trigger is skipped.
pub async fn run(
    state_dir: &Path,
    fixture: &Path,
    account: &str,
    interval: Duration,
    ticks: u32,
    config: SyncConfig,
) -> Result<WatchReport, Box<dyn std::error::Error>> {
    let session = Session::open(state_dir, fixture, account, config).await?;
    let mut timer = tokio::time::interval(interval.max(Duration::from_millis(1)));
    let mut tasks = Vec::new();

    for tick in 0..ticks {
        timer.tick().await;
        let manager = session.registry.manager_for(session.remote.as_ref());
        let remote = session.remote.clone();
        info!(tick, %account, "sync triggered");
        tasks.push(tokio::spawn(async move { manager.sync(remote.as_ref()).await }));
    }

    let mut report = WatchReport::default();
    for task in tasks {
        match task.await? {
            Ok(outcome) => {
                println!("{account}: {}", describe(&outcome));
                match outcome {
                    SyncOutcome::Synced(_) => report.synced += 1,
                    SyncOutcome::Skipped => report.skipped += 1,
                    SyncOutcome::Suppressed(_) => report.suppressed += 1,
                }
            }
            Err(error) => {
                warn!(%account, %error, "sync failed");
                report.failed += 1;
            }
        }
    }

    println!(
        "{ticks} triggers: {} synced, {} skipped, {} suppressed, {} failed",
        report.synced, report.skipped, report.suppressed, report.failed
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_trigger_is_accounted_for() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = dir.path().join("remote.json");
        std::fs::write(
            &fixture,
            r#"{ "collections": [
                { "uid": "n", "owner": "alice", "type": "etebase.md.note", "name": "N",
                  "items": [{ "uid": "a", "content": "x" }] }
            ] }"#,
        )
        .unwrap();

        let report = run(
            dir.path(),
            &fixture,
            "alice",
            Duration::from_millis(5),
            3,
            SyncConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.synced + report.skipped, 3);
        assert!(report.synced >= 1);
        assert_eq!(report.suppressed + report.failed, 0);
    }
}

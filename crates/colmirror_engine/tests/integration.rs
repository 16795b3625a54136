//! Integration tests for the sync engine against the reference server.

mod common;

use colmirror_engine::{
    CacheStore, ManagerRegistry, MemoryCache, SyncConfig, SyncManager, SyncOutcome, SyncSummary,
};
use colmirror_protocol::{
    AccessLevel, AccountId, CollectionMeta, RemoteError, RemoteErrorKind, SyncToken,
};
use common::{note_meta, server, InMemoryRemote};
use std::sync::Arc;

fn manager(account: &str, page_size: u32) -> SyncManager<MemoryCache> {
    SyncManager::new(
        AccountId::from(account),
        SyncConfig::default().with_page_size(page_size),
        Arc::new(MemoryCache::new()),
    )
}

fn summary(outcome: SyncOutcome) -> SyncSummary {
    match outcome {
        SyncOutcome::Synced(summary) => summary,
        other => panic!("expected a completed sync, got {other:?}"),
    }
}

#[tokio::test]
async fn full_sync_mirrors_account() {
    let server = server();
    let alice = AccountId::from("alice");
    let log = server.log();

    log.insert_collection("work", &alice, note_meta("Work"), vec![]).unwrap();
    log.insert_collection("home", &alice, note_meta("Home"), vec![]).unwrap();
    log.insert_collection("cards", &alice, CollectionMeta::new("etebase.vcard", "Cards"), vec![])
        .unwrap();
    for i in 0..25 {
        log.put_item("work", &format!("w{i:02}"), vec![i], None).unwrap();
    }
    log.put_item("home", "h0", b"groceries".to_vec(), None).unwrap();
    log.put_item("cards", "c0", b"vcard".to_vec(), None).unwrap();

    let remote = InMemoryRemote::new(&server, "alice");
    let manager = manager("alice", 10);
    let summary = summary(manager.sync(&remote).await.unwrap());

    assert_eq!(summary.collections_synced, 2);
    assert_eq!(summary.collections_skipped, 1);
    assert_eq!(summary.items_applied, 26);

    let snapshot = manager.cache().snapshot();
    assert_eq!(snapshot.live_collections().count(), 2);
    assert_eq!(snapshot.item_count("work"), 25);
    assert_eq!(snapshot.item_count("home"), 1);
    assert!(!snapshot.collections.contains_key("cards"));
    assert_eq!(
        snapshot.general_token,
        Some(SyncToken::new(server.revision().to_string()))
    );
}

#[tokio::test]
async fn second_sync_writes_nothing() {
    let server = server();
    let alice = AccountId::from("alice");
    server
        .log()
        .insert_collection("c1", &alice, note_meta("Notes"), vec![])
        .unwrap();
    server.log().add_item("c1", b"one".to_vec()).unwrap();

    let remote = InMemoryRemote::new(&server, "alice");
    let manager = manager("alice", 20);
    manager.sync(&remote).await.unwrap();
    manager.cache().clear_journal();

    let summary = summary(manager.sync(&remote).await.unwrap());
    assert_eq!(summary.pages, 1);
    assert_eq!(summary.items_applied, 0);
    assert!(manager.cache().journal().is_empty());
    assert_eq!(manager.stats().runs_completed, 2);
}

#[tokio::test]
async fn incremental_changes_are_applied() {
    let server = server();
    let alice = AccountId::from("alice");
    let log = server.log();
    log.insert_collection("c1", &alice, note_meta("Notes"), vec![]).unwrap();
    log.put_item("c1", "keep", b"v1".to_vec(), None).unwrap();
    log.put_item("c1", "drop", b"v1".to_vec(), None).unwrap();

    let remote = InMemoryRemote::new(&server, "alice");
    let manager = manager("alice", 20);
    manager.sync(&remote).await.unwrap();

    log.put_item("c1", "keep", b"v2".to_vec(), Some(7)).unwrap();
    log.delete_item("c1", "drop").unwrap();
    log.update_collection_meta("c1", note_meta("Renamed")).unwrap();

    let summary = summary(manager.sync(&remote).await.unwrap());
    assert_eq!(summary.items_applied, 2);

    let snapshot = manager.cache().snapshot();
    assert_eq!(snapshot.collections["c1"].meta.name, "Renamed");
    assert_eq!(snapshot.item_count("c1"), 1);
    assert_eq!(snapshot.items["c1"]["keep"].content, b"v2");
    assert_eq!(snapshot.items["c1"]["keep"].mtime, Some(7));
}

#[tokio::test]
async fn deleted_collection_stays_flagged() {
    let server = server();
    let alice = AccountId::from("alice");
    server
        .log()
        .insert_collection("c1", &alice, note_meta("Old"), vec![])
        .unwrap();

    let remote = InMemoryRemote::new(&server, "alice");
    let manager = manager("alice", 20);
    manager.sync(&remote).await.unwrap();

    server.log().delete_collection("c1").unwrap();
    manager.sync(&remote).await.unwrap();

    let snapshot = manager.cache().snapshot();
    assert!(snapshot.collections["c1"].collection.deleted);
    assert_eq!(snapshot.live_collections().count(), 0);
}

#[tokio::test]
async fn revoked_membership_evicts_collection() {
    let server = server();
    let alice = AccountId::from("alice");
    let bob = AccountId::from("bob");
    let log = server.log();
    log.insert_collection("shared", &alice, note_meta("Shared"), vec![]).unwrap();
    log.add_member("shared", &bob, AccessLevel::ReadOnly).unwrap();
    log.add_item("shared", b"hello".to_vec()).unwrap();

    let remote = InMemoryRemote::new(&server, "bob");
    let manager = manager("bob", 20);
    manager.sync(&remote).await.unwrap();
    assert_eq!(manager.cache().snapshot().item_count("shared"), 1);

    log.remove_member("shared", &bob).unwrap();
    let summary = summary(manager.sync(&remote).await.unwrap());

    assert_eq!(summary.collections_evicted, 1);
    let snapshot = manager.cache().snapshot();
    assert!(snapshot.collections.is_empty());
    assert_eq!(snapshot.item_count("shared"), 0);
    assert_eq!(manager.cache().collection_token("shared").await.unwrap(), None);
    assert_eq!(
        snapshot.general_token,
        Some(SyncToken::new(server.revision().to_string()))
    );
}

#[tokio::test]
async fn readded_membership_on_later_page_is_kept() {
    let server = server();
    let alice = AccountId::from("alice");
    let bob = AccountId::from("bob");
    let log = server.log();
    log.insert_collection("shared", &alice, note_meta("Shared"), vec![]).unwrap();
    log.add_member("shared", &bob, AccessLevel::ReadWrite).unwrap();
    log.add_item("shared", b"hello".to_vec()).unwrap();

    let remote = InMemoryRemote::new(&server, "bob");
    let manager = manager("bob", 1);
    manager.sync(&remote).await.unwrap();

    let removed_at = log.remove_member("shared", &bob).unwrap();
    let readded_at = log.add_member("shared", &bob, AccessLevel::ReadOnly).unwrap();
    assert!(removed_at < readded_at);

    // one change per page: the removal first, then the new membership
    let summary = summary(manager.sync(&remote).await.unwrap());
    assert_eq!(summary.pages, 2);
    assert_eq!(summary.collections_evicted, 1);
    assert_eq!(summary.collections_synced, 1);

    let snapshot = manager.cache().snapshot();
    assert_eq!(
        snapshot.collections["shared"].collection.access_level,
        AccessLevel::ReadOnly
    );
    assert_eq!(snapshot.item_count("shared"), 1);
    assert_eq!(
        snapshot.general_token,
        Some(SyncToken::new(readded_at.to_string()))
    );
}

#[tokio::test]
async fn interrupted_item_paging_resumes_from_checkpoint() {
    let server = server();
    let alice = AccountId::from("alice");
    server
        .log()
        .insert_collection("c1", &alice, note_meta("Notes"), vec![])
        .unwrap();
    let revisions: Vec<u64> = (0..30)
        .map(|i| {
            server
                .log()
                .put_item("c1", &format!("i{i:02}"), vec![i], None)
                .unwrap()
        })
        .collect();

    let remote = InMemoryRemote::new(&server, "alice");
    remote.fail_item_call(2, RemoteError::network("connection reset"));
    let manager = manager("alice", 10);

    let outcome = manager.sync(&remote).await.unwrap();
    assert_eq!(outcome, SyncOutcome::Suppressed(RemoteErrorKind::Network));
    assert_eq!(
        manager.cache().collection_token("c1").await.unwrap(),
        Some(SyncToken::new(revisions[19].to_string()))
    );
    assert_eq!(manager.cache().snapshot().item_count("c1"), 20);
    assert_eq!(manager.cache().general_token().await.unwrap(), None);

    let summary = summary(manager.sync(&remote).await.unwrap());
    assert_eq!(summary.items_applied, 10);
    assert_eq!(manager.cache().snapshot().item_count("c1"), 30);
    assert_eq!(remote.item_calls(), 4);
}

#[tokio::test]
async fn maintenance_mode_is_suppressed() {
    let server = server();
    let alice = AccountId::from("alice");
    server
        .log()
        .insert_collection("c1", &alice, note_meta("Notes"), vec![])
        .unwrap();
    server.set_available(false);

    let remote = InMemoryRemote::new(&server, "alice");
    let manager = manager("alice", 20);

    let outcome = manager.sync(&remote).await.unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::Suppressed(RemoteErrorKind::TemporarilyUnavailable)
    );
    assert!(manager.cache().non_fatal_errors().is_empty());

    let err = manager.sync_strict(&remote).await.unwrap_err();
    assert_eq!(err.remote_kind(), Some(RemoteErrorKind::TemporarilyUnavailable));

    server.set_available(true);
    assert!(manager.sync(&remote).await.unwrap().is_synced());
}

#[tokio::test]
async fn registry_keeps_accounts_apart() {
    let server = server();
    let log = server.log();
    log.insert_collection("a", &AccountId::from("alice"), note_meta("A"), vec![])
        .unwrap();
    log.insert_collection("b", &AccountId::from("bob"), note_meta("B"), vec![])
        .unwrap();

    let registry = ManagerRegistry::new(SyncConfig::default(), |_| Arc::new(MemoryCache::new()));
    for account in ["alice", "bob"] {
        let remote = InMemoryRemote::new(&server, account);
        let manager = registry.manager_for(&remote);
        assert!(manager.sync(&remote).await.unwrap().is_synced());
    }

    let alice = registry.get_manager(&AccountId::from("alice"));
    let bob = registry.get_manager(&AccountId::from("bob"));
    assert!(alice.cache().snapshot().collections.contains_key("a"));
    assert!(!alice.cache().snapshot().collections.contains_key("b"));
    assert!(bob.cache().snapshot().collections.contains_key("b"));
    assert_eq!(registry.len(), 2);
}

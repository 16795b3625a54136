//! Inspect command implementation.

use crate::store::{cache_path, FileCache};
use colmirror_engine::{CacheSnapshot, NonFatalError};
use colmirror_protocol::AccountId;
use serde::Serialize;
use std::path::Path;

/// Cache inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Account of the cache.
    pub account: String,
    /// Cache file path.
    pub path: String,
    /// Collection-list cursor.
    pub general_token: Option<String>,
    /// Cached collections.
    pub collections: Vec<CollectionReport>,
    /// Queued non-fatal errors.
    pub non_fatal_errors: Vec<NonFatalError>,
}

/// Summary of one cached collection.
#[derive(Debug, Serialize)]
pub struct CollectionReport {
    /// Collection uid.
    pub uid: String,
    /// Display name.
    pub name: String,
    /// Collection type.
    pub collection_type: String,
    /// Whether the collection was deleted remotely.
    pub deleted: bool,
    /// Number of live items.
    pub items: usize,
    /// Item cursor.
    pub stoken: Option<String>,
}

impl InspectResult {
    fn new(account: &AccountId, path: &Path, snapshot: CacheSnapshot) -> Self {
        let collections = snapshot
            .collections
            .values()
            .map(|cached| {
                let uid = cached.collection.uid.clone();
                CollectionReport {
                    name: cached.meta.name.clone(),
                    collection_type: cached.meta.collection_type.clone(),
                    deleted: cached.collection.deleted,
                    items: snapshot.item_count(&uid),
                    stoken: snapshot
                        .collection_tokens
                        .get(&uid)
                        .map(ToString::to_string),
                    uid,
                }
            })
            .collect();

        Self {
            account: account.to_string(),
            path: path.display().to_string(),
            general_token: snapshot.general_token.as_ref().map(ToString::to_string),
            collections,
            non_fatal_errors: snapshot.non_fatal_errors,
        }
    }
}

/// Runs the inspect command.
pub async fn run(
    state_dir: &Path,
    account: &str,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let account = AccountId::from(account);
    let path = cache_path(state_dir, &account);
    if !tokio::fs::try_exists(&path).await? {
        return Err(format!("No cache for {account} at {}", path.display()).into());
    }

    let cache = FileCache::open(&path).await?;
    let result = InspectResult::new(&account, &path, cache.snapshot());

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("colmirror cache: {}", result.account);
    println!("================");
    println!();
    println!("Path:   {}", result.path);
    println!(
        "Cursor: {}",
        result.general_token.as_deref().unwrap_or("(none)")
    );
    println!();
    println!("Collections:");
    for col in &result.collections {
        let flag = if col.deleted { " [deleted]" } else { "" };
        println!(
            "  {} \"{}\" ({}){}: {} items, cursor {}",
            col.uid,
            col.name,
            col.collection_type,
            flag,
            col.items,
            col.stoken.as_deref().unwrap_or("(none)")
        );
    }

    if !result.non_fatal_errors.is_empty() {
        println!();
        println!("Non-fatal errors:");
        for error in &result.non_fatal_errors {
            println!("  [{}] {}: {}", error.recorded_at, error.kind, error.message);
        }
    }
}

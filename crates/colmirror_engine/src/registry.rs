//! One sync manager per account.

use crate::cache::CacheStore;
use crate::config::SyncConfig;
use crate::manager::SyncManager;
use crate::remote::RemoteClient;
use colmirror_protocol::AccountId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

type CacheOpener<C> = Box<dyn Fn(&AccountId) -> Arc<C> + Send + Sync>;

/// Hands out the sync manager of an account, creating it on first use.
///
/// Every caller asking for the same account gets the same manager, so the
/// single-flight guard covers all of them.
pub struct ManagerRegistry<C: CacheStore + 'static> {
    config: SyncConfig,
    open_cache: CacheOpener<C>,
    managers: RwLock<HashMap<AccountId, Arc<SyncManager<C>>>>,
}

impl<C: CacheStore + 'static> ManagerRegistry<C> {
    /// Creates a registry that opens one cache per account.
    pub fn new<F>(config: SyncConfig, open_cache: F) -> Self
    where
        F: Fn(&AccountId) -> Arc<C> + Send + Sync + 'static,
    {
        Self {
            config,
            open_cache: Box::new(open_cache),
            managers: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a registry whose managers all write to one cache.
    pub fn with_shared_cache(config: SyncConfig, cache: Arc<C>) -> Self {
        Self::new(config, move |_| Arc::clone(&cache))
    }

    /// Returns the manager of an account, creating it if needed.
    pub fn get_manager(&self, account: &AccountId) -> Arc<SyncManager<C>> {
        if let Some(manager) = self.managers.read().get(account) {
            return Arc::clone(manager);
        }

        let mut managers = self.managers.write();
        let manager = managers.entry(account.clone()).or_insert_with(|| {
            debug!(%account, "creating sync manager");
            Arc::new(SyncManager::new(
                account.clone(),
                self.config.clone(),
                (self.open_cache)(account),
            ))
        });
        Arc::clone(manager)
    }

    /// Returns the manager of the account a remote client acts for.
    pub fn manager_for<R>(&self, remote: &R) -> Arc<SyncManager<C>>
    where
        R: RemoteClient + ?Sized,
    {
        self.get_manager(remote.account())
    }

    /// Forgets the manager of an account, typically on logout.
    ///
    /// A run in flight on the removed manager finishes normally; the next
    /// [`ManagerRegistry::get_manager`] call creates a fresh manager.
    pub fn remove_manager(&self, account: &AccountId) -> Option<Arc<SyncManager<C>>> {
        let removed = self.managers.write().remove(account);
        if removed.is_some() {
            debug!(%account, "removed sync manager");
        }
        removed
    }

    /// Returns true if a manager exists for the account.
    pub fn contains(&self, account: &AccountId) -> bool {
        self.managers.read().contains_key(account)
    }

    /// Number of managers.
    pub fn len(&self) -> usize {
        self.managers.read().len()
    }

    /// Returns true if no manager was created yet.
    pub fn is_empty(&self) -> bool {
        self.managers.read().is_empty()
    }

    /// Accounts with a manager, sorted.
    pub fn accounts(&self) -> Vec<AccountId> {
        let mut accounts: Vec<_> = self.managers.read().keys().cloned().collect();
        accounts.sort();
        accounts
    }

    /// Configuration given to new managers.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }
}

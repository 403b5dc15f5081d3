//! Per-database provider registry
//!
//! Maps a database identifier to the ordered list of providers consulted at
//! login. Every list is write-once: after a database has a non-empty list it
//! can only be changed by clearing the whole registry.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::RegistryError;
use crate::provider::AuthProvider;

/// Immutable, shareable snapshot of one database's provider list
pub type ProviderList = Arc<[Arc<dyn AuthProvider>]>;

/// Write-once, read-many store of provider lists keyed by database id
///
/// Populated during startup, then shared (`Arc<ProviderRegistry>`) with the
/// login path. Lookups hand out snapshots, so no lock is held while a
/// provider runs.
pub struct ProviderRegistry {
    databases: RwLock<HashMap<String, ProviderList>>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            databases: RwLock::new(HashMap::new()),
        }
    }

    // =========== Population ===========

    /// Load provider lists for many databases at once.
    ///
    /// Only accepted while no database has a non-empty list. Every list is
    /// copied; the caller keeps ownership of `mapping`.
    pub fn bulk_load<K, V>(&self, mapping: &HashMap<K, V>) -> Result<(), RegistryError>
    where
        K: AsRef<str>,
        V: AsRef<[Arc<dyn AuthProvider>]>,
    {
        let mut databases = self.databases.write();

        if let Some(database) = first_initialized(&databases) {
            return Err(RegistryError::AlreadyInitialized(database.to_string()));
        }

        for (database, providers) in mapping {
            store(&mut databases, database.as_ref(), providers.as_ref())?;
        }

        info!(databases = mapping.len(), "Loaded authentication providers");
        Ok(())
    }

    /// Set the provider list for a single database.
    ///
    /// Fails if the database already has a non-empty list. An empty list
    /// may be replaced.
    pub fn set_providers(
        &self,
        database: &str,
        providers: &[Arc<dyn AuthProvider>],
    ) -> Result<(), RegistryError> {
        let mut databases = self.databases.write();
        store(&mut databases, database, providers)
    }

    /// Set a single provider for a database
    pub fn set_provider(
        &self,
        database: &str,
        provider: Arc<dyn AuthProvider>,
    ) -> Result<(), RegistryError> {
        self.set_providers(database, &[provider])
    }

    /// Drop every registration, re-opening the registry for loading.
    ///
    /// Administrative/test use only; logins racing with this see either the
    /// old list or no list at all.
    pub fn clear(&self) {
        let mut databases = self.databases.write();
        let count = databases.len();
        databases.clear();
        info!(databases = count, "Cleared authentication provider registry");
    }

    // =========== Lookup ===========

    /// Get the provider list for a database.
    ///
    /// `None` if the database was never registered. A database registered
    /// with an empty list yields an empty snapshot.
    pub fn lookup(&self, database: &str) -> Option<ProviderList> {
        self.databases.read().get(database).cloned()
    }

    /// Check if a database has been registered (even with an empty list)
    pub fn contains(&self, database: &str) -> bool {
        self.databases.read().contains_key(database)
    }

    /// Registered database ids, sorted
    pub fn databases(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.databases.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of registered databases
    pub fn len(&self) -> usize {
        self.databases.read().len()
    }

    /// True when no database is registered, not even with an empty list
    pub fn is_empty(&self) -> bool {
        self.databases.read().is_empty()
    }

    /// True once any database has a non-empty list; bulk loading is then refused
    pub fn is_initialized(&self) -> bool {
        first_initialized(&self.databases.read()).is_some()
    }
}

/// Smallest database id holding a non-empty list, if any
fn first_initialized(databases: &HashMap<String, ProviderList>) -> Option<&str> {
    databases
        .iter()
        .filter(|(_, providers)| !providers.is_empty())
        .map(|(database, _)| database.as_str())
        .min()
}

/// Guarded, copying insert shared by `bulk_load` and `set_providers`
fn store(
    databases: &mut HashMap<String, ProviderList>,
    database: &str,
    providers: &[Arc<dyn AuthProvider>],
) -> Result<(), RegistryError> {
    if databases.get(database).is_some_and(|existing| !existing.is_empty()) {
        return Err(RegistryError::AlreadyInitialized(database.to_string()));
    }

    debug!(
        database,
        providers = ?providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
        "Registering authentication providers"
    );
    databases.insert(database.to_string(), Arc::from(providers));
    Ok(())
}

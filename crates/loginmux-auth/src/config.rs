//! Deployment configuration
//!
//! Describes, per database, the ordered list of providers to register at
//! startup. Builtin providers are constructed directly; anything else is
//! built by a host-supplied [`ProviderFactory`] looked up by name in a
//! [`ProviderCatalog`].
//!
//! ```toml
//! [logging]
//! level = "info"
//!
//! [[databases.acct.providers]]
//! kind = "static"
//! name = "local-users"
//! [databases.acct.providers.users.alice]
//! password = "s3cret"
//! roles = ["admin"]
//!
//! [[databases.acct.providers]]
//! kind = "external"
//! name = "corp-ldap"
//! factory = "ldap"
//! [databases.acct.providers.options]
//! url = "ldap://ldap.internal"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::error::ConfigError;
use crate::provider::{AuthProvider, Grant};
use crate::providers::{
    AllowAllProvider, DenyAllProvider, StaticProvider, StaticUser, UnavailableProvider,
};
use crate::registry::ProviderRegistry;

/// Provider lists keyed by database id, ready for [`ProviderRegistry::bulk_load`]
pub type ProviderMap = HashMap<String, Vec<Arc<dyn AuthProvider>>>;

/// Error returned by a [`ProviderFactory`]
pub type FactoryError = Box<dyn std::error::Error + Send + Sync>;

/// Root configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Provider lists by database id
    #[serde(default)]
    pub databases: BTreeMap<String, DatabaseConfig>,
}

/// Logging configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Providers for one database, in trial order
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

/// One provider entry, tagged by `kind`
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Grant every login
    AllowAll {
        name: Option<String>,
        roles: Option<Vec<String>>,
    },
    /// Deny every login
    DenyAll {
        name: Option<String>,
        reason: Option<String>,
    },
    /// Fault on every login
    Unavailable {
        name: Option<String>,
        message: Option<String>,
    },
    /// In-memory user table
    Static {
        name: Option<String>,
        #[serde(default)]
        users: HashMap<String, StaticUser>,
    },
    /// Built by a host-registered factory
    External {
        name: Option<String>,
        factory: String,
        #[serde(default)]
        options: toml::Table,
    },
}

impl ProviderConfig {
    /// Name the provider will be registered under
    pub fn name(&self) -> &str {
        match self {
            Self::AllowAll { name, .. } => name.as_deref().unwrap_or("allow_all"),
            Self::DenyAll { name, .. } => name.as_deref().unwrap_or("deny_all"),
            Self::Unavailable { name, .. } => name.as_deref().unwrap_or("unavailable"),
            Self::Static { name, .. } => name.as_deref().unwrap_or("static"),
            Self::External { name, factory, .. } => name.as_deref().unwrap_or(factory),
        }
    }

    /// The `kind` tag as written in the config file
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AllowAll { .. } => "allow_all",
            Self::DenyAll { .. } => "deny_all",
            Self::Unavailable { .. } => "unavailable",
            Self::Static { .. } => "static",
            Self::External { .. } => "external",
        }
    }

    fn build(
        &self,
        database: &str,
        catalog: &ProviderCatalog,
    ) -> Result<Arc<dyn AuthProvider>, ConfigError> {
        let name = self.name();
        let provider: Arc<dyn AuthProvider> = match self {
            Self::AllowAll { roles, .. } => {
                Arc::new(AllowAllProvider::new(name).with_grant(Grant::from(roles.clone())))
            }
            Self::DenyAll { reason, .. } => Arc::new(DenyAllProvider::new(
                name,
                reason.as_deref().unwrap_or("access denied"),
            )),
            Self::Unavailable { message, .. } => Arc::new(UnavailableProvider::new(
                name,
                message.as_deref().unwrap_or("provider unavailable"),
            )),
            Self::Static { users, .. } => Arc::new(StaticProvider::with_users(name, users.clone())),
            Self::External {
                factory, options, ..
            } => {
                let builder = catalog.get(factory).ok_or_else(|| ConfigError::UnknownFactory {
                    database: database.to_string(),
                    factory: factory.clone(),
                })?;
                builder
                    .create(name, options)
                    .map_err(|e| ConfigError::Factory {
                        factory: factory.clone(),
                        message: e.to_string(),
                    })?
            }
        };
        Ok(provider)
    }
}

impl AuthConfig {
    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Read and parse a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Construct every configured provider, preserving list order
    pub fn build(&self, catalog: &ProviderCatalog) -> Result<ProviderMap, ConfigError> {
        let mut providers = ProviderMap::with_capacity(self.databases.len());
        for (database, db_config) in &self.databases {
            let list = db_config
                .providers
                .iter()
                .map(|provider| provider.build(database, catalog))
                .collect::<Result<Vec<_>, _>>()?;
            providers.insert(database.clone(), list);
        }
        Ok(providers)
    }
}

/// Builds host-specific providers from their `options` table
pub trait ProviderFactory: Send + Sync {
    fn create(
        &self,
        name: &str,
        options: &toml::Table,
    ) -> Result<Arc<dyn AuthProvider>, FactoryError>;
}

impl<F> ProviderFactory for F
where
    F: Fn(&str, &toml::Table) -> Result<Arc<dyn AuthProvider>, FactoryError> + Send + Sync,
{
    fn create(
        &self,
        name: &str,
        options: &toml::Table,
    ) -> Result<Arc<dyn AuthProvider>, FactoryError> {
        self(name, options)
    }
}

/// Named provider factories available to `kind = "external"` entries
#[derive(Default)]
pub struct ProviderCatalog {
    factories: HashMap<String, Arc<dyn ProviderFactory>>,
}

impl ProviderCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`, replacing any previous one
    pub fn register<F: ProviderFactory + 'static>(
        &mut self,
        name: impl Into<String>,
        factory: F,
    ) -> &mut Self {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    /// Look up a factory
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ProviderFactory>> {
        self.factories.get(name)
    }

    /// Registered factory names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl ProviderRegistry {
    /// Build every provider in `config` and bulk-load the result.
    ///
    /// Nothing is registered if any provider fails to build.
    pub fn load_config(
        &self,
        config: &AuthConfig,
        catalog: &ProviderCatalog,
    ) -> Result<(), ConfigError> {
        let providers = config.build(catalog)?;
        self.bulk_load(&providers)?;
        info!(
            databases = providers.len(),
            "Authentication providers loaded from configuration"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::AuthDispatcher;
    use crate::error::{AuthError, RegistryError};
    use std::io::Write;

    const SAMPLE: &str = r#"
[logging]
level = "debug"

[[databases.acct.providers]]
kind = "unavailable"
name = "primary-ldap"
message = "net-down"

[[databases.acct.providers]]
kind = "static"
name = "local"
[databases.acct.providers.users.alice]
password = "s3cret"
roles = ["admin"]
[databases.acct.providers.users.bob]
password = "hunter2"

[[databases.acct.providers]]
kind = "allow_all"

[[databases.reports.providers]]
kind = "deny_all"
reason = "reports are closed"
"#;

    fn names(registry: &ProviderRegistry, database: &str) -> Vec<String> {
        registry
            .lookup(database)
            .unwrap()
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    #[test]
    fn test_parse_sample() {
        let config = AuthConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.databases.len(), 2);

        let acct = &config.databases["acct"];
        assert_eq!(acct.providers.len(), 3);
        assert_eq!(acct.providers[0].name(), "primary-ldap");
        assert_eq!(acct.providers[1].name(), "local");
        assert_eq!(acct.providers[2].name(), "allow_all");
        assert_eq!(acct.providers[0].kind(), "unavailable");
        assert_eq!(acct.providers[1].kind(), "static");
        assert_eq!(config.databases["reports"].providers[0].kind(), "deny_all");
    }

    #[test]
    fn test_defaults() {
        let config = AuthConfig::from_toml_str("").unwrap();
        assert_eq!(config.logging.level, "info");
        assert!(config.databases.is_empty());
    }

    #[test]
    fn test_unknown_kind_is_parse_error() {
        let result = AuthConfig::from_toml_str(
            r#"
[[databases.acct.providers]]
kind = "kerberos"
"#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_and_dispatch() {
        let config = AuthConfig::from_toml_str(SAMPLE).unwrap();
        let registry = Arc::new(ProviderRegistry::new());
        registry.load_config(&config, &ProviderCatalog::new()).unwrap();

        assert_eq!(registry.databases(), vec!["acct", "reports"]);
        assert_eq!(
            names(&registry, "acct"),
            vec!["primary-ldap", "local", "allow_all"]
        );

        let dispatcher = AuthDispatcher::new(registry);

        // primary-ldap faults, local grants
        assert_eq!(
            dispatcher.authenticate("acct", "alice", "s3cret"),
            Ok(Grant::roles(["admin"]))
        );
        assert_eq!(
            dispatcher.authenticate("acct", "bob", "hunter2"),
            Ok(Grant::DefaultRoles)
        );

        // local denies; allow_all is never reached
        let err = dispatcher.authenticate("acct", "alice", "wrong").unwrap_err();
        assert!(err.is_denial());
        assert_eq!(err.provider(), Some("local"));

        let err = dispatcher.authenticate("reports", "alice", "s3cret").unwrap_err();
        assert_eq!(
            err,
            AuthError::Denied {
                provider: "deny_all".into(),
                reason: "reports are closed".into()
            }
        );
    }

    #[test]
    fn test_external_provider_factory() {
        let config = AuthConfig::from_toml_str(
            r#"
[[databases.acct.providers]]
kind = "external"
name = "corp-ldap"
factory = "ldap"
[databases.acct.providers.options]
role = "analyst"
"#,
        )
        .unwrap();

        // Stand-in for a directory-backed provider: grants the configured role
        fn fake_ldap(
            name: &str,
            options: &toml::Table,
        ) -> Result<Arc<dyn AuthProvider>, FactoryError> {
            let role = options
                .get("role")
                .and_then(toml::Value::as_str)
                .ok_or("missing 'role' option")?;
            Ok(Arc::new(
                AllowAllProvider::new(name).with_grant(Grant::roles([role])),
            ))
        }

        let mut catalog = ProviderCatalog::new();
        catalog.register("ldap", fake_ldap);
        assert_eq!(catalog.names(), vec!["ldap"]);

        let registry = Arc::new(ProviderRegistry::new());
        registry.load_config(&config, &catalog).unwrap();
        assert_eq!(names(&registry, "acct"), vec!["corp-ldap"]);

        let dispatcher = AuthDispatcher::new(registry);
        assert_eq!(
            dispatcher.authenticate("acct", "u", "p"),
            Ok(Grant::roles(["analyst"]))
        );
    }

    #[test]
    fn test_unknown_factory() {
        let config = AuthConfig::from_toml_str(
            r#"
[[databases.acct.providers]]
kind = "allow_all"

[[databases.acct.providers]]
kind = "external"
factory = "radius"
"#,
        )
        .unwrap();

        let registry = ProviderRegistry::new();
        let result = registry.load_config(&config, &ProviderCatalog::new());
        assert!(matches!(
            result,
            Err(ConfigError::UnknownFactory { ref database, ref factory })
                if database == "acct" && factory == "radius"
        ));
        // Nothing was registered
        assert!(registry.lookup("acct").is_none());
    }

    #[test]
    fn test_factory_failure() {
        let config = AuthConfig::from_toml_str(
            r#"
[[databases.acct.providers]]
kind = "external"
factory = "ldap"
"#,
        )
        .unwrap();

        let mut catalog = ProviderCatalog::new();
        catalog.register(
            "ldap",
            |_: &str, _: &toml::Table| -> Result<Arc<dyn AuthProvider>, FactoryError> {
                Err("missing 'url' option".into())
            },
        );

        let result = ProviderRegistry::new().load_config(&config, &catalog);
        match result {
            Err(ConfigError::Factory { factory, message }) => {
                assert_eq!(factory, "ldap");
                assert_eq!(message, "missing 'url' option");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_load_config_twice_fails() {
        let config = AuthConfig::from_toml_str(SAMPLE).unwrap();
        let registry = ProviderRegistry::new();
        registry.load_config(&config, &ProviderCatalog::new()).unwrap();

        let result = registry.load_config(&config, &ProviderCatalog::new());
        assert!(matches!(
            result,
            Err(ConfigError::Registry(RegistryError::AlreadyInitialized(_)))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = AuthConfig::load(file.path()).unwrap();
        assert_eq!(config.databases.len(), 2);

        let missing = AuthConfig::load(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}

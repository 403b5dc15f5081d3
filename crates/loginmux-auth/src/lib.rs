//! loginmux authentication dispatch
//!
//! This crate provides:
//! - A write-once registry of authentication providers per database
//! - An ordered-trial dispatcher for database logins
//! - Builtin in-process providers and a TOML deployment configuration
//!
//! # Example
//!
//! ```rust
//! use loginmux_auth::{
//!     AuthDispatcher, AuthProvider, DenyAllProvider, Grant, ProviderRegistry, StaticProvider,
//!     StaticUser,
//! };
//! use std::sync::Arc;
//!
//! let local = StaticProvider::new("local");
//! local.upsert_user("alice", StaticUser::new("s3cret").with_roles(["admin"]));
//!
//! let local: Arc<dyn AuthProvider> = Arc::new(local);
//! let fallback: Arc<dyn AuthProvider> = Arc::new(DenyAllProvider::new("fallback", "unknown user"));
//!
//! let registry = Arc::new(ProviderRegistry::new());
//! registry.set_providers("acct", &[local, fallback]).unwrap();
//!
//! let dispatcher = AuthDispatcher::new(registry);
//! assert_eq!(
//!     dispatcher.authenticate("acct", "alice", "s3cret"),
//!     Ok(Grant::roles(["admin"]))
//! );
//! assert!(dispatcher.authenticate("acct", "alice", "wrong").unwrap_err().is_denial());
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod provider;
pub mod providers;
pub mod registry;

#[cfg(test)]
mod testing;

pub use config::{AuthConfig, FactoryError, ProviderCatalog, ProviderConfig, ProviderFactory};
pub use dispatcher::AuthDispatcher;
pub use error::{AuthError, AuthErrorKind, ConfigError, ProviderError, RegistryError};
pub use provider::{AuthProvider, Grant};
pub use providers::{
    AllowAllProvider, DenyAllProvider, StaticProvider, StaticUser, UnavailableProvider,
};
pub use registry::{ProviderList, ProviderRegistry};

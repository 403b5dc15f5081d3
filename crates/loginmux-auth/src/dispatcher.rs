//! Ordered-trial login dispatch
//!
//! Providers registered for a database are tried strictly in registration
//! order:
//! - the first grant wins and later providers are never consulted;
//! - a denial is authoritative and ends the attempt;
//! - a fault is remembered (first one only) and the next provider is tried.
//!
//! If every provider faults, the earliest fault is reported.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{AuthError, ProviderError};
use crate::provider::Grant;
use crate::registry::ProviderRegistry;

/// Host entry point for database logins
#[derive(Clone)]
pub struct AuthDispatcher {
    registry: Arc<ProviderRegistry>,
}

impl AuthDispatcher {
    /// Create a dispatcher over a shared registry
    pub const fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    /// Get a reference to the registry
    pub const fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Authenticate `user` against `database`
    pub fn authenticate(
        &self,
        database: &str,
        user: &str,
        password: &str,
    ) -> Result<Grant, AuthError> {
        let providers = self
            .registry
            .lookup(database)
            .filter(|providers| !providers.is_empty())
            .ok_or_else(|| AuthError::UnconfiguredDatabase(database.to_string()))?;

        let mut first_fault: Option<AuthError> = None;

        for provider in providers.iter() {
            debug!(database, user, provider = provider.name(), "Trying authentication provider");

            match provider.authenticate(database, user, password) {
                Ok(grant) => {
                    debug!(database, user, provider = provider.name(), %grant, "Access granted");
                    return Ok(grant);
                }
                Err(ProviderError::Denied { reason }) => {
                    debug!(database, user, provider = provider.name(), %reason, "Access denied");
                    return Err(AuthError::Denied {
                        provider: provider.name().to_string(),
                        reason,
                    });
                }
                Err(ProviderError::Fault { message }) => {
                    warn!(
                        database,
                        user,
                        provider = provider.name(),
                        %message,
                        "Authentication provider failed, trying next"
                    );
                    if first_fault.is_none() {
                        first_fault = Some(AuthError::Fault {
                            provider: provider.name().to_string(),
                            message,
                        });
                    }
                }
            }
        }

        // The list is non-empty and nothing returned early, so every provider faulted
        Err(first_fault.unwrap_or_else(|| AuthError::UnconfiguredDatabase(database.to_string())))
    }
}

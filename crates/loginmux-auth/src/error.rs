//! Error types for the login path
//!
//! Three layers of failure exist:
//! - [`ProviderError`] is what a single provider reports back to the dispatcher.
//! - [`AuthError`] is what the dispatcher reports to the host login path.
//! - [`RegistryError`] and [`ConfigError`] cover startup/configuration mistakes.

use thiserror::Error;

/// Failure signalled by a single authentication provider
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The credential was actively rejected. Authoritative: the dispatcher
    /// stops and does not consult any further provider.
    #[error("access denied: {reason}")]
    Denied { reason: String },

    /// The provider could not render a judgment (backing service down,
    /// misconfiguration, bug). The dispatcher moves on to the next provider.
    #[error("provider fault: {message}")]
    Fault { message: String },
}

impl ProviderError {
    /// Create a denial
    pub fn denied(reason: impl Into<String>) -> Self {
        Self::Denied {
            reason: reason.into(),
        }
    }

    /// Create an internal fault
    pub fn fault(message: impl Into<String>) -> Self {
        Self::Fault {
            message: message.into(),
        }
    }

    /// Check if this is an authoritative denial
    #[must_use]
    pub const fn is_denial(&self) -> bool {
        matches!(self, Self::Denied { .. })
    }

    /// Check if this is a provider malfunction
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        matches!(self, Self::Fault { .. })
    }
}

/// Registry mutation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The database already has a non-empty provider list, or a bulk load
    /// was attempted on a registry that is not empty.
    #[error("authentication providers already initialized for database '{0}'")]
    AlreadyInitialized(String),
}

/// Coarse classification of a failed login, for host-side logging and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// Deployment mistake (no providers for the database)
    Configuration,
    /// A provider rejected the credential
    Denied,
    /// No provider was able to render a judgment
    SystemError,
}

/// Login failure as seen by the host
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no authentication providers configured for database '{0}'")]
    UnconfiguredDatabase(String),

    #[error("access denied by provider '{provider}': {reason}")]
    Denied { provider: String, reason: String },

    #[error("authentication system error in provider '{provider}': {message}")]
    Fault { provider: String, message: String },
}

impl AuthError {
    /// Wrap a provider's failure, tagging it with the provider name
    pub fn from_provider(provider: impl Into<String>, error: ProviderError) -> Self {
        let provider = provider.into();
        match error {
            ProviderError::Denied { reason } => Self::Denied { provider, reason },
            ProviderError::Fault { message } => Self::Fault { provider, message },
        }
    }

    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> AuthErrorKind {
        match self {
            Self::UnconfiguredDatabase(_) => AuthErrorKind::Configuration,
            Self::Denied { .. } => AuthErrorKind::Denied,
            Self::Fault { .. } => AuthErrorKind::SystemError,
        }
    }

    /// Check if a provider rejected the credential
    #[must_use]
    pub const fn is_denial(&self) -> bool {
        matches!(self, Self::Denied { .. })
    }

    /// Check if every consulted provider faulted
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        matches!(self, Self::Fault { .. })
    }

    /// Check if this is a deployment/configuration error
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::UnconfiguredDatabase(_))
    }

    /// Name of the provider that produced the outcome, if any
    #[must_use]
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::UnconfiguredDatabase(_) => None,
            Self::Denied { provider, .. } | Self::Fault { provider, .. } => Some(provider),
        }
    }

    /// Message the host should surface to the connecting client.
    ///
    /// Provider details stay in the server log.
    #[must_use]
    pub const fn host_message(&self) -> &'static str {
        match self.kind() {
            AuthErrorKind::Denied => "access denied",
            AuthErrorKind::Configuration | AuthErrorKind::SystemError => {
                "authentication system error"
            }
        }
    }
}

/// Errors raised while loading a deployment configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("database '{database}' references unknown provider factory '{factory}'")]
    UnknownFactory { database: String, factory: String },

    #[error("provider factory '{factory}' failed: {message}")]
    Factory { factory: String, message: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

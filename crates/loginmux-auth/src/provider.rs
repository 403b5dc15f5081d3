//! Pluggable authentication provider trait and types
//!
//! A provider is a black box that decides one login attempt for one
//! database. It either grants access, denies it, or reports that it could
//! not decide (a fault). Concrete providers backed by directory services,
//! remote databases and the like live outside this crate and implement
//! [`AuthProvider`].

use std::fmt;

use crate::error::ProviderError;

/// Successful authentication outcome
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Grant {
    /// Access granted; the host applies its own default-role policy
    #[default]
    DefaultRoles,
    /// Access granted with exactly these roles (possibly none), in order
    Roles(Vec<String>),
}

impl Grant {
    /// Grant with an explicit role list
    pub fn roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Roles(roles.into_iter().map(Into::into).collect())
    }

    /// Grant explicitly with no roles
    #[must_use]
    pub const fn no_roles() -> Self {
        Self::Roles(Vec::new())
    }

    /// Explicit role list, or `None` when the host default applies
    #[must_use]
    pub fn role_list(&self) -> Option<&[String]> {
        match self {
            Self::DefaultRoles => None,
            Self::Roles(roles) => Some(roles),
        }
    }

    /// Convert into the nullable-list form used at the host boundary
    #[must_use]
    pub fn into_roles(self) -> Option<Vec<String>> {
        match self {
            Self::DefaultRoles => None,
            Self::Roles(roles) => Some(roles),
        }
    }
}

impl From<Option<Vec<String>>> for Grant {
    fn from(roles: Option<Vec<String>>) -> Self {
        roles.map_or(Self::DefaultRoles, Self::Roles)
    }
}

impl From<Grant> for Option<Vec<String>> {
    fn from(grant: Grant) -> Self {
        grant.into_roles()
    }
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DefaultRoles => f.write_str("<default>"),
            Self::Roles(roles) => write!(f, "[{}]", roles.join(", ")),
        }
    }
}

/// Trait for pluggable authentication providers
///
/// Called synchronously on the host's login thread. Implementations that
/// talk to remote services own their timeout policy; the dispatcher waits
/// for as long as `authenticate` takes.
pub trait AuthProvider: Send + Sync {
    /// Provider name for logging and error reports
    fn name(&self) -> &str;

    /// Decide a single login attempt.
    ///
    /// Return [`ProviderError::Denied`] when the credential is known to be
    /// invalid and [`ProviderError::Fault`] when no judgment could be made.
    fn authenticate(
        &self,
        database: &str,
        user: &str,
        password: &str,
    ) -> Result<Grant, ProviderError>;
}

impl fmt::Debug for dyn AuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthProvider")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

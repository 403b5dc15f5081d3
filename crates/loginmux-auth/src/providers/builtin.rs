//! Builtin in-process providers
//!
//! Fixed-outcome providers for wiring up deployments and smoke tests, plus
//! [`StaticProvider`], a small in-memory user table.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ProviderError;
use crate::provider::{AuthProvider, Grant};

/// Grants every login, optionally with a fixed role list
pub struct AllowAllProvider {
    name: String,
    grant: Grant,
}

impl AllowAllProvider {
    /// Grant with the host's default roles
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            grant: Grant::DefaultRoles,
        }
    }

    /// Grant with a fixed role list
    #[must_use]
    pub fn with_grant(mut self, grant: Grant) -> Self {
        self.grant = grant;
        self
    }
}

impl AuthProvider for AllowAllProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn authenticate(
        &self,
        _database: &str,
        _user: &str,
        _password: &str,
    ) -> Result<Grant, ProviderError> {
        Ok(self.grant.clone())
    }
}

/// Denies every login
pub struct DenyAllProvider {
    name: String,
    reason: String,
}

impl DenyAllProvider {
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl AuthProvider for DenyAllProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn authenticate(
        &self,
        _database: &str,
        _user: &str,
        _password: &str,
    ) -> Result<Grant, ProviderError> {
        Err(ProviderError::denied(self.reason.clone()))
    }
}

/// Always faults; stands in for a provider whose backend is down
pub struct UnavailableProvider {
    name: String,
    message: String,
}

impl UnavailableProvider {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl AuthProvider for UnavailableProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn authenticate(
        &self,
        _database: &str,
        _user: &str,
        _password: &str,
    ) -> Result<Grant, ProviderError> {
        Err(ProviderError::fault(self.message.clone()))
    }
}

/// Entry in a [`StaticProvider`] user table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticUser {
    /// Plain-text password
    pub password: String,
    /// Roles to grant; `None` leaves role selection to the host
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

impl StaticUser {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            roles: None,
        }
    }

    /// Set roles granted on login
    #[must_use]
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = Some(roles.into_iter().map(Into::into).collect());
        self
    }
}

/// In-memory user table
///
/// Unknown users and wrong passwords are denials: this provider is the
/// authority for the users it is configured with.
pub struct StaticProvider {
    name: String,
    /// Users indexed by user name
    users: RwLock<HashMap<String, StaticUser>>,
}

impl StaticProvider {
    /// Create a provider with an empty user table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Create a provider from an existing user table
    pub fn with_users(name: impl Into<String>, users: HashMap<String, StaticUser>) -> Self {
        Self {
            name: name.into(),
            users: RwLock::new(users),
        }
    }

    /// Add or replace a user
    pub fn upsert_user(&self, user_name: impl Into<String>, user: StaticUser) {
        self.users.write().insert(user_name.into(), user);
    }

    /// Remove a user, returning whether it existed
    pub fn remove_user(&self, user_name: &str) -> bool {
        self.users.write().remove(user_name).is_some()
    }

    /// Number of users in the table
    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }
}

impl AuthProvider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn authenticate(
        &self,
        _database: &str,
        user: &str,
        password: &str,
    ) -> Result<Grant, ProviderError> {
        let users = self.users.read();
        let entry = users
            .get(user)
            .ok_or_else(|| ProviderError::denied(format!("unknown user '{user}'")))?;

        if !constant_time_eq(&entry.password, password) {
            return Err(ProviderError::denied(format!(
                "invalid password for user '{user}'"
            )));
        }

        Ok(Grant::from(entry.roles.clone()))
    }
}

/// Constant-time string comparison to prevent timing attacks
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

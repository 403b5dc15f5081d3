//! Scripted providers for unit tests

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::ProviderError;
use crate::provider::{AuthProvider, Grant};

/// Provider that returns a fixed outcome and counts how often it was asked
pub struct SpyProvider {
    name: String,
    outcome: Result<Grant, ProviderError>,
    calls: AtomicUsize,
}

impl SpyProvider {
    pub fn new(name: &str, outcome: Result<Grant, ProviderError>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            outcome,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn granting(name: &str, grant: Grant) -> Arc<Self> {
        Self::new(name, Ok(grant))
    }

    pub fn denying(name: &str, reason: &str) -> Arc<Self> {
        Self::new(name, Err(ProviderError::denied(reason)))
    }

    pub fn faulting(name: &str, message: &str) -> Arc<Self> {
        Self::new(name, Err(ProviderError::fault(message)))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AuthProvider for SpyProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn authenticate(
        &self,
        _database: &str,
        _user: &str,
        _password: &str,
    ) -> Result<Grant, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// Upcast a spy for registration
pub fn dyn_provider(spy: &Arc<SpyProvider>) -> Arc<dyn AuthProvider> {
    spy.clone()
}

//! Authentication provider implementations
//!
//! Only trivial in-process providers live here. Providers backed by
//! directory services or remote databases are supplied by the host through
//! [`crate::config::ProviderFactory`].

pub mod builtin;

pub use builtin::{AllowAllProvider, DenyAllProvider, StaticProvider, StaticUser, UnavailableProvider};

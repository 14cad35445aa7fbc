//! Authorization gate for bulk deletion
//!
//! A shared secret compared by plain equality. This only stops accidental
//! purges; anything needing real access control should replace
//! [`SharedSecretGate`] with a role-aware [`PurgeAuthorizer`].

use thiserror::Error;

/// Refusal to issue a purge grant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessDenied {
    #[error("incorrect delete password")]
    WrongSecret,

    #[error("bulk deletion is disabled: no delete password configured")]
    NotConfigured,
}

/// Capability to purge a repository. Only an authorizer can mint one.
#[derive(Debug)]
pub struct PurgeGrant {
    _private: (),
}

impl PurgeGrant {
    fn issue() -> Self {
        Self { _private: () }
    }
}

/// Decides whether a supplied credential may purge all records
pub trait PurgeAuthorizer: Send + Sync {
    fn authorize(&self, supplied: &str) -> Result<PurgeGrant, AccessDenied>;
}

/// Gate backed by a single configured secret (`DELETE_PASSWORD`)
#[derive(Clone, Default)]
pub struct SharedSecretGate {
    secret: Option<String>,
}

impl SharedSecretGate {
    /// A blank secret counts as not configured
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }
}

impl std::fmt::Debug for SharedSecretGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecretGate")
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl PurgeAuthorizer for SharedSecretGate {
    fn authorize(&self, supplied: &str) -> Result<PurgeGrant, AccessDenied> {
        match &self.secret {
            None => Err(AccessDenied::NotConfigured),
            Some(secret) if secret == supplied => Ok(PurgeGrant::issue()),
            Some(_) => Err(AccessDenied::WrongSecret),
        }
    }
}

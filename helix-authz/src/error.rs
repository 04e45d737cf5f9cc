//! Error types for authorization operations.

use helix_core::AccessError;
use std::fmt;

/// Errors raised by the catalog, registry, assignment store and resolver.
///
/// A failed lookup while answering a check is always [`AuthzError::Unavailable`].
/// The resolver never turns it into an allow or a deny.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// The row does not exist, or has been soft-deleted.
    NotFound(String),
    /// A write referenced a deleted permission or context, or a parent
    /// that does not fit the scope hierarchy.
    InvalidReference(String),
    /// Malformed input (empty title, empty key, ...).
    InvalidInput(String),
    /// A storage or membership lookup failed transiently.
    Unavailable(String),
    /// A storage write failed.
    Backend(String),
}

impl AuthzError {
    /// Reclassify any failure met while answering a check.
    pub(crate) fn unavailable(self) -> Self {
        match self {
            AuthzError::Unavailable(msg) | AuthzError::Backend(msg) => AuthzError::Unavailable(msg),
            other => other,
        }
    }
}

impl fmt::Display for AuthzError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthzError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AuthzError::InvalidReference(msg) => write!(f, "Invalid reference: {}", msg),
            AuthzError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AuthzError::Unavailable(msg) => write!(f, "Authorization service unavailable: {}", msg),
            AuthzError::Backend(msg) => write!(f, "Authorization storage error: {}", msg),
        }
    }
}

impl std::error::Error for AuthzError {}

impl From<AuthzError> for AccessError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotFound(msg) => AccessError::NotFound(msg),
            AuthzError::InvalidReference(msg) => AccessError::InvalidReference(msg),
            AuthzError::InvalidInput(msg) => AccessError::BadRequest(msg),
            AuthzError::Unavailable(msg) => AccessError::ServiceUnavailable(msg),
            AuthzError::Backend(msg) => AccessError::Internal(msg),
        }
    }
}

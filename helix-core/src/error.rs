//! Caller-facing error taxonomy.

use std::fmt;

/// A name that does not belong to a closed vocabulary (scope, level, resource type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidName {
    pub kind: &'static str,
    pub value: String,
}

impl InvalidName {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for InvalidName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for InvalidName {}

/// Outcome of a rejected access-layer operation.
///
/// Denials are reported as `Forbidden`, never as `NotFound`: hiding the
/// existence of an entity is left to the transport layer.
#[derive(Clone, PartialEq, Eq)]
pub enum AccessError {
    /// No authenticated actor.
    Unauthorized(String),
    /// The actor is known but the resolver denied the action.
    Forbidden(String),
    /// Entity or reference row absent or soft-deleted.
    NotFound(String),
    /// Write rejected because the entity moved past `expected`.
    Conflict {
        entity: String,
        expected: u64,
        actual: u64,
    },
    /// Authorization or membership lookup failed transiently.
    ServiceUnavailable(String),
    /// Assignment created against a deleted permission or context instance.
    InvalidReference(String),
    BadRequest(String),
    Internal(String),
}

impl AccessError {
    /// HTTP-equivalent status for transport layers.
    pub fn status_code(&self) -> u16 {
        match self {
            AccessError::Unauthorized(_) => 401,
            AccessError::Forbidden(_) => 403,
            AccessError::NotFound(_) => 404,
            AccessError::Conflict { .. } => 409,
            AccessError::ServiceUnavailable(_) => 503,
            AccessError::InvalidReference(_) => 422,
            AccessError::BadRequest(_) => 400,
            AccessError::Internal(_) => 500,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            AccessError::Unauthorized(_) => "UNAUTHORIZED",
            AccessError::Forbidden(_) => "FORBIDDEN",
            AccessError::NotFound(_) => "ENTITY_NOT_FOUND",
            AccessError::Conflict { .. } => "VERSION_CONFLICT",
            AccessError::ServiceUnavailable(_) => "PERMISSION_SERVICE_ERROR",
            AccessError::InvalidReference(_) => "INVALID_REFERENCE",
            AccessError::BadRequest(_) => "INVALID_DATA",
            AccessError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller may retry after re-reading (only version conflicts).
    pub fn is_conflict(&self) -> bool {
        matches!(self, AccessError::Conflict { .. })
    }

    /// JSON body `{ "error": message, "code": code }`, plus both versions on conflicts.
    pub fn to_body(&self) -> serde_json::Value {
        match self {
            AccessError::Conflict {
                entity,
                expected,
                actual,
            } => serde_json::json!({
                "error": format!("Version conflict on {entity}"),
                "code": self.code(),
                "expectedVersion": expected,
                "currentVersion": actual,
            }),
            other => serde_json::json!({
                "error": other.to_string(),
                "code": other.code(),
            }),
        }
    }
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            AccessError::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            AccessError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            AccessError::Conflict {
                entity,
                expected,
                actual,
            } => write!(
                f,
                "Version conflict on {entity}: expected version {expected}, current version {actual}"
            ),
            AccessError::ServiceUnavailable(msg) => write!(f, "Service Unavailable: {msg}"),
            AccessError::InvalidReference(msg) => write!(f, "Invalid Reference: {msg}"),
            AccessError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            AccessError::Internal(msg) => write!(f, "Internal Error: {msg}"),
        }
    }
}

impl fmt::Debug for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        <Self as fmt::Display>::fmt(self, f)
    }
}

impl std::error::Error for AccessError {}

impl From<InvalidName> for AccessError {
    fn from(err: InvalidName) -> Self {
        AccessError::BadRequest(err.to_string())
    }
}

//! Rows managed by the authorization directory.

use chrono::{DateTime, Utc};
use helix_core::{ContextScope, PermissionLevel};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A named, leveled capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub level: PermissionLevel,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub deleted: bool,
}

/// A concrete node of the scope hierarchy, e.g. project `HLX` under team `core`.
///
/// `parent_id` points at a strictly broader instance. Intermediate scopes may
/// be skipped: a project can hang directly off an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextInstance {
    pub id: String,
    pub scope: ContextScope,
    pub key: String,
    pub parent_id: Option<String>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub deleted: bool,
}

/// Who an assignment is granted to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Grantee {
    User(String),
    Team(String),
}

impl Grantee {
    pub fn user(id: impl Into<String>) -> Self {
        Grantee::User(id.into())
    }

    pub fn team(id: impl Into<String>) -> Self {
        Grantee::Team(id.into())
    }

    pub fn id(&self) -> &str {
        match self {
            Grantee::User(id) | Grantee::Team(id) => id,
        }
    }

    /// Whether `actor`, member of `teams`, is this grantee.
    pub fn covers(&self, actor: &str, teams: &HashSet<String>) -> bool {
        match self {
            Grantee::User(id) => id == actor,
            Grantee::Team(id) => teams.contains(id),
        }
    }
}

impl fmt::Display for Grantee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grantee::User(id) => write!(f, "user:{}", id),
            Grantee::Team(id) => write!(f, "team:{}", id),
        }
    }
}

/// A grant of one permission to a user or team at one context instance.
///
/// `granted_level` is the permission's level when the grant was made (or
/// last re-evaluated); later edits to the permission do not move it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: String,
    pub permission_id: String,
    pub grantee: Grantee,
    pub context_id: String,
    pub granted_level: PermissionLevel,
    pub created: DateTime<Utc>,
    pub revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Assignment {
    /// Live, held by the actor, and strong enough for `required`.
    pub fn grants(&self, actor: &str, teams: &HashSet<String>, required: PermissionLevel) -> bool {
        !self.revoked && self.granted_level.satisfies(required) && self.grantee.covers(actor, teams)
    }
}

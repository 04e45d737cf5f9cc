//! Context-scoped authorization for Helix.
//!
//! Permissions carry a level from the ordered ladder
//! `READ < CREATE < UPDATE < DELETE`. They are granted to users or teams at
//! concrete context instances (an account, an organization, a team, a
//! project), and a grant at a broad instance applies to everything beneath it.
//!
//! # Setup
//!
//! ```ignore
//! use helix_authz::{AccessDirectory, Grantee, StaticMembership};
//! use helix_core::{ContextScope, PermissionLevel};
//!
//! let (directory, _backend) = AccessDirectory::memory();
//!
//! let update = directory.permissions().create("UPDATE", None, PermissionLevel::Update).await?;
//! let org = directory.contexts().create(ContextScope::Organization, "acme", None).await?;
//! let team = directory.contexts().create(ContextScope::Team, "core", Some(&org.id)).await?;
//! let project = directory.contexts().create(ContextScope::Project, "HLX", Some(&team.id)).await?;
//!
//! directory.assignments().grant(&update.id, Grantee::team("core"), &team.id).await?;
//!
//! let membership = StaticMembership::new();
//! membership.add_member("core", "alice");
//!
//! let resolver = directory.resolver(membership);
//! assert!(resolver.check("alice", "ticket", &project.id, PermissionLevel::Update).await?);
//! assert!(!resolver.check("alice", "ticket", &project.id, PermissionLevel::Delete).await?);
//! ```
//!
//! # Architecture
//!
//! - **[`AccessDirectory`]**: clonable handle over an [`AccessBackend`] with an
//!   optional [`DecisionCache`](cache::DecisionCache). Hands out the
//!   [`PermissionCatalog`], [`ContextRegistry`] and [`AssignmentStore`], and
//!   builds resolvers.
//! - **[`AuthorizationResolver`]**: walks the context hierarchy upward and
//!   ORs direct and team grants. Denial is `Ok(false)`; lookup failures are
//!   [`AuthzError::Unavailable`].
//! - **[`VisibilityResolver`]**: owner, public flag and shares for
//!   dashboards, filters and boards.
//!
//! # Custom backends
//!
//! Implement [`AccessBackend`] to store rows elsewhere. `helix-data-sqlx`
//! provides a SQLite implementation.

pub mod assignment;
pub mod backend;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod context;
pub mod directory;
pub mod error;
pub mod membership;
pub mod model;
pub mod resolver;
pub mod visibility;

pub use assignment::AssignmentStore;
pub use backend::{AccessBackend, BackendFuture, MemoryBackend};
pub use catalog::{PermissionCatalog, PermissionUpdate};
pub use config::AuthzConfig;
pub use context::ContextRegistry;
pub use directory::AccessDirectory;
pub use error::AuthzError;
pub use membership::{MembershipProvider, StaticMembership};
pub use model::{Assignment, ContextInstance, Grantee, Permission};
pub use resolver::{AuthorizationResolver, Decision};
pub use visibility::{Share, ShareList, ShareTarget, Shareable, VisibilityResolver};

pub mod prelude {
    pub use crate::directory::AccessDirectory;
    pub use crate::error::AuthzError;
    pub use crate::model::Grantee;
    pub use crate::resolver::AuthorizationResolver;
    pub use crate::visibility::{ShareList, ShareTarget, Shareable, VisibilityResolver};
}

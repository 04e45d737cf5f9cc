//! Storage abstraction for the authorization directory.
//!
//! [`AccessBackend`] is the seam between the directory and its rows.
//! Implement it to plug in a database; validation, soft-delete rules and
//! caching live above it, in the catalog, registry and assignment store.
//!
//! Provided implementations:
//! - [`MemoryBackend`]: in-memory `DashMap` store, for tests and embedding
//! - `SqlxAccessBackend` in `helix-data-sqlx`: SQLite through sqlx

use crate::error::AuthzError;
use crate::model::{Assignment, ContextInstance, Permission};
use dashmap::DashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Boxed future returned by [`AccessBackend`] methods.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AuthzError>> + Send + 'a>>;

/// Row storage for permissions, context instances and assignments.
///
/// Reads return soft-deleted and revoked rows too; callers decide what
/// counts as live. `save_*` is an upsert keyed by id.
pub trait AccessBackend: Send + Sync + 'static {
    fn permission(&self, id: &str) -> BackendFuture<'_, Option<Permission>>;

    fn permissions(&self) -> BackendFuture<'_, Vec<Permission>>;

    fn save_permission(&self, permission: Permission) -> BackendFuture<'_, ()>;

    fn context(&self, id: &str) -> BackendFuture<'_, Option<ContextInstance>>;

    fn contexts(&self) -> BackendFuture<'_, Vec<ContextInstance>>;

    fn save_context(&self, context: ContextInstance) -> BackendFuture<'_, ()>;

    fn assignment(&self, id: &str) -> BackendFuture<'_, Option<Assignment>>;

    /// Every assignment attached to `context_id`.
    fn assignments_at(&self, context_id: &str) -> BackendFuture<'_, Vec<Assignment>>;

    /// Every assignment of `permission_id`.
    fn assignments_of(&self, permission_id: &str) -> BackendFuture<'_, Vec<Assignment>>;

    fn assignments(&self) -> BackendFuture<'_, Vec<Assignment>>;

    fn save_assignment(&self, assignment: Assignment) -> BackendFuture<'_, ()>;
}

// ── MemoryBackend ──────────────────────────────────────────────────────

/// In-memory backend.
///
/// Clones share the same maps, so a test can keep a handle after giving one
/// to [`AccessDirectory`](crate::AccessDirectory).
///
/// ```ignore
/// let backend = MemoryBackend::new();
/// let directory = AccessDirectory::new(backend.clone());
///
/// backend.set_unavailable(true);
/// assert!(directory.permissions().list().await.is_err());
/// ```
#[derive(Clone, Default)]
pub struct MemoryBackend {
    permissions: Arc<DashMap<String, Permission>>,
    contexts: Arc<DashMap<String, ContextInstance>>,
    assignments: Arc<DashMap<String, Assignment>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`AuthzError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn guard(&self) -> Result<(), AuthzError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(AuthzError::Unavailable("memory backend offline".into()))
        } else {
            Ok(())
        }
    }

    fn ready<T: Send + 'static>(&self, value: impl FnOnce() -> T) -> BackendFuture<'_, T> {
        let result = self.guard().map(|_| value());
        Box::pin(async move { result })
    }
}

impl AccessBackend for MemoryBackend {
    fn permission(&self, id: &str) -> BackendFuture<'_, Option<Permission>> {
        self.ready(|| self.permissions.get(id).map(|p| p.clone()))
    }

    fn permissions(&self) -> BackendFuture<'_, Vec<Permission>> {
        self.ready(|| self.permissions.iter().map(|p| p.clone()).collect())
    }

    fn save_permission(&self, permission: Permission) -> BackendFuture<'_, ()> {
        self.ready(|| {
            self.permissions.insert(permission.id.clone(), permission);
        })
    }

    fn context(&self, id: &str) -> BackendFuture<'_, Option<ContextInstance>> {
        self.ready(|| self.contexts.get(id).map(|c| c.clone()))
    }

    fn contexts(&self) -> BackendFuture<'_, Vec<ContextInstance>> {
        self.ready(|| self.contexts.iter().map(|c| c.clone()).collect())
    }

    fn save_context(&self, context: ContextInstance) -> BackendFuture<'_, ()> {
        self.ready(|| {
            self.contexts.insert(context.id.clone(), context);
        })
    }

    fn assignment(&self, id: &str) -> BackendFuture<'_, Option<Assignment>> {
        self.ready(|| self.assignments.get(id).map(|a| a.clone()))
    }

    fn assignments_at(&self, context_id: &str) -> BackendFuture<'_, Vec<Assignment>> {
        self.ready(|| {
            self.assignments
                .iter()
                .filter(|a| a.context_id == context_id)
                .map(|a| a.clone())
                .collect()
        })
    }

    fn assignments_of(&self, permission_id: &str) -> BackendFuture<'_, Vec<Assignment>> {
        self.ready(|| {
            self.assignments
                .iter()
                .filter(|a| a.permission_id == permission_id)
                .map(|a| a.clone())
                .collect()
        })
    }

    fn assignments(&self) -> BackendFuture<'_, Vec<Assignment>> {
        self.ready(|| self.assignments.iter().map(|a| a.clone()).collect())
    }

    fn save_assignment(&self, assignment: Assignment) -> BackendFuture<'_, ()> {
        self.ready(|| {
            self.assignments.insert(assignment.id.clone(), assignment);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use helix_core::PermissionLevel;

    fn permission(id: &str) -> Permission {
        let now = Utc::now();
        Permission {
            id: id.into(),
            title: "READ".into(),
            description: None,
            level: PermissionLevel::Read,
            created: now,
            modified: now,
            deleted: false,
        }
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let backend = MemoryBackend::new();
        let other = backend.clone();
        backend.save_permission(permission("p1")).await.unwrap();
        assert!(other.permission("p1").await.unwrap().is_some());
        assert!(other.permission("p2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unavailable_fails_every_call() {
        let backend = MemoryBackend::new();
        backend.set_unavailable(true);
        assert!(matches!(
            backend.permissions().await,
            Err(AuthzError::Unavailable(_))
        ));
        assert!(backend.save_permission(permission("p1")).await.is_err());
        backend.set_unavailable(false);
        assert!(backend.permissions().await.unwrap().is_empty());
    }
}

use helix_authz::{
    AccessBackend, AccessDirectory, Assignment, BackendFuture, ContextInstance, Grantee,
    MemoryBackend, Permission, StaticMembership,
};
use helix_core::{ContextScope, PermissionLevel};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Memory backend whose next `assignments_at` stops after reading its rows
/// until `resume` is notified.
#[derive(Clone, Default)]
struct StallingBackend {
    inner: MemoryBackend,
    armed: Arc<AtomicBool>,
    reached: Arc<Notify>,
    resume: Arc<Notify>,
}

impl StallingBackend {
    fn stall_next_read(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

impl AccessBackend for StallingBackend {
    fn permission(&self, id: &str) -> BackendFuture<'_, Option<Permission>> {
        self.inner.permission(id)
    }

    fn permissions(&self) -> BackendFuture<'_, Vec<Permission>> {
        self.inner.permissions()
    }

    fn save_permission(&self, permission: Permission) -> BackendFuture<'_, ()> {
        self.inner.save_permission(permission)
    }

    fn context(&self, id: &str) -> BackendFuture<'_, Option<ContextInstance>> {
        self.inner.context(id)
    }

    fn contexts(&self) -> BackendFuture<'_, Vec<ContextInstance>> {
        self.inner.contexts()
    }

    fn save_context(&self, context: ContextInstance) -> BackendFuture<'_, ()> {
        self.inner.save_context(context)
    }

    fn assignment(&self, id: &str) -> BackendFuture<'_, Option<Assignment>> {
        self.inner.assignment(id)
    }

    fn assignments_at(&self, context_id: &str) -> BackendFuture<'_, Vec<Assignment>> {
        let rows = self.inner.assignments_at(context_id);
        Box::pin(async move {
            let rows = rows.await?;
            if self.armed.swap(false, Ordering::SeqCst) {
                self.reached.notify_one();
                self.resume.notified().await;
            }
            Ok(rows)
        })
    }

    fn assignments_of(&self, permission_id: &str) -> BackendFuture<'_, Vec<Assignment>> {
        self.inner.assignments_of(permission_id)
    }

    fn assignments(&self) -> BackendFuture<'_, Vec<Assignment>> {
        self.inner.assignments()
    }

    fn save_assignment(&self, assignment: Assignment) -> BackendFuture<'_, ()> {
        self.inner.save_assignment(assignment)
    }
}

#[tokio::test]
async fn test_revoke_during_check_is_not_cached_as_allow() {
    let backend = StallingBackend::default();
    let directory = AccessDirectory::new(backend.clone()).with_cache(60);
    let project = directory
        .contexts()
        .create(ContextScope::Project, "HLX", None)
        .await
        .unwrap();
    let viewer = directory
        .permissions()
        .create("Viewer", None, PermissionLevel::Read)
        .await
        .unwrap();
    let grant = directory
        .assignments()
        .grant(&viewer.id, Grantee::user("alice"), &project.id)
        .await
        .unwrap();
    let resolver = directory.resolver(StaticMembership::new());

    backend.stall_next_read();
    let in_flight = tokio::spawn({
        let resolver = resolver.clone();
        let project = project.id.clone();
        async move {
            resolver
                .check("alice", "ticket", &project, PermissionLevel::Read)
                .await
        }
    });
    backend.reached.notified().await;
    directory.assignments().revoke(&grant.id).await.unwrap();
    backend.resume.notify_one();

    // The walk read the grant before the revoke landed.
    assert!(in_flight.await.unwrap().unwrap());
    assert_eq!(directory.cached_decisions(), 0);
    assert!(!resolver
        .check("alice", "ticket", &project.id, PermissionLevel::Read)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_decisions_are_cached_between_writes() {
    let (directory, _) = AccessDirectory::memory();
    let directory = directory.with_cache(60);
    let project = directory
        .contexts()
        .create(ContextScope::Project, "HLX", None)
        .await
        .unwrap();
    let resolver = directory.resolver(StaticMembership::new());

    assert!(!resolver
        .check("alice", "ticket", &project.id, PermissionLevel::Read)
        .await
        .unwrap());
    assert_eq!(directory.cached_decisions(), 1);

    directory
        .permissions()
        .create("Viewer", None, PermissionLevel::Read)
        .await
        .unwrap();
    assert_eq!(directory.cached_decisions(), 0);
}

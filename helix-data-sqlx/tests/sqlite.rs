#![cfg(feature = "sqlite")]

use helix_authz::{AccessDirectory, Grantee, StaticMembership};
use helix_core::{ContextScope, PermissionLevel};
use helix_data::{AuditAction, DataError, Fields, VersionedEntityController};
use helix_data_sqlx::{migrate_access, migrate_entity, SqlxAccessBackend, SqlxEntityStore};
use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

async fn pool() -> SqlitePool {
    // One long-lived connection: every `sqlite::memory:` connection is its own database.
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap()
}

fn title(value: &str) -> Fields {
    [("title".to_string(), json!(value))].into_iter().collect()
}

async fn tickets(pool: &SqlitePool) -> VersionedEntityController<SqlxEntityStore> {
    migrate_entity(pool, "ticket").await.unwrap();
    VersionedEntityController::new("ticket", SqlxEntityStore::new(pool.clone(), "ticket").unwrap())
}

#[tokio::test]
async fn test_entity_versions_and_history() {
    let pool = pool().await;
    let tickets = tickets(&pool).await;

    tickets.create("E", title(""), "alice").await.unwrap();
    let applied = tickets
        .apply_patch("E", Some(1), title("A"), "alice")
        .await
        .unwrap();
    assert_eq!(applied.version, 2);

    let stale = tickets.apply_patch("E", Some(1), title("B"), "bob").await;
    assert!(matches!(
        stale,
        Err(DataError::Conflict {
            expected: 1,
            actual: 2,
            ..
        })
    ));

    let record = tickets.get("E").await.unwrap();
    assert_eq!(record.version, 2);
    assert_eq!(record.field("title"), Some(&json!("A")));

    let history = tickets.history("E").await.unwrap();
    let versions: Vec<_> = history.iter().map(|a| a.version).collect();
    assert_eq!(versions, vec![1, 2]);
    assert_eq!(history[0].action, AuditAction::Create);
    assert_eq!(history[1].actor_id, "alice");
    assert_eq!(history[1].before, Some(title("")));
    assert_eq!(history[1].summary, "Entity updated: title changed");
}

#[tokio::test]
async fn test_duplicate_create_and_remove() {
    let pool = pool().await;
    let tickets = tickets(&pool).await;

    tickets.create("E", title("x"), "alice").await.unwrap();
    assert!(tickets
        .create("E", title("y"), "bob")
        .await
        .unwrap_err()
        .is_conflict());

    let removed = tickets.remove("E", Some(1), "alice").await.unwrap();
    assert_eq!(removed.version, 2);
    assert!(matches!(tickets.get("E").await, Err(DataError::NotFound(_))));

    let history = tickets.history("E").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].action, AuditAction::Remove);
    assert_eq!(history[1].after, None);
}

#[tokio::test]
async fn test_concurrent_writers_single_winner() {
    let pool = pool().await;
    let tickets = std::sync::Arc::new(tickets(&pool).await);
    tickets.create("E", title(""), "seed").await.unwrap();

    let mut handles = Vec::new();
    for i in 0..6 {
        let tickets = tickets.clone();
        handles.push(tokio::spawn(async move {
            tickets
                .apply_patch("E", Some(1), title(&format!("w{i}")), &format!("u{i}"))
                .await
        }));
    }
    let mut wins = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(e) => assert!(e.is_conflict(), "unexpected error: {e}"),
        }
    }
    assert_eq!(wins, 1);
    assert_eq!(tickets.history("E").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_rejects_unsafe_entity_type() {
    let pool = pool().await;
    assert!(SqlxEntityStore::new(pool.clone(), "ticket; DROP TABLE assignment").is_err());
    assert!(migrate_entity(&pool, "Ticket").await.is_err());
}

#[tokio::test]
async fn test_access_backend_round_trip() {
    let pool = pool().await;
    migrate_access(&pool).await.unwrap();
    let directory = AccessDirectory::new(SqlxAccessBackend::new(pool.clone()));

    let org = directory
        .contexts()
        .create(ContextScope::Organization, "acme", None)
        .await
        .unwrap();
    let project = directory
        .contexts()
        .create(ContextScope::Project, "apollo", Some(&org.id))
        .await
        .unwrap();
    let editor = directory
        .permissions()
        .create("Editor", Some("edits tickets"), PermissionLevel::Update)
        .await
        .unwrap();
    let grant = directory
        .assignments()
        .grant(&editor.id, Grantee::team("core"), &org.id)
        .await
        .unwrap();

    let loaded = directory.permissions().get(&editor.id).await.unwrap();
    assert_eq!(loaded.description.as_deref(), Some("edits tickets"));
    assert_eq!(loaded.level, PermissionLevel::Update);
    assert_eq!(
        directory.contexts().get(&project.id).await.unwrap().parent_id,
        Some(org.id.clone())
    );

    let membership = StaticMembership::new();
    membership.add_member("core", "alice");
    let resolver = directory.resolver(membership);
    assert!(resolver
        .check("alice", "ticket", &project.id, PermissionLevel::Update)
        .await
        .unwrap());
    assert!(!resolver
        .check("alice", "ticket", &project.id, PermissionLevel::Delete)
        .await
        .unwrap());

    let revoked = directory.assignments().revoke(&grant.id).await.unwrap();
    assert!(revoked.revoked_at.is_some());
    assert!(directory.assignments().get(&grant.id).await.unwrap().revoked);
    assert!(!resolver
        .check("alice", "ticket", &project.id, PermissionLevel::Read)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_soft_delete_persists() {
    let pool = pool().await;
    migrate_access(&pool).await.unwrap();
    let directory = AccessDirectory::new(SqlxAccessBackend::new(pool));

    let viewer = directory
        .permissions()
        .create("Viewer", None, PermissionLevel::Read)
        .await
        .unwrap();
    directory.permissions().remove(&viewer.id).await.unwrap();

    assert!(directory.permissions().list().await.unwrap().is_empty());
    let row = directory
        .backend()
        .permission(&viewer.id)
        .await
        .unwrap()
        .unwrap();
    assert!(row.deleted);
}

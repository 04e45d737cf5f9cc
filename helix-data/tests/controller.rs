use helix_data::{
    AuditAction, AuditRecord, DataError, EntityRecord, EntityStore, FieldChange, Fields,
    MemoryEntityStore, VersionedEntityController,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn fields(pairs: &[(&str, Value)]) -> Fields {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

async fn ticket() -> VersionedEntityController<MemoryEntityStore> {
    let controller = VersionedEntityController::new("ticket", MemoryEntityStore::new());
    controller
        .create("E", fields(&[("title", json!(""))]), "alice")
        .await
        .unwrap();
    controller
}

#[tokio::test]
async fn test_apply_then_stale_apply_conflicts() {
    let controller = ticket().await;

    let applied = controller
        .apply_patch("E", Some(1), fields(&[("title", json!("A"))]), "alice")
        .await
        .unwrap();
    assert_eq!(applied.version, 2);
    assert_eq!(applied.previous_version, 1);
    assert_eq!(
        applied.audit.changes.get("title"),
        Some(&FieldChange::Changed {
            field: "title".into(),
            from: json!(""),
            to: json!("A"),
        })
    );
    assert_eq!(applied.audit.summary, "Entity updated: title changed");

    let stale = controller
        .apply_patch("E", Some(1), fields(&[("title", json!("B"))]), "bob")
        .await;
    match stale {
        Err(DataError::Conflict {
            entity,
            expected,
            actual,
        }) => {
            assert_eq!(entity, "ticket E");
            assert_eq!((expected, actual), (1, 2));
        }
        other => panic!("expected conflict, got {other:?}"),
    }
    assert_eq!(
        controller.get("E").await.unwrap().field("title"),
        Some(&json!("A"))
    );
}

/// Lets another writer land between the controller's read and its
/// conditional write, once.
struct RacingStore {
    inner: MemoryEntityStore,
    rival: VersionedEntityController<MemoryEntityStore>,
    armed: AtomicBool,
}

impl RacingStore {
    fn new(inner: MemoryEntityStore) -> Self {
        Self {
            rival: VersionedEntityController::new("ticket", inner.clone()),
            inner,
            armed: AtomicBool::new(false),
        }
    }
}

impl EntityStore for RacingStore {
    async fn load(&self, id: &str) -> Result<Option<EntityRecord>, DataError> {
        self.inner.load(id).await
    }

    async fn insert(&self, record: &EntityRecord, audit: &AuditRecord) -> Result<bool, DataError> {
        self.inner.insert(record, audit).await
    }

    async fn compare_and_swap(
        &self,
        expected: u64,
        record: &EntityRecord,
        audit: &AuditRecord,
    ) -> Result<bool, DataError> {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.rival
                .apply_patch(&record.id, None, fields(&[("title", json!("rival"))]), "rival")
                .await?;
        }
        self.inner.compare_and_swap(expected, record, audit).await
    }

    async fn history(&self, id: &str) -> Result<Vec<AuditRecord>, DataError> {
        self.inner.history(id).await
    }
}

#[tokio::test]
async fn test_write_overtaken_after_version_check_conflicts() {
    let store = RacingStore::new(MemoryEntityStore::new());
    let controller = VersionedEntityController::new("ticket", store);
    controller
        .create("E", fields(&[("title", json!(""))]), "alice")
        .await
        .unwrap();
    controller.store().armed.store(true, Ordering::SeqCst);

    // The version check passes at 1, then the rival moves the record to 2.
    let result = controller
        .apply_patch("E", Some(1), fields(&[("title", json!("mine"))]), "alice")
        .await;
    match result {
        Err(DataError::Conflict {
            expected, actual, ..
        }) => assert_eq!((expected, actual), (1, 2)),
        other => panic!("expected conflict, got {other:?}"),
    }

    let record = controller.get("E").await.unwrap();
    assert_eq!(record.version, 2);
    assert_eq!(record.field("title"), Some(&json!("rival")));

    let history = controller.history("E").await.unwrap();
    let actors: Vec<_> = history.iter().map(|a| a.actor_id.as_str()).collect();
    assert_eq!(actors, ["alice", "rival"]);
    assert_eq!(history.last().map(|a| a.version), Some(2));
}

#[tokio::test]
async fn test_concurrent_writers_one_wins() {
    let controller = Arc::new(ticket().await);

    let mut handles = Vec::new();
    for i in 0..8 {
        let controller = controller.clone();
        handles.push(tokio::spawn(async move {
            controller
                .apply_patch(
                    "E",
                    Some(1),
                    fields(&[("title", json!(format!("writer {i}")))]),
                    &format!("actor-{i}"),
                )
                .await
        }));
    }

    let mut won = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(applied) => {
                assert_eq!(applied.version, 2);
                won += 1;
            }
            Err(DataError::Conflict {
                expected, actual, ..
            }) => {
                assert_eq!((expected, actual), (1, 2));
                conflicts += 1;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(won, 1);
    assert_eq!(conflicts, 7);

    let history = controller.history("E").await.unwrap();
    let versions: Vec<_> = history.iter().map(|r| r.version).collect();
    assert_eq!(versions, vec![1, 2]);
}

#[tokio::test]
async fn test_audit_matches_every_version() {
    let controller = ticket().await;
    controller
        .apply_patch(
            "E",
            None,
            fields(&[("title", json!("A")), ("due", json!("2026-11-01"))]),
            "alice",
        )
        .await
        .unwrap();
    let applied = controller
        .apply(
            "E",
            Some(2),
            |f| {
                f.remove("due");
                f.insert("tag".into(), json!("backend"));
            },
            "bob",
        )
        .await
        .unwrap();
    assert_eq!(
        applied.audit.summary,
        "Entity updated: due removed, tag added"
    );

    let history = controller.history("E").await.unwrap();
    assert_eq!(history.len(), 3);
    for (i, record) in history.iter().enumerate() {
        assert_eq!(record.version, i as u64 + 1);
        assert_eq!(record.entity_id, "E");
    }
    assert_eq!(history[0].action, AuditAction::Create);
    assert_eq!(history[1].changes.len(), 2);
    assert_eq!(history[1].actor_id, "alice");
    assert_eq!(history[2].actor_id, "bob");
    assert_eq!(
        history[2].after.as_ref().unwrap(),
        &fields(&[("title", json!("A")), ("tag", json!("backend"))])
    );
}

#[tokio::test]
async fn test_no_op_update_still_versions() {
    let controller = ticket().await;
    let applied = controller
        .apply_patch("E", Some(1), fields(&[("title", json!(""))]), "alice")
        .await
        .unwrap();
    assert_eq!(applied.version, 2);
    assert!(applied.audit.changes.is_empty());
    assert_eq!(
        applied.audit.summary,
        "Entity updated (no field changes detected)"
    );
}

#[tokio::test]
async fn test_patch_null_removes_field() {
    let controller = ticket().await;
    let applied = controller
        .apply_patch("E", None, fields(&[("title", Value::Null)]), "alice")
        .await
        .unwrap();
    assert!(applied.audit.after.unwrap().is_empty());
    assert_eq!(applied.audit.summary, "Entity updated: title removed");
}

#[tokio::test]
async fn test_missing_entity() {
    let controller = ticket().await;
    assert!(matches!(
        controller
            .apply_patch("nope", Some(1), Fields::new(), "alice")
            .await,
        Err(DataError::NotFound(_))
    ));
    assert!(matches!(
        controller.history("nope").await,
        Err(DataError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_remove() {
    let controller = ticket().await;
    assert!(controller.remove("E", Some(5), "alice").await.unwrap_err().is_conflict());

    let applied = controller.remove("E", Some(1), "alice").await.unwrap();
    assert_eq!(applied.version, 2);
    assert_eq!(applied.audit.action, AuditAction::Remove);
    assert_eq!(applied.audit.summary, "Entity deleted");
    assert!(applied.audit.after.is_none());

    assert!(matches!(
        controller.get("E").await,
        Err(DataError::NotFound(_))
    ));
    assert!(matches!(
        controller
            .apply_patch("E", None, fields(&[("title", json!("X"))]), "alice")
            .await,
        Err(DataError::NotFound(_))
    ));
    assert_eq!(controller.history("E").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_duplicate_create_conflicts() {
    let controller = ticket().await;
    let err = controller
        .create("E", Fields::new(), "alice")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DataError::Conflict {
            expected: 0,
            actual: 1,
            ..
        }
    ));
}

#[tokio::test]
async fn test_failed_write_leaves_prior_version() {
    let store = MemoryEntityStore::new();
    let controller = VersionedEntityController::new("ticket", store.clone());
    controller
        .create("E", fields(&[("title", json!(""))]), "alice")
        .await
        .unwrap();

    store.fail_writes(true);
    assert!(controller
        .apply_patch("E", Some(1), fields(&[("title", json!("A"))]), "alice")
        .await
        .is_err());
    store.fail_writes(false);

    let current = controller.get("E").await.unwrap();
    assert_eq!(current.version, 1);
    assert_eq!(current.field("title"), Some(&json!("")));
    assert_eq!(controller.history("E").await.unwrap().len(), 1);
}

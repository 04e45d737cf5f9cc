use helix_authz::{AccessDirectory, AuthzError, Grantee, PermissionUpdate};
use helix_core::{ContextScope, PermissionLevel};
use std::collections::HashSet;

#[tokio::test]
async fn test_permission_crud() {
    let (directory, _) = AccessDirectory::memory();
    let catalog = directory.permissions();

    let read = catalog
        .create("READ", Some("view anything"), PermissionLevel::Read)
        .await
        .unwrap();
    catalog
        .create("DELETE", None, PermissionLevel::Delete)
        .await
        .unwrap();
    assert_eq!(catalog.get(&read.id).await.unwrap().title, "READ");

    let titles: Vec<_> = catalog
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.title)
        .collect();
    assert_eq!(titles, vec!["DELETE", "READ"]);

    let renamed = catalog
        .update(
            &read.id,
            PermissionUpdate {
                title: Some("VIEW".into()),
                description: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.title, "VIEW");
    assert_eq!(renamed.description, None);

    catalog.remove(&read.id).await.unwrap();
    assert!(matches!(
        catalog.get(&read.id).await,
        Err(AuthzError::NotFound(_))
    ));
    assert!(matches!(
        catalog.remove(&read.id).await,
        Err(AuthzError::NotFound(_))
    ));
    assert_eq!(catalog.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_permission_title_required() {
    let (directory, _) = AccessDirectory::memory();
    let result = directory
        .permissions()
        .create("  ", None, PermissionLevel::Read)
        .await;
    assert!(matches!(result, Err(AuthzError::InvalidInput(_))));
}

#[tokio::test]
async fn test_context_parent_must_be_broader() {
    let (directory, _) = AccessDirectory::memory();
    let contexts = directory.contexts();
    let org = contexts
        .create(ContextScope::Organization, "acme", None)
        .await
        .unwrap();
    let project = contexts
        .create(ContextScope::Project, "HLX", Some(&org.id))
        .await
        .unwrap();

    for (scope, parent) in [
        (ContextScope::Team, &project.id),
        (ContextScope::Organization, &org.id),
        (ContextScope::Node, &org.id),
    ] {
        assert!(matches!(
            contexts.create(scope, "bad", Some(parent)).await,
            Err(AuthzError::InvalidReference(_))
        ));
    }
    assert!(matches!(
        contexts
            .create(ContextScope::Team, "core", Some("missing"))
            .await,
        Err(AuthzError::InvalidReference(_))
    ));
}

#[tokio::test]
async fn test_context_parent_must_be_live() {
    let (directory, _) = AccessDirectory::memory();
    let contexts = directory.contexts();
    let org = contexts
        .create(ContextScope::Organization, "acme", None)
        .await
        .unwrap();
    contexts.remove(&org.id).await.unwrap();
    assert!(matches!(
        contexts.create(ContextScope::Team, "core", Some(&org.id)).await,
        Err(AuthzError::InvalidReference(_))
    ));
}

#[tokio::test]
async fn test_context_navigation() {
    let (directory, _) = AccessDirectory::memory();
    let contexts = directory.contexts();
    let account = contexts
        .create(ContextScope::Account, "acct", None)
        .await
        .unwrap();
    let org = contexts
        .create(ContextScope::Organization, "acme", Some(&account.id))
        .await
        .unwrap();
    let team = contexts
        .create(ContextScope::Team, "core", Some(&org.id))
        .await
        .unwrap();
    let project = contexts
        .create(ContextScope::Project, "HLX", Some(&team.id))
        .await
        .unwrap();

    let chain: Vec<_> = contexts
        .ancestors(&project.id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.key)
        .collect();
    assert_eq!(chain, vec!["HLX", "core", "acme", "acct"]);

    let children = contexts.children(&org.id).await.unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].id, team.id);

    let projects = contexts.list(Some(ContextScope::Project)).await.unwrap();
    assert_eq!(projects.len(), 1);

    let renamed = contexts.rename(&project.id, "HELIX").await.unwrap();
    assert_eq!(renamed.key, "HELIX");
    assert!(matches!(
        contexts.rename(&project.id, "").await,
        Err(AuthzError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_grant_requires_live_references() {
    let (directory, _) = AccessDirectory::memory();
    let read = directory
        .permissions()
        .create("READ", None, PermissionLevel::Read)
        .await
        .unwrap();
    let project = directory
        .contexts()
        .create(ContextScope::Project, "HLX", None)
        .await
        .unwrap();
    let assignments = directory.assignments();

    assert!(matches!(
        assignments
            .grant("missing", Grantee::user("alice"), &project.id)
            .await,
        Err(AuthzError::NotFound(_))
    ));
    assert!(matches!(
        assignments
            .grant(&read.id, Grantee::user("alice"), "missing")
            .await,
        Err(AuthzError::NotFound(_))
    ));
    assert!(matches!(
        assignments
            .grant(&read.id, Grantee::user(""), &project.id)
            .await,
        Err(AuthzError::InvalidInput(_))
    ));

    directory.contexts().remove(&project.id).await.unwrap();
    assert!(matches!(
        assignments
            .grant(&read.id, Grantee::user("alice"), &project.id)
            .await,
        Err(AuthzError::InvalidReference(_))
    ));

    let other = directory
        .contexts()
        .create(ContextScope::Project, "OTHER", None)
        .await
        .unwrap();
    directory.permissions().remove(&read.id).await.unwrap();
    assert!(matches!(
        assignments
            .grant(&read.id, Grantee::user("alice"), &other.id)
            .await,
        Err(AuthzError::InvalidReference(_))
    ));
}

#[tokio::test]
async fn test_revoke_keeps_row() {
    let (directory, _) = AccessDirectory::memory();
    let read = directory
        .permissions()
        .create("READ", None, PermissionLevel::Read)
        .await
        .unwrap();
    let project = directory
        .contexts()
        .create(ContextScope::Project, "HLX", None)
        .await
        .unwrap();
    let assignments = directory.assignments();
    let grant = assignments
        .grant(&read.id, Grantee::team("core"), &project.id)
        .await
        .unwrap();
    assert_eq!(grant.granted_level, PermissionLevel::Read);

    let revoked = assignments.revoke(&grant.id).await.unwrap();
    assert!(revoked.revoked);
    assert!(revoked.revoked_at.is_some());
    assert!(assignments.get(&grant.id).await.unwrap().revoked);
    assert!(assignments.at_context(&project.id).await.unwrap().is_empty());
    assert!(matches!(
        assignments.revoke(&grant.id).await,
        Err(AuthzError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_effective_for() {
    let (directory, _) = AccessDirectory::memory();
    let read = directory
        .permissions()
        .create("READ", None, PermissionLevel::Read)
        .await
        .unwrap();
    let gone = directory
        .permissions()
        .create("GONE", None, PermissionLevel::Delete)
        .await
        .unwrap();
    let project = directory
        .contexts()
        .create(ContextScope::Project, "HLX", None)
        .await
        .unwrap();
    let assignments = directory.assignments();
    let direct = assignments
        .grant(&read.id, Grantee::user("alice"), &project.id)
        .await
        .unwrap();
    let via_team = assignments
        .grant(&read.id, Grantee::team("core"), &project.id)
        .await
        .unwrap();
    assignments
        .grant(&read.id, Grantee::team("web"), &project.id)
        .await
        .unwrap();
    assignments
        .grant(&gone.id, Grantee::user("alice"), &project.id)
        .await
        .unwrap();
    directory.permissions().remove(&gone.id).await.unwrap();

    let teams: HashSet<String> = ["core".to_string()].into();
    let ids: HashSet<String> = assignments
        .effective_for("alice", &teams)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(ids, [direct.id.clone(), via_team.id].into());

    let held: Vec<_> = assignments
        .for_grantee(&Grantee::user("alice"))
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(held.len(), 2);
    assert!(held.contains(&direct.id));
}

#[tokio::test]
async fn test_reevaluate_skips_revoked_and_unchanged() {
    let (directory, _) = AccessDirectory::memory();
    let perm = directory
        .permissions()
        .create("EDIT", None, PermissionLevel::Create)
        .await
        .unwrap();
    let project = directory
        .contexts()
        .create(ContextScope::Project, "HLX", None)
        .await
        .unwrap();
    let assignments = directory.assignments();
    let kept = assignments
        .grant(&perm.id, Grantee::user("alice"), &project.id)
        .await
        .unwrap();
    let revoked = assignments
        .grant(&perm.id, Grantee::user("bob"), &project.id)
        .await
        .unwrap();
    assignments.revoke(&revoked.id).await.unwrap();

    assert_eq!(assignments.reevaluate(&perm.id).await.unwrap(), 0);

    directory
        .permissions()
        .update(
            &perm.id,
            PermissionUpdate {
                level: Some(PermissionLevel::Delete),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(
        assignments.get(&kept.id).await.unwrap().granted_level,
        PermissionLevel::Create
    );
    assert_eq!(assignments.reevaluate(&perm.id).await.unwrap(), 1);
    assert_eq!(
        assignments.get(&kept.id).await.unwrap().granted_level,
        PermissionLevel::Delete
    );
    assert_eq!(
        assignments.get(&revoked.id).await.unwrap().granted_level,
        PermissionLevel::Create
    );
}

#[test]
fn test_assignment_serialization() {
    let grantee = Grantee::team("core");
    let json = serde_json::to_value(&grantee).unwrap();
    assert_eq!(json, serde_json::json!({"kind": "team", "id": "core"}));
    assert_eq!(grantee.to_string(), "team:core");
}

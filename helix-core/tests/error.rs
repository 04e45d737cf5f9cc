use helix_core::{AccessError, InvalidName, PermissionLevel};

#[test]
fn test_status_codes() {
    assert_eq!(AccessError::Unauthorized("no token".into()).status_code(), 401);
    assert_eq!(AccessError::Forbidden("denied".into()).status_code(), 403);
    assert_eq!(AccessError::NotFound("ticket t1".into()).status_code(), 404);
    assert_eq!(
        AccessError::Conflict {
            entity: "ticket t1".into(),
            expected: 1,
            actual: 2
        }
        .status_code(),
        409
    );
    assert_eq!(
        AccessError::ServiceUnavailable("membership".into()).status_code(),
        503
    );
    assert_eq!(
        AccessError::InvalidReference("permission p1".into()).status_code(),
        422
    );
}

#[test]
fn test_conflict_body_carries_both_versions() {
    let err = AccessError::Conflict {
        entity: "ticket t1".into(),
        expected: 1,
        actual: 2,
    };
    let body = err.to_body();
    assert_eq!(body["code"], "VERSION_CONFLICT");
    assert_eq!(body["expectedVersion"], 1);
    assert_eq!(body["currentVersion"], 2);
    assert!(err.is_conflict());
}

#[test]
fn test_display() {
    let err = AccessError::Conflict {
        entity: "ticket t1".into(),
        expected: 3,
        actual: 4,
    };
    assert_eq!(
        err.to_string(),
        "Version conflict on ticket t1: expected version 3, current version 4"
    );
    assert_eq!(
        AccessError::Forbidden("alice may not update ticket".into()).to_string(),
        "Forbidden: alice may not update ticket"
    );
}

#[test]
fn test_invalid_name_maps_to_bad_request() {
    let err: AccessError = "WRITE".parse::<PermissionLevel>().unwrap_err().into();
    assert_eq!(err.status_code(), 400);
    assert_eq!(
        InvalidName::new("permission level", "WRITE").to_string(),
        "Invalid permission level: WRITE"
    );
}

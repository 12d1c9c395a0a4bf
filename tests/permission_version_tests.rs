//! Integration tests for Permission policy updates and version rotation

mod common;

use std::sync::Arc;

use common::{
    adopted_permission, permission, permission_arn, remote_permission, session, strings,
    FakeRam, POLICY_V1, POLICY_V2,
};
use ram_controller::crd::{ManagedResource, Tag};
use ram_controller::ram::ApiErrorKind;
use ram_controller::resources::permission::{RotationState, VersionRotation};
use ram_controller::resources::{PermissionManager, ResourceManager};
use tokio_test::{assert_err, assert_ok};

// ============================================================================
// Version Rotation
// ============================================================================

#[tokio::test]
async fn test_rotation_creates_deletes_and_promotes() {
    let ram = Arc::new(FakeRam::new());
    ram.insert_permission(remote_permission("reader", POLICY_V1, "1"));
    let (session, metrics) = session(ram.clone());
    let arn = permission_arn("reader");

    let mut rotation = VersionRotation::new(&session, &arn);
    let created = assert_ok!(rotation.run(Some("1"), POLICY_V2).await);

    assert_eq!(created.version.as_deref(), Some("2"));
    assert_eq!(created.default_version, Some(true));
    assert_eq!(
        rotation.state(),
        &RotationState::DefaultVersionSet {
            version: "2".to_string()
        }
    );

    let calls = ram.calls();
    let operations: Vec<_> = calls.iter().map(|c| c.operation).collect();
    assert_eq!(
        operations,
        vec![
            "CreatePermissionVersion",
            "DeletePermissionVersion",
            "SetDefaultPermissionVersion",
        ]
    );
    assert_eq!(calls[1].args, vec![arn.clone(), "1".to_string()]);
    assert_eq!(calls[2].args, vec![arn.clone(), "2".to_string()]);
    assert_eq!(ram.permission(&arn).version.as_deref(), Some("2"));
    assert_eq!(
        metrics.api_call_count("UPDATE", "SetDefaultPermissionVersion", "success"),
        1
    );
}

#[tokio::test]
async fn test_rotation_stops_when_old_version_cannot_be_deleted() {
    let ram = Arc::new(FakeRam::new());
    ram.insert_permission(remote_permission("reader", POLICY_V1, "1"));
    ram.fail("DeletePermissionVersion", ApiErrorKind::Other);
    let (session, metrics) = session(ram.clone());
    let arn = permission_arn("reader");

    let mut rotation = VersionRotation::new(&session, &arn);
    let err = assert_err!(rotation.run(Some("1"), POLICY_V2).await);

    assert!(err.to_string().contains("DeletePermissionVersion"));
    assert_eq!(
        rotation.state(),
        &RotationState::VersionCreated {
            version: "2".to_string()
        }
    );
    assert!(!ram.operations().contains(&"SetDefaultPermissionVersion"));
    assert_eq!(
        metrics.api_call_count("DELETE", "DeletePermissionVersion", "failure"),
        1
    );
    // Version 1 is still the default alongside the new version 2
    assert_eq!(ram.permission(&arn).version.as_deref(), Some("1"));
}

#[tokio::test]
async fn test_rotation_failing_to_create_leaves_no_version() {
    let ram = Arc::new(FakeRam::new());
    ram.insert_permission(remote_permission("reader", POLICY_V1, "1"));
    ram.fail("CreatePermissionVersion", ApiErrorKind::InvalidParameter);
    let (session, _metrics) = session(ram.clone());
    let arn = permission_arn("reader");

    let mut rotation = VersionRotation::new(&session, &arn);
    let err = assert_err!(rotation.run(Some("1"), POLICY_V2).await);

    assert!(err.is_terminal());
    assert_eq!(rotation.state(), &RotationState::NoVersion);
    assert_eq!(ram.operations(), vec!["CreatePermissionVersion"]);
}

#[tokio::test]
async fn test_rotation_rejects_non_numeric_previous_version() {
    let ram = Arc::new(FakeRam::new());
    let (session, _metrics) = session(ram.clone());
    let arn = permission_arn("reader");

    let mut rotation = VersionRotation::new(&session, &arn);
    let err = assert_err!(rotation.run(Some("latest"), POLICY_V2).await);

    assert!(err.is_terminal());
    assert!(ram.calls().is_empty());
}

// ============================================================================
// Resource Manager
// ============================================================================

#[tokio::test]
async fn test_policy_update_rotates_version() {
    let ram = Arc::new(FakeRam::new());
    ram.insert_permission(remote_permission("reader", POLICY_V1, "1"));
    let (session, _metrics) = session(ram.clone());
    let manager = PermissionManager::new(session);

    let desired = adopted_permission("reader", POLICY_V2, "1");
    let latest = assert_ok!(manager.read_one(&desired).await);
    let delta = manager.delta(Some(&desired), Some(&latest));
    assert_eq!(delta.paths().collect::<Vec<_>>(), vec!["Spec.PolicyTemplate"]);
    assert!(manager.requeue_after_update(&delta));

    let updated = assert_ok!(manager.update(&desired, &latest, &delta).await);

    let status = updated.status.as_ref().unwrap();
    assert_eq!(status.version.as_deref(), Some("2"));
    assert_eq!(status.default_version, Some(true));
    assert_eq!(updated.arn(), Some(permission_arn("reader").as_str()));
}

#[tokio::test]
async fn test_tag_only_update_does_not_rotate() {
    let ram = Arc::new(FakeRam::new());
    ram.insert_permission(remote_permission("reader", POLICY_V1, "1"));
    let (session, _metrics) = session(ram.clone());
    let manager = PermissionManager::new(session);

    let mut desired = adopted_permission("reader", POLICY_V1, "1");
    desired.spec.tags = vec![Tag::new("env", "prod")];
    let latest = assert_ok!(manager.read_one(&desired).await);
    let delta = manager.delta(Some(&desired), Some(&latest));
    assert!(!manager.requeue_after_update(&delta));

    ram.clear_calls();
    assert_ok!(manager.update(&desired, &latest, &delta).await);

    let calls = ram.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].operation, "TagResource");
    assert_eq!(calls[0].args, strings(&["env=prod"]));
}

#[tokio::test]
async fn test_renaming_a_permission_is_terminal() {
    let ram = Arc::new(FakeRam::new());
    ram.insert_permission(remote_permission("reader", POLICY_V1, "1"));
    let (session, _metrics) = session(ram.clone());
    let manager = PermissionManager::new(session);

    let desired = adopted_permission("reader", POLICY_V1, "1");
    let latest = assert_ok!(manager.read_one(&desired).await);
    let mut renamed = desired.clone();
    renamed.spec.name = "writer".to_string();
    let delta = manager.delta(Some(&renamed), Some(&latest));

    ram.clear_calls();
    let err = assert_err!(manager.update(&renamed, &latest, &delta).await);
    assert!(err.is_terminal());
    assert!(ram.calls().is_empty());
}

#[tokio::test]
async fn test_create_records_arn_and_version() {
    let ram = Arc::new(FakeRam::new());
    let (session, metrics) = session(ram.clone());
    let manager = PermissionManager::new(session);

    let created = assert_ok!(manager.create(&permission("reader", POLICY_V1)).await);

    assert_eq!(created.arn(), Some(permission_arn("reader").as_str()));
    assert_eq!(
        created.status.as_ref().unwrap().version.as_deref(),
        Some("1")
    );
    assert!(manager.is_synced(&created));
    assert_eq!(metrics.api_call_count("CREATE", "CreatePermission", "success"), 1);
}

#[tokio::test]
async fn test_read_without_arn_is_not_found() {
    let ram = Arc::new(FakeRam::new());
    let (session, _metrics) = session(ram.clone());
    let manager = PermissionManager::new(session);

    let err = assert_err!(manager.read_one(&permission("reader", POLICY_V1)).await);
    assert!(err.is_not_found());
    assert!(ram.calls().is_empty());
}

#[test]
fn test_validate_rejects_malformed_policy() {
    let ram = Arc::new(FakeRam::new());
    let (session, _metrics) = session(ram);
    let manager = PermissionManager::new(session);

    let err = manager
        .validate(&permission("reader", "{not json"))
        .unwrap_err();
    assert!(err.is_terminal());

    let mut missing_type = permission("reader", POLICY_V1);
    missing_type.spec.resource_type = String::new();
    assert!(manager.validate(&missing_type).is_err());

    assert!(manager.validate(&permission("reader", POLICY_V1)).is_ok());
}

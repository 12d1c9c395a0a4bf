//! In-memory RAM used by the integration tests

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use ram_controller::crd::{
    ManagedResource, Permission, PermissionSpec, ResourceMetadata, ResourceShare,
    ResourceShareSpec, Tag,
};
use ram_controller::metrics::Metrics;
use ram_controller::ram::{
    ApiError, ApiErrorKind, ApiResult, AssociationBatch, AssociationType, CreatePermissionInput,
    CreateResourceShareInput, PermissionDetail, RamApi, ResourceShareDetail, TagTarget,
};
use ram_controller::resources::AwsSession;
use serde_json::Value;

pub const ACCOUNT_ID: &str = "111122223333";
pub const REGION: &str = "us-west-2";

/// One recorded RAM call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub operation: &'static str,
    pub args: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct FakeShare {
    pub detail: ResourceShareDetail,
    pub principals: BTreeSet<String>,
    pub resources: BTreeSet<String>,
    pub sources: BTreeSet<String>,
    pub permissions: BTreeSet<String>,
}

#[derive(Debug, Default)]
pub struct State {
    pub calls: Vec<Call>,
    pub failures: HashMap<&'static str, ApiErrorKind>,
    pub permissions: BTreeMap<String, PermissionDetail>,
    pub shares: BTreeMap<String, FakeShare>,
}

#[derive(Debug, Default)]
pub struct FakeRam {
    state: Mutex<State>,
}

impl FakeRam {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Make every call to `operation` fail with `kind`
    pub fn fail(&self, operation: &'static str, kind: ApiErrorKind) {
        self.state().failures.insert(operation, kind);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn operations(&self) -> Vec<&'static str> {
        self.state().calls.iter().map(|c| c.operation).collect()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn insert_permission(&self, detail: PermissionDetail) {
        let arn = detail.arn.clone().unwrap();
        self.state().permissions.insert(arn, detail);
    }

    pub fn insert_share(&self, share: FakeShare) {
        let arn = share.detail.arn.clone().unwrap();
        self.state().shares.insert(arn, share);
    }

    pub fn share(&self, arn: &str) -> FakeShare {
        self.state().shares.get(arn).cloned().unwrap()
    }

    pub fn permission(&self, arn: &str) -> PermissionDetail {
        self.state().permissions.get(arn).cloned().unwrap()
    }

    /// Record the call and return the configured failure, if any
    fn enter(&self, operation: &'static str, args: Vec<String>) -> ApiResult<MutexGuard<'_, State>> {
        let mut state = self.state();
        state.calls.push(Call { operation, args });
        match state.failures.get(operation) {
            Some(kind) => Err(ApiError::new(*kind, operation, "injected failure")),
            None => Ok(state),
        }
    }
}

fn not_found(operation: &'static str, arn: &str) -> ApiError {
    ApiError::new(ApiErrorKind::NotFound, operation, format!("{} does not exist", arn))
}

fn sorted(values: &[String]) -> Vec<String> {
    let mut values = values.to_vec();
    values.sort();
    values
}

fn batch_args(batch: &AssociationBatch) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();
    args.extend(sorted(&batch.principals).into_iter().map(|p| format!("principal={}", p)));
    args.extend(sorted(&batch.resource_arns).into_iter().map(|r| format!("resource={}", r)));
    args.extend(sorted(&batch.sources).into_iter().map(|s| format!("source={}", s)));
    args
}

fn tag_args(tags: &[Tag]) -> Vec<String> {
    let mut args: Vec<String> = tags.iter().map(|t| format!("{}={}", t.key, t.value)).collect();
    args.sort();
    args
}

fn apply_tags(existing: &mut Vec<Tag>, tags: &[Tag]) {
    for tag in tags {
        existing.retain(|t| t.key != tag.key);
        existing.push(tag.clone());
    }
}

#[async_trait]
impl RamApi for FakeRam {
    async fn get_permission(&self, arn: &str, _version: Option<i32>) -> ApiResult<PermissionDetail> {
        let state = self.enter("GetPermission", vec![arn.to_string()])?;
        state
            .permissions
            .get(arn)
            .cloned()
            .ok_or_else(|| not_found("GetPermission", arn))
    }

    async fn create_permission(&self, input: CreatePermissionInput) -> ApiResult<PermissionDetail> {
        let mut state = self.enter("CreatePermission", vec![input.name.clone()])?;
        let arn = format!("arn:aws:ram:{}:{}:permission/{}", REGION, ACCOUNT_ID, input.name);
        let detail = PermissionDetail {
            arn: Some(arn.clone()),
            name: Some(input.name),
            resource_type: Some(input.resource_type),
            policy_template: Some(input.policy_template),
            version: Some("1".to_string()),
            default_version: Some(true),
            is_resource_type_default: Some(false),
            status: Some("ATTACHABLE".to_string()),
            feature_set: Some("STANDARD".to_string()),
            permission_type: Some("CUSTOMER_MANAGED".to_string()),
            tags: input.tags,
            ..Default::default()
        };
        state.permissions.insert(arn, detail.clone());
        Ok(detail)
    }

    async fn delete_permission(&self, arn: &str) -> ApiResult<()> {
        let mut state = self.enter("DeletePermission", vec![arn.to_string()])?;
        state
            .permissions
            .remove(arn)
            .map(|_| ())
            .ok_or_else(|| not_found("DeletePermission", arn))
    }

    async fn create_permission_version(
        &self,
        arn: &str,
        policy_template: &str,
    ) -> ApiResult<PermissionDetail> {
        let state = self.enter("CreatePermissionVersion", vec![arn.to_string()])?;
        let current = state
            .permissions
            .get(arn)
            .cloned()
            .ok_or_else(|| not_found("CreatePermissionVersion", arn))?;
        let next = current
            .version
            .as_deref()
            .and_then(|v| v.parse::<i32>().ok())
            .unwrap_or(0)
            + 1;
        Ok(PermissionDetail {
            policy_template: Some(policy_template.to_string()),
            version: Some(next.to_string()),
            default_version: Some(false),
            ..current
        })
    }

    async fn delete_permission_version(&self, arn: &str, version: i32) -> ApiResult<()> {
        let _state = self.enter(
            "DeletePermissionVersion",
            vec![arn.to_string(), version.to_string()],
        )?;
        Ok(())
    }

    async fn set_default_permission_version(&self, arn: &str, version: i32) -> ApiResult<()> {
        let mut state = self.enter(
            "SetDefaultPermissionVersion",
            vec![arn.to_string(), version.to_string()],
        )?;
        let permission = state
            .permissions
            .get_mut(arn)
            .ok_or_else(|| not_found("SetDefaultPermissionVersion", arn))?;
        permission.version = Some(version.to_string());
        Ok(())
    }

    async fn get_resource_share(&self, arn: &str) -> ApiResult<ResourceShareDetail> {
        let state = self.enter("GetResourceShares", vec![arn.to_string()])?;
        state
            .shares
            .get(arn)
            .map(|s| s.detail.clone())
            .ok_or_else(|| not_found("GetResourceShares", arn))
    }

    async fn create_resource_share(
        &self,
        input: CreateResourceShareInput,
    ) -> ApiResult<ResourceShareDetail> {
        let mut state = self.enter("CreateResourceShare", vec![input.name.clone()])?;
        let arn = format!("arn:aws:ram:{}:{}:resource-share/{}", REGION, ACCOUNT_ID, input.name);
        let detail = ResourceShareDetail {
            arn: Some(arn.clone()),
            name: Some(input.name),
            owning_account_id: Some(ACCOUNT_ID.to_string()),
            allow_external_principals: Some(input.allow_external_principals.unwrap_or(true)),
            status: Some("ACTIVE".to_string()),
            feature_set: Some("STANDARD".to_string()),
            tags: input.tags,
            ..Default::default()
        };
        state.shares.insert(
            arn,
            FakeShare {
                detail: detail.clone(),
                principals: input.principals.into_iter().collect(),
                resources: input.resource_arns.into_iter().collect(),
                sources: input.sources.into_iter().collect(),
                permissions: input.permission_arns.into_iter().collect(),
            },
        );
        Ok(detail)
    }

    async fn update_resource_share(
        &self,
        arn: &str,
        name: Option<&str>,
        allow_external_principals: Option<bool>,
    ) -> ApiResult<ResourceShareDetail> {
        let mut state = self.enter("UpdateResourceShare", vec![arn.to_string()])?;
        let share = state
            .shares
            .get_mut(arn)
            .ok_or_else(|| not_found("UpdateResourceShare", arn))?;
        if let Some(name) = name {
            share.detail.name = Some(name.to_string());
        }
        if allow_external_principals.is_some() {
            share.detail.allow_external_principals = allow_external_principals;
        }
        Ok(share.detail.clone())
    }

    async fn delete_resource_share(&self, arn: &str) -> ApiResult<()> {
        let mut state = self.enter("DeleteResourceShare", vec![arn.to_string()])?;
        let share = state
            .shares
            .get_mut(arn)
            .ok_or_else(|| not_found("DeleteResourceShare", arn))?;
        share.detail.status = Some("DELETED".to_string());
        Ok(())
    }

    async fn tag_resource(&self, target: TagTarget<'_>, tags: &[Tag]) -> ApiResult<()> {
        let mut state = self.enter("TagResource", tag_args(tags))?;
        if let Some(share) = state.shares.get_mut(target.arn()) {
            apply_tags(&mut share.detail.tags, tags);
        } else if let Some(permission) = state.permissions.get_mut(target.arn()) {
            apply_tags(&mut permission.tags, tags);
        }
        Ok(())
    }

    async fn untag_resource(&self, target: TagTarget<'_>, keys: &[String]) -> ApiResult<()> {
        let mut state = self.enter("UntagResource", sorted(keys))?;
        if let Some(share) = state.shares.get_mut(target.arn()) {
            share.detail.tags.retain(|t| !keys.contains(&t.key));
        } else if let Some(permission) = state.permissions.get_mut(target.arn()) {
            permission.tags.retain(|t| !keys.contains(&t.key));
        }
        Ok(())
    }

    async fn associate_resource_share(&self, arn: &str, batch: &AssociationBatch) -> ApiResult<()> {
        let mut state = self.enter("AssociateResourceShare", batch_args(batch))?;
        let share = state
            .shares
            .get_mut(arn)
            .ok_or_else(|| not_found("AssociateResourceShare", arn))?;
        share.principals.extend(batch.principals.iter().cloned());
        share.resources.extend(batch.resource_arns.iter().cloned());
        share.sources.extend(batch.sources.iter().cloned());
        Ok(())
    }

    async fn disassociate_resource_share(
        &self,
        arn: &str,
        batch: &AssociationBatch,
    ) -> ApiResult<()> {
        let mut state = self.enter("DisassociateResourceShare", batch_args(batch))?;
        let share = state
            .shares
            .get_mut(arn)
            .ok_or_else(|| not_found("DisassociateResourceShare", arn))?;
        share.principals.retain(|p| !batch.principals.contains(p));
        share.resources.retain(|r| !batch.resource_arns.contains(r));
        share.sources.retain(|s| !batch.sources.contains(s));
        Ok(())
    }

    async fn associate_resource_share_permission(
        &self,
        share_arn: &str,
        permission_arn: &str,
    ) -> ApiResult<()> {
        let mut state = self.enter(
            "AssociateResourceSharePermission",
            vec![permission_arn.to_string()],
        )?;
        let share = state
            .shares
            .get_mut(share_arn)
            .ok_or_else(|| not_found("AssociateResourceSharePermission", share_arn))?;
        share.permissions.insert(permission_arn.to_string());
        Ok(())
    }

    async fn disassociate_resource_share_permission(
        &self,
        share_arn: &str,
        permission_arn: &str,
    ) -> ApiResult<()> {
        let mut state = self.enter(
            "DisassociateResourceSharePermission",
            vec![permission_arn.to_string()],
        )?;
        let share = state
            .shares
            .get_mut(share_arn)
            .ok_or_else(|| not_found("DisassociateResourceSharePermission", share_arn))?;
        share.permissions.remove(permission_arn);
        Ok(())
    }

    async fn list_resource_share_permissions(&self, share_arn: &str) -> ApiResult<Vec<String>> {
        let state = self.enter("ListResourceSharePermissions", vec![share_arn.to_string()])?;
        state
            .shares
            .get(share_arn)
            .map(|s| s.permissions.iter().cloned().collect())
            .ok_or_else(|| not_found("ListResourceSharePermissions", share_arn))
    }

    async fn get_resource_share_associations(
        &self,
        share_arn: &str,
        association_type: AssociationType,
    ) -> ApiResult<Vec<String>> {
        let state = self.enter(
            "GetResourceShareAssociations",
            vec![share_arn.to_string(), format!("{:?}", association_type)],
        )?;
        let share = state
            .shares
            .get(share_arn)
            .ok_or_else(|| not_found("GetResourceShareAssociations", share_arn))?;
        let values = match association_type {
            AssociationType::Principal => &share.principals,
            AssociationType::Resource => &share.resources,
        };
        Ok(values.iter().cloned().collect())
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

pub fn session(ram: Arc<FakeRam>) -> (AwsSession, Arc<Metrics>) {
    let metrics = Arc::new(Metrics::new().unwrap());
    let session = AwsSession::new(ram, metrics.clone(), Some(REGION.to_string()));
    (session, metrics)
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

pub fn permission_arn(name: &str) -> String {
    format!("arn:aws:ram:{}:{}:permission/{}", REGION, ACCOUNT_ID, name)
}

pub fn share_arn(name: &str) -> String {
    format!("arn:aws:ram:{}:{}:resource-share/{}", REGION, ACCOUNT_ID, name)
}

pub const POLICY_V1: &str = r#"{"Effect":"Allow","Action":["imagebuilder:GetComponent"]}"#;
pub const POLICY_V2: &str =
    r#"{"Effect":"Allow","Action":["imagebuilder:GetComponent","imagebuilder:ListComponents"]}"#;

pub fn permission(name: &str, policy: &str) -> Permission {
    let mut permission = Permission::new(
        name,
        PermissionSpec {
            name: name.to_string(),
            resource_type: "imagebuilder:Component".to_string(),
            policy_template: policy.to_string(),
            tags: vec![],
        },
    );
    permission.metadata.namespace = Some("default".to_string());
    permission
}

/// A permission custom resource that already points at `arn`
pub fn adopted_permission(name: &str, policy: &str, version: &str) -> Permission {
    let mut permission = permission(name, policy);
    let status = permission.status.get_or_insert_with(Default::default);
    status.version = Some(version.to_string());
    status.ack_resource_metadata = Some(ResourceMetadata {
        arn: Some(permission_arn(name)),
        ..Default::default()
    });
    permission
}

pub fn remote_permission(name: &str, policy: &str, version: &str) -> PermissionDetail {
    PermissionDetail {
        arn: Some(permission_arn(name)),
        name: Some(name.to_string()),
        resource_type: Some("imagebuilder:Component".to_string()),
        policy_template: Some(policy.to_string()),
        version: Some(version.to_string()),
        default_version: Some(true),
        status: Some("ATTACHABLE".to_string()),
        ..Default::default()
    }
}

pub fn share_spec(name: &str) -> ResourceShareSpec {
    ResourceShareSpec {
        name: name.to_string(),
        allow_external_principals: None,
        permission_arns: vec![],
        principals: vec![],
        resource_arns: vec![],
        sources: vec![],
        tags: vec![],
    }
}

pub fn resource_share(spec: ResourceShareSpec) -> ResourceShare {
    let mut share = ResourceShare::new(&spec.name.clone(), spec);
    share.metadata.namespace = Some("default".to_string());
    share
}

/// A resource share custom resource that already points at an existing share
pub fn adopted_share(spec: ResourceShareSpec) -> ResourceShare {
    let arn = share_arn(&spec.name);
    let mut share = resource_share(spec);
    share
        .status
        .get_or_insert_with(Default::default)
        .ack_resource_metadata = Some(ResourceMetadata {
        arn: Some(arn),
        ..Default::default()
    });
    share
}

pub fn remote_share(name: &str) -> FakeShare {
    FakeShare {
        detail: ResourceShareDetail {
            arn: Some(share_arn(name)),
            name: Some(name.to_string()),
            owning_account_id: Some(ACCOUNT_ID.to_string()),
            allow_external_principals: Some(true),
            status: Some("ACTIVE".to_string()),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Apply a JSON merge patch (RFC 7386) the way the API server does
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Default::default());
    }
    if let Value::Object(target) = target {
        for (key, value) in patch {
            if value.is_null() {
                target.remove(key);
            } else {
                merge_patch(target.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

/// The object stored after merge-patching its status with `patched`'s status
pub fn stored_after_status_patch<R>(stored: &R, patched: &R) -> R
where
    R: ManagedResource,
{
    let mut value = serde_json::to_value(stored).unwrap();
    merge_patch(&mut value, &patched.status_patch());
    serde_json::from_value(value).unwrap()
}

//! Resource manager for Permission resources

pub mod delta;
pub mod version;

use async_trait::async_trait;
use kube::ResourceExt;
use tracing::{debug, info};

use crate::compare::{tags, Delta};
use crate::crd::{ManagedResource, Permission, PermissionStatus};
use crate::ram::{CreatePermissionInput, PermissionDetail, TagTarget};
use crate::sync;
use crate::{Error, Result};

use super::tags::TagMutator;
use super::{op, AwsSession, ResourceManager};

pub use version::{RotationState, VersionRotation};

/// Permission status once it can be attached to resource shares
pub const STATUS_ATTACHABLE: &str = "ATTACHABLE";

pub struct PermissionManager {
    session: AwsSession,
}

impl PermissionManager {
    pub fn new(session: AwsSession) -> Self {
        Self { session }
    }

    fn arn<'r>(&self, resource: &'r Permission) -> Result<&'r str> {
        resource.arn().ok_or(Error::NotFound)
    }
}

/// Copy what RAM reports about a permission onto `ko`
fn apply_detail(ko: &mut Permission, detail: &PermissionDetail) {
    if let Some(name) = &detail.name {
        ko.spec.name = name.clone();
    }
    if let Some(resource_type) = &detail.resource_type {
        ko.spec.resource_type = resource_type.clone();
    }
    if let Some(policy) = &detail.policy_template {
        ko.spec.policy_template = policy.clone();
    }

    let status = ko.status.get_or_insert_with(PermissionStatus::default);
    status.creation_time = detail.creation_time;
    status.last_updated_time = detail.last_updated_time;
    status.default_version = detail.default_version;
    status.is_resource_type_default = detail.is_resource_type_default;
    status.feature_set = detail.feature_set.clone();
    status.permission_type = detail.permission_type.clone();
    status.status = detail.status.clone();
    status.version = detail.version.clone();

    if let Some(arn) = &detail.arn {
        ko.resource_metadata_mut().arn = Some(arn.clone());
    }
}

pub fn permission_attachable(ko: &Permission) -> bool {
    ko.status
        .as_ref()
        .and_then(|s| s.status.as_deref())
        .is_some_and(|s| s == STATUS_ATTACHABLE)
}

#[async_trait]
impl ResourceManager for PermissionManager {
    type Resource = Permission;

    fn session(&self) -> &AwsSession {
        &self.session
    }

    fn validate(&self, desired: &Permission) -> Result<()> {
        let spec = &desired.spec;

        if spec.name.trim().is_empty() {
            return Err(Error::ValidationError("name cannot be empty".to_string()));
        }

        if spec.resource_type.trim().is_empty() {
            return Err(Error::ValidationError(
                "resourceType cannot be empty".to_string(),
            ));
        }

        serde_json::from_str::<serde_json::Value>(&spec.policy_template).map_err(|e| {
            Error::ValidationError(format!("policyTemplate must be a JSON document: {}", e))
        })?;

        Ok(())
    }

    async fn read_one(&self, desired: &Permission) -> Result<Permission> {
        let arn = self.arn(desired)?;
        let result = self.session.ram.get_permission(arn, None).await;
        let detail = self.session.record(op::READ_ONE, "GetPermission", result)?;

        let mut latest = desired.clone();
        apply_detail(&mut latest, &detail);

        let mut observed_tags = tags::to_map(&detail.tags);
        tags::ignore_system_tags(&mut observed_tags);
        latest.spec.tags = tags::from_map(&observed_tags);

        Ok(latest)
    }

    async fn create(&self, desired: &Permission) -> Result<Permission> {
        let namespace = desired.namespace().unwrap_or_default();
        let mut all_tags = tags::system_tags(&namespace);
        all_tags.extend(tags::to_map(&desired.spec.tags));

        let input = CreatePermissionInput {
            name: desired.spec.name.clone(),
            resource_type: desired.spec.resource_type.clone(),
            policy_template: desired.spec.policy_template.clone(),
            tags: tags::from_map(&all_tags),
        };
        let result = self.session.ram.create_permission(input).await;
        let detail = self
            .session
            .record(op::CREATE, "CreatePermission", result)?;

        let mut created = desired.clone();
        apply_detail(&mut created, &detail);
        info!(
            name = %desired.name_any(),
            arn = ?detail.arn,
            "created permission"
        );
        Ok(created)
    }

    async fn update(
        &self,
        desired: &Permission,
        latest: &Permission,
        delta: &Delta,
    ) -> Result<Permission> {
        for immutable in ["Spec.Name", "Spec.ResourceType"] {
            if delta.different_at(immutable) {
                return Err(Error::ValidationError(format!(
                    "{} cannot be changed after the permission is created",
                    immutable
                )));
            }
        }

        let arn = self.arn(latest)?;
        let mut updated = desired.clone();
        updated.status = latest.status.clone();

        if delta.different_at("Spec.Tags") {
            let mutator = TagMutator::new(&self.session, TagTarget::Resource(arn));
            sync::sync(&mutator, &desired.spec.tags, &latest.spec.tags).await?;
        }

        if delta.different_at("Spec.PolicyTemplate") {
            let previous = latest.status.as_ref().and_then(|s| s.version.as_deref());
            let mut rotation = VersionRotation::new(&self.session, arn);
            let created = rotation
                .run(previous, &desired.spec.policy_template)
                .await?;
            debug!(state = ?rotation.state(), "permission version rotated");
            apply_detail(&mut updated, &created);
        }

        Ok(updated)
    }

    async fn delete(&self, latest: &Permission) -> Result<()> {
        let arn = self.arn(latest)?;
        let result = self.session.ram.delete_permission(arn).await;
        self.session.record(op::DELETE, "DeletePermission", result)
    }

    fn delta(&self, a: Option<&Permission>, b: Option<&Permission>) -> Delta {
        delta::new_resource_delta(a, b)
    }

    fn is_synced(&self, latest: &Permission) -> bool {
        permission_attachable(latest)
    }

    /// A new version takes a while to show up in GetPermission
    fn requeue_after_update(&self, delta: &Delta) -> bool {
        delta.different_at("Spec.PolicyTemplate")
    }
}

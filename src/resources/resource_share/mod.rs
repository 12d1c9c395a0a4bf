//! Resource manager for ResourceShare resources

pub mod associations;
pub mod delta;

use async_trait::async_trait;
use kube::ResourceExt;
use tracing::info;

use crate::compare::{tags, Delta};
use crate::crd::{ManagedResource, ResourceShare, ResourceShareStatus};
use crate::ram::{AssociationType, CreateResourceShareInput, ResourceShareDetail, TagTarget};
use crate::sync;
use crate::{Error, Result};

use super::tags::TagMutator;
use super::{op, AwsSession, ResourceManager};

pub use associations::{ShareAssociations, SharePermissions};

pub const STATUS_ACTIVE: &str = "ACTIVE";
pub const STATUS_DELETED: &str = "DELETED";

pub struct ResourceShareManager {
    session: AwsSession,
}

impl ResourceShareManager {
    pub fn new(session: AwsSession) -> Self {
        Self { session }
    }

    fn arn<'r>(&self, resource: &'r ResourceShare) -> Result<&'r str> {
        resource.arn().ok_or(Error::NotFound)
    }

    async fn associated(&self, arn: &str, association_type: AssociationType) -> Result<Vec<String>> {
        let result = self
            .session
            .ram
            .get_resource_share_associations(arn, association_type)
            .await;
        self.session
            .record(op::READ_MANY, "GetResourceShareAssociations", result)
    }
}

/// Copy what RAM reports about a share onto `ko`
fn apply_detail(ko: &mut ResourceShare, detail: &ResourceShareDetail) {
    if let Some(name) = &detail.name {
        ko.spec.name = name.clone();
    }
    // An unset allowExternalPrincipals leaves RAM's value alone
    if ko.spec.allow_external_principals.is_some() {
        ko.spec.allow_external_principals = detail.allow_external_principals;
    }

    let status = ko.status.get_or_insert_with(ResourceShareStatus::default);
    status.creation_time = detail.creation_time;
    status.last_updated_time = detail.last_updated_time;
    status.feature_set = detail.feature_set.clone();
    status.owning_account_id = detail.owning_account_id.clone();
    status.status = detail.status.clone();
    status.status_message = detail.status_message.clone();

    if let Some(arn) = &detail.arn {
        let metadata = ko.resource_metadata_mut();
        metadata.arn = Some(arn.clone());
        if metadata.owner_account_id.is_none() {
            metadata.owner_account_id = detail.owning_account_id.clone();
        }
    }
}

pub fn share_active(ko: &ResourceShare) -> bool {
    ko.status
        .as_ref()
        .and_then(|s| s.status.as_deref())
        .is_some_and(|s| s == STATUS_ACTIVE)
}

#[async_trait]
impl ResourceManager for ResourceShareManager {
    type Resource = ResourceShare;

    fn session(&self) -> &AwsSession {
        &self.session
    }

    fn validate(&self, desired: &ResourceShare) -> Result<()> {
        let spec = &desired.spec;

        if spec.name.trim().is_empty() {
            return Err(Error::ValidationError("name cannot be empty".to_string()));
        }

        let lists = [
            ("permissionARNs", &spec.permission_arns),
            ("principals", &spec.principals),
            ("resourceARNs", &spec.resource_arns),
            ("sources", &spec.sources),
        ];
        for (field, values) in lists {
            if values.iter().any(|v| v.trim().is_empty()) {
                return Err(Error::ValidationError(format!(
                    "{} cannot contain empty entries",
                    field
                )));
            }
        }

        Ok(())
    }

    async fn read_one(&self, desired: &ResourceShare) -> Result<ResourceShare> {
        let arn = self.arn(desired)?;
        let result = self.session.ram.get_resource_share(arn).await;
        let detail = self
            .session
            .record(op::READ_MANY, "GetResourceShares", result)?;
        if detail.status.as_deref() == Some(STATUS_DELETED) {
            return Err(Error::NotFound);
        }

        let mut latest = desired.clone();
        apply_detail(&mut latest, &detail);

        let mut observed_tags = tags::to_map(&detail.tags);
        tags::ignore_system_tags(&mut observed_tags);
        latest.spec.tags = tags::from_map(&observed_tags);

        latest.spec.principals = self.associated(arn, AssociationType::Principal).await?;
        latest.spec.resource_arns = self.associated(arn, AssociationType::Resource).await?;

        // RAM attaches its default permission when none is requested
        if !desired.spec.permission_arns.is_empty() {
            let result = self.session.ram.list_resource_share_permissions(arn).await;
            latest.spec.permission_arns =
                self.session
                    .record(op::READ_MANY, "ListResourceSharePermissions", result)?;
        }

        latest.spec.sources = latest
            .status
            .as_ref()
            .map(|s| s.associated_sources.clone())
            .unwrap_or_default();

        Ok(latest)
    }

    async fn create(&self, desired: &ResourceShare) -> Result<ResourceShare> {
        let spec = &desired.spec;
        let namespace = desired.namespace().unwrap_or_default();
        let mut all_tags = tags::system_tags(&namespace);
        all_tags.extend(tags::to_map(&spec.tags));

        let input = CreateResourceShareInput {
            name: spec.name.clone(),
            allow_external_principals: spec.allow_external_principals,
            permission_arns: spec.permission_arns.clone(),
            principals: spec.principals.clone(),
            resource_arns: spec.resource_arns.clone(),
            sources: spec.sources.clone(),
            tags: tags::from_map(&all_tags),
        };
        let result = self.session.ram.create_resource_share(input).await;
        let detail = self
            .session
            .record(op::CREATE, "CreateResourceShare", result)?;

        let mut created = desired.clone();
        apply_detail(&mut created, &detail);
        created
            .status
            .get_or_insert_with(ResourceShareStatus::default)
            .associated_sources = spec.sources.clone();
        info!(
            name = %desired.name_any(),
            arn = ?detail.arn,
            "created resource share"
        );
        Ok(created)
    }

    async fn update(
        &self,
        desired: &ResourceShare,
        latest: &ResourceShare,
        delta: &Delta,
    ) -> Result<ResourceShare> {
        let arn = self.arn(latest)?;
        let mut updated = desired.clone();
        updated.status = latest.status.clone();

        if delta.different_at("Spec.Name") || delta.different_at("Spec.AllowExternalPrincipals") {
            let result = self
                .session
                .ram
                .update_resource_share(
                    arn,
                    Some(&desired.spec.name),
                    desired.spec.allow_external_principals,
                )
                .await;
            let detail = self
                .session
                .record(op::UPDATE, "UpdateResourceShare", result)?;
            apply_detail(&mut updated, &detail);
        }

        if delta.different_at("Spec.Tags") {
            let mutator = TagMutator::new(&self.session, TagTarget::ResourceShare(arn));
            sync::sync(&mutator, &desired.spec.tags, &latest.spec.tags).await?;
        }

        if delta.different_at("Spec.Principals")
            || delta.different_at("Spec.ResourceARNs")
            || delta.different_at("Spec.Sources")
        {
            let mutator = ShareAssociations::new(&self.session, arn);
            sync::sync(&mutator, &desired.spec, &latest.spec).await?;
            updated
                .status
                .get_or_insert_with(ResourceShareStatus::default)
                .associated_sources = desired.spec.sources.clone();
        }

        if delta.different_at("Spec.PermissionARNs") {
            let mutator = SharePermissions::new(&self.session, arn);
            sync::sync(
                &mutator,
                &desired.spec.permission_arns,
                &latest.spec.permission_arns,
            )
            .await?;
        }

        Ok(updated)
    }

    async fn delete(&self, latest: &ResourceShare) -> Result<()> {
        let arn = self.arn(latest)?;
        let result = self.session.ram.delete_resource_share(arn).await;
        self.session
            .record(op::DELETE, "DeleteResourceShare", result)
    }

    fn delta(&self, a: Option<&ResourceShare>, b: Option<&ResourceShare>) -> Delta {
        delta::new_resource_delta(a, b)
    }

    fn is_synced(&self, latest: &ResourceShare) -> bool {
        share_active(latest)
    }
}

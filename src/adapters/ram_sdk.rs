//! `RamApi` backed by the AWS SDK

use std::fmt::Debug;

use async_trait::async_trait;
use aws_sdk_ram::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ram::primitives::DateTime as SdkDateTime;
use aws_sdk_ram::types::{
    ResourceOwner, ResourceShare, ResourceShareAssociationStatus,
    ResourceShareAssociationType, ResourceSharePermissionDetail, ResourceSharePermissionSummary,
    Tag as SdkTag,
};
use aws_sdk_ram::Client;
use chrono::{DateTime, Utc};

use crate::crd::Tag;
use crate::ram::{
    ApiError, ApiErrorKind, ApiResult, AssociationBatch, AssociationType, CreatePermissionInput,
    CreateResourceShareInput, PermissionDetail, RamApi, ResourceShareDetail, TagTarget,
};

/// RAM client talking to AWS
#[derive(Clone, Debug)]
pub struct SdkRamApi {
    client: Client,
}

impl SdkRamApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_conf(config: &aws_config::SdkConfig) -> Self {
        Self::new(Client::new(config))
    }
}

fn api_error<E, R>(operation: &'static str, err: SdkError<E, R>) -> ApiError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: Debug,
{
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
    ApiError::from_code(operation, err.code(), message)
}

/// A successful response that lacks the entity it should carry
fn missing(operation: &'static str, what: &str) -> ApiError {
    ApiError::new(
        ApiErrorKind::Other,
        operation,
        format!("response contained no {}", what),
    )
}

/// A share lookup that matched nothing; RAM reports no error for it
fn share_not_listed(arn: &str) -> ApiError {
    ApiError::new(
        ApiErrorKind::NotFound,
        "GetResourceShares",
        format!("resource share {} not listed", arn),
    )
}

fn to_chrono(value: Option<&SdkDateTime>) -> Option<DateTime<Utc>> {
    value.and_then(|dt| DateTime::from_timestamp(dt.secs(), dt.subsec_nanos()))
}

fn to_sdk_tags(tags: &[Tag]) -> Vec<SdkTag> {
    tags.iter()
        .map(|t| SdkTag::builder().key(&t.key).value(&t.value).build())
        .collect()
}

fn from_sdk_tags(tags: &[SdkTag]) -> Vec<Tag> {
    tags.iter()
        .filter_map(|t| {
            t.key()
                .map(|k| Tag::new(k, t.value().unwrap_or_default()))
        })
        .collect()
}

fn non_empty(values: &[String]) -> Option<Vec<String>> {
    (!values.is_empty()).then(|| values.to_vec())
}

fn permission_from_detail(p: &ResourceSharePermissionDetail) -> PermissionDetail {
    PermissionDetail {
        arn: p.arn().map(str::to_string),
        name: p.name().map(str::to_string),
        resource_type: p.resource_type().map(str::to_string),
        policy_template: p.permission().map(str::to_string),
        version: p.version().map(str::to_string),
        default_version: p.default_version(),
        is_resource_type_default: p.is_resource_type_default(),
        status: p.status().map(|s| s.as_str().to_string()),
        feature_set: p.feature_set().map(|s| s.as_str().to_string()),
        permission_type: p.permission_type().map(|s| s.as_str().to_string()),
        creation_time: to_chrono(p.creation_time()),
        last_updated_time: to_chrono(p.last_updated_time()),
        tags: from_sdk_tags(p.tags()),
    }
}

fn permission_from_summary(p: &ResourceSharePermissionSummary) -> PermissionDetail {
    PermissionDetail {
        arn: p.arn().map(str::to_string),
        name: p.name().map(str::to_string),
        resource_type: p.resource_type().map(str::to_string),
        policy_template: None,
        version: p.version().map(str::to_string),
        default_version: p.default_version(),
        is_resource_type_default: p.is_resource_type_default(),
        status: p.status().map(str::to_string),
        feature_set: p.feature_set().map(|s| s.as_str().to_string()),
        permission_type: p.permission_type().map(|s| s.as_str().to_string()),
        creation_time: to_chrono(p.creation_time()),
        last_updated_time: to_chrono(p.last_updated_time()),
        tags: from_sdk_tags(p.tags()),
    }
}

fn share_from_sdk(s: &ResourceShare) -> ResourceShareDetail {
    ResourceShareDetail {
        arn: s.resource_share_arn().map(str::to_string),
        name: s.name().map(str::to_string),
        owning_account_id: s.owning_account_id().map(str::to_string),
        allow_external_principals: s.allow_external_principals(),
        status: s.status().map(|v| v.as_str().to_string()),
        status_message: s.status_message().map(str::to_string),
        feature_set: s.feature_set().map(|v| v.as_str().to_string()),
        creation_time: to_chrono(s.creation_time()),
        last_updated_time: to_chrono(s.last_updated_time()),
        tags: from_sdk_tags(s.tags()),
    }
}

#[async_trait]
impl RamApi for SdkRamApi {
    async fn get_permission(&self, arn: &str, version: Option<i32>) -> ApiResult<PermissionDetail> {
        const OP: &str = "GetPermission";
        let out = self
            .client
            .get_permission()
            .permission_arn(arn)
            .set_permission_version(version)
            .send()
            .await
            .map_err(|e| api_error(OP, e))?;
        out.permission()
            .map(permission_from_detail)
            .ok_or_else(|| missing(OP, "permission"))
    }

    async fn create_permission(&self, input: CreatePermissionInput) -> ApiResult<PermissionDetail> {
        const OP: &str = "CreatePermission";
        let out = self
            .client
            .create_permission()
            .name(input.name)
            .resource_type(input.resource_type)
            .policy_template(input.policy_template)
            .set_tags((!input.tags.is_empty()).then(|| to_sdk_tags(&input.tags)))
            .send()
            .await
            .map_err(|e| api_error(OP, e))?;
        out.permission()
            .map(permission_from_summary)
            .ok_or_else(|| missing(OP, "permission"))
    }

    async fn delete_permission(&self, arn: &str) -> ApiResult<()> {
        self.client
            .delete_permission()
            .permission_arn(arn)
            .send()
            .await
            .map_err(|e| api_error("DeletePermission", e))?;
        Ok(())
    }

    async fn create_permission_version(
        &self,
        arn: &str,
        policy_template: &str,
    ) -> ApiResult<PermissionDetail> {
        const OP: &str = "CreatePermissionVersion";
        let out = self
            .client
            .create_permission_version()
            .permission_arn(arn)
            .policy_template(policy_template)
            .send()
            .await
            .map_err(|e| api_error(OP, e))?;
        out.permission()
            .map(permission_from_detail)
            .ok_or_else(|| missing(OP, "permission"))
    }

    async fn delete_permission_version(&self, arn: &str, version: i32) -> ApiResult<()> {
        self.client
            .delete_permission_version()
            .permission_arn(arn)
            .permission_version(version)
            .send()
            .await
            .map_err(|e| api_error("DeletePermissionVersion", e))?;
        Ok(())
    }

    async fn set_default_permission_version(&self, arn: &str, version: i32) -> ApiResult<()> {
        self.client
            .set_default_permission_version()
            .permission_arn(arn)
            .permission_version(version)
            .send()
            .await
            .map_err(|e| api_error("SetDefaultPermissionVersion", e))?;
        Ok(())
    }

    async fn get_resource_share(&self, arn: &str) -> ApiResult<ResourceShareDetail> {
        const OP: &str = "GetResourceShares";
        let out = self
            .client
            .get_resource_shares()
            .resource_owner(ResourceOwner::SelfValue)
            .resource_share_arns(arn)
            .send()
            .await
            .map_err(|e| api_error(OP, e))?;
        out.resource_shares()
            .iter()
            .find(|s| s.resource_share_arn() == Some(arn))
            .map(share_from_sdk)
            .ok_or_else(|| share_not_listed(arn))
    }

    async fn create_resource_share(
        &self,
        input: CreateResourceShareInput,
    ) -> ApiResult<ResourceShareDetail> {
        const OP: &str = "CreateResourceShare";
        let out = self
            .client
            .create_resource_share()
            .name(input.name)
            .set_allow_external_principals(input.allow_external_principals)
            .set_permission_arns(non_empty(&input.permission_arns))
            .set_principals(non_empty(&input.principals))
            .set_resource_arns(non_empty(&input.resource_arns))
            .set_sources(non_empty(&input.sources))
            .set_tags((!input.tags.is_empty()).then(|| to_sdk_tags(&input.tags)))
            .send()
            .await
            .map_err(|e| api_error(OP, e))?;
        out.resource_share()
            .map(share_from_sdk)
            .ok_or_else(|| missing(OP, "resource share"))
    }

    async fn update_resource_share(
        &self,
        arn: &str,
        name: Option<&str>,
        allow_external_principals: Option<bool>,
    ) -> ApiResult<ResourceShareDetail> {
        const OP: &str = "UpdateResourceShare";
        let out = self
            .client
            .update_resource_share()
            .resource_share_arn(arn)
            .set_name(name.map(str::to_string))
            .set_allow_external_principals(allow_external_principals)
            .send()
            .await
            .map_err(|e| api_error(OP, e))?;
        out.resource_share()
            .map(share_from_sdk)
            .ok_or_else(|| missing(OP, "resource share"))
    }

    async fn delete_resource_share(&self, arn: &str) -> ApiResult<()> {
        self.client
            .delete_resource_share()
            .resource_share_arn(arn)
            .send()
            .await
            .map_err(|e| api_error("DeleteResourceShare", e))?;
        Ok(())
    }

    async fn tag_resource(&self, target: TagTarget<'_>, tags: &[Tag]) -> ApiResult<()> {
        let request = self.client.tag_resource().set_tags(Some(to_sdk_tags(tags)));
        let request = match target {
            TagTarget::ResourceShare(arn) => request.resource_share_arn(arn),
            TagTarget::Resource(arn) => request.resource_arn(arn),
        };
        request
            .send()
            .await
            .map_err(|e| api_error("TagResource", e))?;
        Ok(())
    }

    async fn untag_resource(&self, target: TagTarget<'_>, keys: &[String]) -> ApiResult<()> {
        let request = self.client.untag_resource().set_tag_keys(Some(keys.to_vec()));
        let request = match target {
            TagTarget::ResourceShare(arn) => request.resource_share_arn(arn),
            TagTarget::Resource(arn) => request.resource_arn(arn),
        };
        request
            .send()
            .await
            .map_err(|e| api_error("UntagResource", e))?;
        Ok(())
    }

    async fn associate_resource_share(&self, arn: &str, batch: &AssociationBatch) -> ApiResult<()> {
        self.client
            .associate_resource_share()
            .resource_share_arn(arn)
            .set_principals(non_empty(&batch.principals))
            .set_resource_arns(non_empty(&batch.resource_arns))
            .set_sources(non_empty(&batch.sources))
            .send()
            .await
            .map_err(|e| api_error("AssociateResourceShare", e))?;
        Ok(())
    }

    async fn disassociate_resource_share(
        &self,
        arn: &str,
        batch: &AssociationBatch,
    ) -> ApiResult<()> {
        self.client
            .disassociate_resource_share()
            .resource_share_arn(arn)
            .set_principals(non_empty(&batch.principals))
            .set_resource_arns(non_empty(&batch.resource_arns))
            .set_sources(non_empty(&batch.sources))
            .send()
            .await
            .map_err(|e| api_error("DisassociateResourceShare", e))?;
        Ok(())
    }

    async fn associate_resource_share_permission(
        &self,
        share_arn: &str,
        permission_arn: &str,
    ) -> ApiResult<()> {
        self.client
            .associate_resource_share_permission()
            .resource_share_arn(share_arn)
            .permission_arn(permission_arn)
            .send()
            .await
            .map_err(|e| api_error("AssociateResourceSharePermission", e))?;
        Ok(())
    }

    async fn disassociate_resource_share_permission(
        &self,
        share_arn: &str,
        permission_arn: &str,
    ) -> ApiResult<()> {
        self.client
            .disassociate_resource_share_permission()
            .resource_share_arn(share_arn)
            .permission_arn(permission_arn)
            .send()
            .await
            .map_err(|e| api_error("DisassociateResourceSharePermission", e))?;
        Ok(())
    }

    async fn list_resource_share_permissions(&self, share_arn: &str) -> ApiResult<Vec<String>> {
        let mut arns = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let out = self
                .client
                .list_resource_share_permissions()
                .resource_share_arn(share_arn)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| api_error("ListResourceSharePermissions", e))?;
            arns.extend(
                out.permissions()
                    .iter()
                    .filter_map(|p| p.arn().map(str::to_string)),
            );
            next_token = out.next_token().map(str::to_string);
            if next_token.is_none() {
                return Ok(arns);
            }
        }
    }

    async fn get_resource_share_associations(
        &self,
        share_arn: &str,
        association_type: AssociationType,
    ) -> ApiResult<Vec<String>> {
        let association_type = match association_type {
            AssociationType::Principal => ResourceShareAssociationType::Principal,
            AssociationType::Resource => ResourceShareAssociationType::Resource,
        };
        let mut entities = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let out = self
                .client
                .get_resource_share_associations()
                .association_type(association_type.clone())
                .resource_share_arns(share_arn)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| api_error("GetResourceShareAssociations", e))?;
            entities.extend(
                out.resource_share_associations()
                    .iter()
                    .filter(|a| a.status() == Some(&ResourceShareAssociationStatus::Associated))
                    .filter_map(|a| a.associated_entity().map(str::to_string)),
            );
            next_token = out.next_token().map(str::to_string);
            if next_token.is_none() {
                return Ok(entities);
            }
        }
    }
}

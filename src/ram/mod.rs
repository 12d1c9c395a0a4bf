//! Resource Access Manager API surface used by the resource managers
//!
//! The managers only talk to RAM through [`RamApi`], which keeps the sync
//! logic independent of the AWS SDK and lets tests drive it with an
//! in-memory implementation.

mod types;

pub use types::*;

use async_trait::async_trait;
use thiserror::Error as ThisError;

use crate::crd::Tag;

/// Classification of a failed RAM call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The addressed entity does not exist
    NotFound,
    /// The request was malformed; retrying will not help
    InvalidParameter,
    /// Anything else (throttling, service faults, network)
    Other,
}

/// Error returned by a RAM call
#[derive(Clone, Debug, ThisError)]
#[error("{operation} failed: {message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub operation: &'static str,
    pub code: Option<String>,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            operation,
            code: None,
            message: message.into(),
        }
    }

    /// Build an error from an AWS error code
    pub fn from_code(operation: &'static str, code: Option<&str>, message: impl Into<String>) -> Self {
        let kind = match code {
            Some("UnknownResourceException") => ApiErrorKind::NotFound,
            Some("InvalidParameterException") => ApiErrorKind::InvalidParameter,
            _ => ApiErrorKind::Other,
        };
        Self {
            kind,
            operation,
            code: code.map(str::to_string),
            message: message.into(),
        }
    }
}

/// Result of a RAM call
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Operations the controller issues against RAM
#[async_trait]
pub trait RamApi: Send + Sync {
    /// GetPermission, optionally for a specific version
    async fn get_permission(&self, arn: &str, version: Option<i32>) -> ApiResult<PermissionDetail>;

    async fn create_permission(&self, input: CreatePermissionInput) -> ApiResult<PermissionDetail>;

    async fn delete_permission(&self, arn: &str) -> ApiResult<()>;

    async fn create_permission_version(
        &self,
        arn: &str,
        policy_template: &str,
    ) -> ApiResult<PermissionDetail>;

    async fn delete_permission_version(&self, arn: &str, version: i32) -> ApiResult<()>;

    async fn set_default_permission_version(&self, arn: &str, version: i32) -> ApiResult<()>;

    /// GetResourceShares owned by the caller, filtered to one ARN
    async fn get_resource_share(&self, arn: &str) -> ApiResult<ResourceShareDetail>;

    async fn create_resource_share(
        &self,
        input: CreateResourceShareInput,
    ) -> ApiResult<ResourceShareDetail>;

    async fn update_resource_share(
        &self,
        arn: &str,
        name: Option<&str>,
        allow_external_principals: Option<bool>,
    ) -> ApiResult<ResourceShareDetail>;

    async fn delete_resource_share(&self, arn: &str) -> ApiResult<()>;

    async fn tag_resource(&self, target: TagTarget<'_>, tags: &[Tag]) -> ApiResult<()>;

    async fn untag_resource(&self, target: TagTarget<'_>, keys: &[String]) -> ApiResult<()>;

    async fn associate_resource_share(&self, arn: &str, batch: &AssociationBatch) -> ApiResult<()>;

    async fn disassociate_resource_share(
        &self,
        arn: &str,
        batch: &AssociationBatch,
    ) -> ApiResult<()>;

    async fn associate_resource_share_permission(
        &self,
        share_arn: &str,
        permission_arn: &str,
    ) -> ApiResult<()>;

    async fn disassociate_resource_share_permission(
        &self,
        share_arn: &str,
        permission_arn: &str,
    ) -> ApiResult<()>;

    /// ARNs of the permissions attached to a resource share
    async fn list_resource_share_permissions(&self, share_arn: &str) -> ApiResult<Vec<String>>;

    /// Entities currently in the ASSOCIATED state for one association type
    async fn get_resource_share_associations(
        &self,
        share_arn: &str,
        association_type: AssociationType,
    ) -> ApiResult<Vec<String>>;
}

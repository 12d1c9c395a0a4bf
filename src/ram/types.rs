//! Request and response shapes exchanged with RAM

use chrono::{DateTime, Utc};

use crate::crd::Tag;

/// A permission as returned by Get/Create/CreateVersion calls
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PermissionDetail {
    pub arn: Option<String>,
    pub name: Option<String>,
    pub resource_type: Option<String>,
    /// Policy template; absent from create responses
    pub policy_template: Option<String>,
    pub version: Option<String>,
    pub default_version: Option<bool>,
    pub is_resource_type_default: Option<bool>,
    pub status: Option<String>,
    pub feature_set: Option<String>,
    pub permission_type: Option<String>,
    pub creation_time: Option<DateTime<Utc>>,
    pub last_updated_time: Option<DateTime<Utc>>,
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreatePermissionInput {
    pub name: String,
    pub resource_type: String,
    pub policy_template: String,
    pub tags: Vec<Tag>,
}

/// A resource share as returned by Get/Create/Update calls
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceShareDetail {
    pub arn: Option<String>,
    pub name: Option<String>,
    pub owning_account_id: Option<String>,
    pub allow_external_principals: Option<bool>,
    pub status: Option<String>,
    pub status_message: Option<String>,
    pub feature_set: Option<String>,
    pub creation_time: Option<DateTime<Utc>>,
    pub last_updated_time: Option<DateTime<Utc>>,
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreateResourceShareInput {
    pub name: String,
    pub allow_external_principals: Option<bool>,
    pub permission_arns: Vec<String>,
    pub principals: Vec<String>,
    pub resource_arns: Vec<String>,
    pub sources: Vec<String>,
    pub tags: Vec<Tag>,
}

/// Entities passed to one AssociateResourceShare or
/// DisassociateResourceShare call
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssociationBatch {
    pub principals: Vec<String>,
    pub resource_arns: Vec<String>,
    pub sources: Vec<String>,
}

impl AssociationBatch {
    pub fn is_empty(&self) -> bool {
        self.principals.is_empty() && self.resource_arns.is_empty() && self.sources.is_empty()
    }
}

/// Association types readable through GetResourceShareAssociations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssociationType {
    Principal,
    Resource,
}

/// Entity addressed by TagResource/UntagResource
///
/// Resource shares are tagged through `resourceShareArn`, every other RAM
/// entity through `resourceArn`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagTarget<'a> {
    ResourceShare(&'a str),
    Resource(&'a str),
}

impl TagTarget<'_> {
    pub fn arn(&self) -> &str {
        match self {
            TagTarget::ResourceShare(arn) | TagTarget::Resource(arn) => arn,
        }
    }
}

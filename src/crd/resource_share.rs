//! ResourceShare Custom Resource Definition

use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Condition, Conditions, ResourceMetadata, Tag};

/// A RAM resource share
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "ram.services.k8s.aws",
    version = "v1alpha1",
    kind = "ResourceShare",
    plural = "resourceshares",
    singular = "resourceshare",
    namespaced,
    status = "ResourceShareStatus",
    printcolumn = r#"{"name": "Status", "type": "string", "jsonPath": ".status.status"}"#,
    printcolumn = r#"{"name": "Synced", "type": "string", "jsonPath": ".status.conditions[?(@.type==\"Synced\")].status"}"#,
    printcolumn = r#"{"name": "Age", "type": "date", "jsonPath": ".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ResourceShareSpec {
    /// Name of the resource share
    pub name: String,

    /// Allow principals outside the organization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_external_principals: Option<bool>,

    /// Permissions attached to the share
    #[serde(rename = "permissionARNs", default, skip_serializing_if = "Vec::is_empty")]
    pub permission_arns: Vec<String>,

    /// Account IDs, organization/OU ARNs, IAM roles or users
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub principals: Vec<String>,

    /// ARNs of the shared resources
    #[serde(rename = "resourceARNs", default, skip_serializing_if = "Vec::is_empty")]
    pub resource_arns: Vec<String>,

    /// Source accounts or organizations allowed to use service principals
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

/// ResourceShare status
///
/// Every field is serialized, unset ones as `null`, so a merge patch of the
/// status clears values that went away.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceShareStatus {
    pub ack_resource_metadata: Option<ResourceMetadata>,

    #[serde(default)]
    #[schemars(with = "Vec<Condition>")]
    pub conditions: Conditions,

    pub creation_time: Option<DateTime<Utc>>,

    pub last_updated_time: Option<DateTime<Utc>>,

    pub feature_set: Option<String>,

    #[serde(rename = "owningAccountID")]
    pub owning_account_id: Option<String>,

    /// Lifecycle status (PENDING, ACTIVE, FAILED, DELETING, DELETED)
    pub status: Option<String>,

    pub status_message: Option<String>,

    /// Sources last associated by the controller
    #[serde(default)]
    pub associated_sources: Vec<String>,
}

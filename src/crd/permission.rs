//! Permission Custom Resource Definition

use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{Condition, Conditions, ResourceMetadata, Tag};

/// A customer managed RAM permission
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "ram.services.k8s.aws",
    version = "v1alpha1",
    kind = "Permission",
    plural = "permissions",
    singular = "permission",
    namespaced,
    status = "PermissionStatus",
    printcolumn = r#"{"name": "Status", "type": "string", "jsonPath": ".status.status"}"#,
    printcolumn = r#"{"name": "Version", "type": "string", "jsonPath": ".status.version"}"#,
    printcolumn = r#"{"name": "Synced", "type": "string", "jsonPath": ".status.conditions[?(@.type==\"Synced\")].status"}"#,
    printcolumn = r#"{"name": "Age", "type": "date", "jsonPath": ".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSpec {
    /// Name of the permission; unique within the account and region
    pub name: String,

    /// Resource type the permission applies to, e.g. `imagebuilder:Component`
    pub resource_type: String,

    /// JSON policy template with the Effect, Action and Condition elements
    pub policy_template: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

/// Permission status
///
/// Every field is serialized, unset ones as `null`, so a merge patch of the
/// status clears values that went away.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionStatus {
    pub ack_resource_metadata: Option<ResourceMetadata>,

    #[serde(default)]
    #[schemars(with = "Vec<Condition>")]
    pub conditions: Conditions,

    pub creation_time: Option<DateTime<Utc>>,

    pub last_updated_time: Option<DateTime<Utc>>,

    /// Whether `version` is the default version of the permission
    pub default_version: Option<bool>,

    pub is_resource_type_default: Option<bool>,

    pub feature_set: Option<String>,

    pub permission_type: Option<String>,

    /// Lifecycle status (ATTACHABLE, UNATTACHABLE, DELETING, DELETED)
    pub status: Option<String>,

    /// Active policy version
    pub version: Option<String>,
}

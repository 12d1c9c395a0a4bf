//! Types shared by every RAM custom resource

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Key/value tag attached to a RAM entity
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub key: String,

    #[serde(default)]
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Identity of the AWS entity backing a custom resource
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetadata {
    /// ARN of the AWS entity, set once it exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,

    /// Account owning the entity
    #[serde(rename = "ownerAccountID", skip_serializing_if = "Option::is_none")]
    pub owner_account_id: Option<String>,

    /// Region the entity lives in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

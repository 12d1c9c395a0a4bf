//! Custom Resource Definitions for the RAM controller

mod common;
mod conditions;
mod permission;
mod resource_share;

pub use common::*;
pub use conditions::*;
pub use permission::*;
pub use resource_share::*;

use std::fmt::Debug;

use kube::core::NamespaceResourceScope;
use kube::{CustomResourceExt, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Generate CRD YAML manifests for all custom resources
pub fn generate_crds() -> Result<Vec<String>, serde_yaml::Error> {
    Ok(vec![
        serde_yaml::to_string(&Permission::crd())?,
        serde_yaml::to_string(&ResourceShare::crd())?,
    ])
}

/// Status accessors shared by every custom resource backed by a RAM entity
pub trait ManagedResource:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// ARN of the backing entity, if it has been created
    fn arn(&self) -> Option<&str>;

    fn conditions(&self) -> Option<&Conditions>;

    fn conditions_mut(&mut self) -> &mut Conditions;

    fn resource_metadata_mut(&mut self) -> &mut ResourceMetadata;

    /// Body of a merge patch against the status subresource
    fn status_patch(&self) -> serde_json::Value;

    /// Fill in region and condition defaults
    fn set_status_defaults(&mut self, region: Option<&str>) {
        let metadata = self.resource_metadata_mut();
        if metadata.region.is_none() {
            metadata.region = region.map(str::to_string);
        }
    }
}

impl ManagedResource for Permission {
    fn arn(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.ack_resource_metadata.as_ref())
            .and_then(|m| m.arn.as_deref())
    }

    fn conditions(&self) -> Option<&Conditions> {
        self.status.as_ref().map(|s| &s.conditions)
    }

    fn conditions_mut(&mut self) -> &mut Conditions {
        &mut self.status.get_or_insert_with(Default::default).conditions
    }

    fn resource_metadata_mut(&mut self) -> &mut ResourceMetadata {
        self.status
            .get_or_insert_with(Default::default)
            .ack_resource_metadata
            .get_or_insert_with(Default::default)
    }

    fn status_patch(&self) -> serde_json::Value {
        serde_json::json!({ "status": self.status })
    }
}

impl ManagedResource for ResourceShare {
    fn arn(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.ack_resource_metadata.as_ref())
            .and_then(|m| m.arn.as_deref())
    }

    fn conditions(&self) -> Option<&Conditions> {
        self.status.as_ref().map(|s| &s.conditions)
    }

    fn conditions_mut(&mut self) -> &mut Conditions {
        &mut self.status.get_or_insert_with(Default::default).conditions
    }

    fn resource_metadata_mut(&mut self) -> &mut ResourceMetadata {
        self.status
            .get_or_insert_with(Default::default)
            .ack_resource_metadata
            .get_or_insert_with(Default::default)
    }

    fn status_patch(&self) -> serde_json::Value {
        serde_json::json!({ "status": self.status })
    }
}

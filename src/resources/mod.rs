//! Per-kind resource managers
//!
//! A [`ResourceManager`] maps one custom resource kind onto RAM calls. The
//! generic reconciler in [`crate::reconcilers`] drives any manager through
//! the same read / create / delta / update sequence.

pub mod permission;
pub mod resource_share;
pub mod tags;

use std::sync::Arc;

use async_trait::async_trait;

use crate::compare::Delta;
use crate::crd::ManagedResource;
use crate::metrics::Metrics;
use crate::ram::{ApiResult, RamApi};
use crate::Result;

pub use permission::PermissionManager;
pub use resource_share::ResourceShareManager;

/// Operation types used to label API call metrics
pub mod op {
    pub const READ_ONE: &str = "READ_ONE";
    pub const READ_MANY: &str = "READ_MANY";
    pub const CREATE: &str = "CREATE";
    pub const UPDATE: &str = "UPDATE";
    pub const DELETE: &str = "DELETE";
}

/// Everything a manager needs to reach RAM
#[derive(Clone)]
pub struct AwsSession {
    pub ram: Arc<dyn RamApi>,
    pub metrics: Arc<Metrics>,
    /// Region reported in resource metadata
    pub region: Option<String>,
}

impl AwsSession {
    pub fn new(ram: Arc<dyn RamApi>, metrics: Arc<Metrics>, region: Option<String>) -> Self {
        Self {
            ram,
            metrics,
            region,
        }
    }

    /// Record the call outcome and lift the error into the controller error
    pub fn record<T>(&self, op_type: &str, op_id: &str, result: ApiResult<T>) -> Result<T> {
        self.metrics.record_api_call(op_type, op_id, &result);
        Ok(result?)
    }
}

#[async_trait]
pub trait ResourceManager: Send + Sync + 'static {
    type Resource: ManagedResource;

    fn session(&self) -> &AwsSession;

    /// Reject desired state that can never be reconciled
    fn validate(&self, desired: &Self::Resource) -> Result<()>;

    /// Observed state of the entity backing `desired`; `NotFound` if absent
    async fn read_one(&self, desired: &Self::Resource) -> Result<Self::Resource>;

    async fn create(&self, desired: &Self::Resource) -> Result<Self::Resource>;

    async fn update(
        &self,
        desired: &Self::Resource,
        latest: &Self::Resource,
        delta: &Delta,
    ) -> Result<Self::Resource>;

    async fn delete(&self, latest: &Self::Resource) -> Result<()>;

    fn delta(&self, a: Option<&Self::Resource>, b: Option<&Self::Resource>) -> Delta;

    /// Whether the entity has settled in a usable state
    fn is_synced(&self, latest: &Self::Resource) -> bool;

    /// Whether an update touching `delta` needs another pass to observe its effect
    fn requeue_after_update(&self, _delta: &Delta) -> bool {
        false
    }
}

//! Controller implementations for watching and reconciling resources

pub mod resource_controller;

use kube::Client;
use std::sync::Arc;

use crate::config::Settings;
use crate::metrics::Metrics;

/// Shared context for one controller
pub struct Context<M> {
    /// Kubernetes client
    pub client: Client,
    /// Manager for the watched kind
    pub manager: M,
    pub metrics: Arc<Metrics>,
    pub settings: Settings,
}

impl<M> Context<M> {
    /// Create a new context
    pub fn new(client: Client, manager: M, metrics: Arc<Metrics>, settings: Settings) -> Arc<Self> {
        Arc::new(Self {
            client,
            manager,
            metrics,
            settings,
        })
    }
}

//! Kubernetes controller for AWS Resource Access Manager
//!
//! Manages RAM customer-managed permissions and resource shares through the
//! `Permission` and `ResourceShare` custom resources.

pub mod adapters;
pub mod compare;
pub mod config;
pub mod controllers;
pub mod crd;
pub mod error;
pub mod metrics;
pub mod ram;
pub mod reconcilers;
pub mod resources;
pub mod sync;

pub use error::{Error, Result};

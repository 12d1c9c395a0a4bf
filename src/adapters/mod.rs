//! Adapters binding the controller to external services

pub mod ram_sdk;

pub use ram_sdk::SdkRamApi;

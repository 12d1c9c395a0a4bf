//! Prometheus metrics for the RAM controller
//!
//! This module exposes metrics for monitoring controller health and RAM API usage.

pub mod prometheus;

pub use self::prometheus::*;

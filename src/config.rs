//! Controller settings read from the environment

use std::time::Duration;

use crate::{Error, Result};

/// Default metrics port
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Default interval between passes over a synced resource
pub const DEFAULT_RESYNC_SECONDS: u64 = 600;

pub const METRICS_PORT_ENV: &str = "RAM_CONTROLLER_METRICS_PORT";
pub const WATCH_NAMESPACE_ENV: &str = "RAM_CONTROLLER_WATCH_NAMESPACE";
pub const RESYNC_SECONDS_ENV: &str = "RAM_CONTROLLER_RESYNC_SECONDS";
pub const AWS_REGION_ENV: &str = "AWS_REGION";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub metrics_port: u16,
    /// Only watch this namespace; all namespaces when unset
    pub watch_namespace: Option<String>,
    pub resync_period: Duration,
    /// Region override; the AWS default chain decides when unset
    pub aws_region: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            metrics_port: DEFAULT_METRICS_PORT,
            watch_namespace: None,
            resync_period: Duration::from_secs(DEFAULT_RESYNC_SECONDS),
            aws_region: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut settings = Settings::default();

        if let Some(port) = non_empty(METRICS_PORT_ENV) {
            settings.metrics_port = port.trim().parse().map_err(|e| {
                Error::ConfigError(format!("{} must be a port number: {}", METRICS_PORT_ENV, e))
            })?;
        }

        if let Some(secs) = non_empty(RESYNC_SECONDS_ENV) {
            let secs: u64 = secs.trim().parse().map_err(|e| {
                Error::ConfigError(format!("{} must be a number of seconds: {}", RESYNC_SECONDS_ENV, e))
            })?;
            if secs == 0 {
                return Err(Error::ConfigError(format!(
                    "{} must be greater than zero",
                    RESYNC_SECONDS_ENV
                )));
            }
            settings.resync_period = Duration::from_secs(secs);
        }

        settings.watch_namespace = non_empty(WATCH_NAMESPACE_ENV);
        settings.aws_region = non_empty(AWS_REGION_ENV);

        Ok(settings)
    }
}

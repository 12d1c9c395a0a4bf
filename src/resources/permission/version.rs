//! Permission policy version rotation
//!
//! RAM does not let two versions describing the same change live side by
//! side, so a policy update creates a new version, deletes the version that
//! was default before, and promotes the new one. Each run starts over from
//! the first step; the observed permission decides which version is old.

use tracing::info;

use crate::ram::PermissionDetail;
use crate::resources::{op, AwsSession};
use crate::{Error, Result};

/// Progress of one rotation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RotationState {
    NoVersion,
    VersionCreated { version: String },
    OldVersionDeleted { version: String },
    DefaultVersionSet { version: String },
}

pub struct VersionRotation<'a> {
    session: &'a AwsSession,
    arn: &'a str,
    state: RotationState,
}

/// Permission versions are decimal integers carried as strings
pub fn parse_version(version: &str) -> Result<i32> {
    version.trim().parse().map_err(|_| {
        Error::ValidationError(format!("permission version {:?} is not an integer", version))
    })
}

impl<'a> VersionRotation<'a> {
    pub fn new(session: &'a AwsSession, arn: &'a str) -> Self {
        Self {
            session,
            arn,
            state: RotationState::NoVersion,
        }
    }

    pub fn state(&self) -> &RotationState {
        &self.state
    }

    /// Replace `previous_version` with a new default version holding `policy_template`
    ///
    /// Returns the created version as reported by RAM, marked default.
    pub async fn run(
        &mut self,
        previous_version: Option<&str>,
        policy_template: &str,
    ) -> Result<PermissionDetail> {
        self.state = RotationState::NoVersion;

        let previous = match previous_version {
            Some(v) => parse_version(v)?,
            None => {
                return Err(Error::ValidationError(format!(
                    "permission {} has no current version recorded",
                    self.arn
                )))
            }
        };

        let result = self
            .session
            .ram
            .create_permission_version(self.arn, policy_template)
            .await;
        let mut created = self
            .session
            .record(op::UPDATE, "CreatePermissionVersion", result)?;
        let version = created.version.clone().unwrap_or_default();
        self.state = RotationState::VersionCreated {
            version: version.clone(),
        };

        let result = self
            .session
            .ram
            .delete_permission_version(self.arn, previous)
            .await;
        self.session
            .record(op::DELETE, "DeletePermissionVersion", result)?;
        info!(
            permission_arn = self.arn,
            permission_version = previous,
            "deleted previous permission version"
        );
        self.state = RotationState::OldVersionDeleted {
            version: version.clone(),
        };

        let new_version = parse_version(&version)?;
        let result = self
            .session
            .ram
            .set_default_permission_version(self.arn, new_version)
            .await;
        self.session
            .record(op::UPDATE, "SetDefaultPermissionVersion", result)?;
        self.state = RotationState::DefaultVersionSet { version };

        created.default_version = Some(true);
        Ok(created)
    }
}

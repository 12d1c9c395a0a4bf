//! Principal, resource, source and permission associations of a share

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::compare::sets;
use crate::crd::ResourceShareSpec;
use crate::ram::AssociationBatch;
use crate::resources::{op, AwsSession};
use crate::sync::RemoteMutator;
use crate::Result;

/// Principals, resource ARNs and sources share one associate/disassociate
/// API, so their changes travel together
pub struct ShareAssociations<'a> {
    session: &'a AwsSession,
    share_arn: &'a str,
}

impl<'a> ShareAssociations<'a> {
    pub fn new(session: &'a AwsSession, share_arn: &'a str) -> Self {
        Self { session, share_arn }
    }
}

fn into_vec(set: BTreeSet<String>) -> Vec<String> {
    set.into_iter().collect()
}

#[async_trait]
impl<'a> RemoteMutator for ShareAssociations<'a> {
    type Snapshot = ResourceShareSpec;
    type Additions = AssociationBatch;
    type Removals = AssociationBatch;

    fn relation(&self) -> &'static str {
        "associations"
    }

    fn diff(
        &self,
        desired: &ResourceShareSpec,
        observed: &ResourceShareSpec,
    ) -> (AssociationBatch, AssociationBatch) {
        let principals = sets::difference(&desired.principals, &observed.principals);
        let resources = sets::difference(&desired.resource_arns, &observed.resource_arns);
        let sources = sets::difference(&desired.sources, &observed.sources);

        let additions = AssociationBatch {
            principals: into_vec(principals.to_add),
            resource_arns: into_vec(resources.to_add),
            sources: into_vec(sources.to_add),
        };
        let removals = AssociationBatch {
            principals: into_vec(principals.to_remove),
            resource_arns: into_vec(resources.to_remove),
            sources: into_vec(sources.to_remove),
        };
        (additions, removals)
    }

    async fn apply_removals(&self, removals: &AssociationBatch) -> Result<()> {
        let result = self
            .session
            .ram
            .disassociate_resource_share(self.share_arn, removals)
            .await;
        self.session
            .record(op::UPDATE, "DisassociateResourceShare", result)
    }

    async fn apply_additions(&self, additions: &AssociationBatch) -> Result<()> {
        let result = self
            .session
            .ram
            .associate_resource_share(self.share_arn, additions)
            .await;
        self.session
            .record(op::UPDATE, "AssociateResourceShare", result)
    }
}

/// Permissions attached to a share
///
/// RAM attaches and detaches one permission per call, so each batch turns
/// into one call per ARN, stopping at the first failure.
pub struct SharePermissions<'a> {
    session: &'a AwsSession,
    share_arn: &'a str,
}

impl<'a> SharePermissions<'a> {
    pub fn new(session: &'a AwsSession, share_arn: &'a str) -> Self {
        Self { session, share_arn }
    }
}

#[async_trait]
impl<'a> RemoteMutator for SharePermissions<'a> {
    type Snapshot = [String];
    type Additions = BTreeSet<String>;
    type Removals = BTreeSet<String>;

    fn relation(&self) -> &'static str {
        "permissions"
    }

    fn diff(&self, desired: &[String], observed: &[String]) -> (BTreeSet<String>, BTreeSet<String>) {
        let diff = sets::difference(desired, observed);
        (diff.to_add, diff.to_remove)
    }

    async fn apply_removals(&self, removals: &BTreeSet<String>) -> Result<()> {
        for permission_arn in removals {
            let result = self
                .session
                .ram
                .disassociate_resource_share_permission(self.share_arn, permission_arn)
                .await;
            self.session
                .record(op::UPDATE, "DisassociateResourceSharePermission", result)?;
        }
        Ok(())
    }

    async fn apply_additions(&self, additions: &BTreeSet<String>) -> Result<()> {
        for permission_arn in additions {
            let result = self
                .session
                .ram
                .associate_resource_share_permission(self.share_arn, permission_arn)
                .await;
            self.session
                .record(op::UPDATE, "AssociateResourceSharePermission", result)?;
        }
        Ok(())
    }
}

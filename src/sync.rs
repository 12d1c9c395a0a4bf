//! Applying a desired/observed difference through paired remote calls
//!
//! Every relation the controller keeps in sync (tags, share associations,
//! attached permissions) is a [`RemoteMutator`]: it knows how to diff two
//! snapshots of the relation and how to issue the removal and addition
//! calls. [`sync`] drives them in a fixed order: removals first, then
//! additions, stopping at the first failure.

use std::collections::BTreeSet;
use std::fmt::Debug;

use async_trait::async_trait;
use tracing::debug;

use crate::compare::Tags;
use crate::ram::AssociationBatch;
use crate::Result;

/// A set of changes that may be empty
pub trait Batch {
    fn is_empty(&self) -> bool;
}

impl Batch for Tags {
    fn is_empty(&self) -> bool {
        Tags::is_empty(self)
    }
}

impl Batch for BTreeSet<String> {
    fn is_empty(&self) -> bool {
        BTreeSet::is_empty(self)
    }
}

impl Batch for AssociationBatch {
    fn is_empty(&self) -> bool {
        AssociationBatch::is_empty(self)
    }
}

#[async_trait]
pub trait RemoteMutator: Send + Sync {
    /// Desired or observed state of the relation
    type Snapshot: ?Sized + Sync;
    type Additions: Batch + Debug + Send + Sync;
    type Removals: Batch + Debug + Send + Sync;

    /// Relation name used in logs
    fn relation(&self) -> &'static str;

    fn diff(
        &self,
        desired: &Self::Snapshot,
        observed: &Self::Snapshot,
    ) -> (Self::Additions, Self::Removals);

    async fn apply_removals(&self, removals: &Self::Removals) -> Result<()>;

    async fn apply_additions(&self, additions: &Self::Additions) -> Result<()>;
}

/// Move the remote relation from `observed` to `desired`
///
/// A failed removal aborts before any addition. A failed addition is
/// returned as is; removals already applied stay applied.
pub async fn sync<M>(mutator: &M, desired: &M::Snapshot, observed: &M::Snapshot) -> Result<()>
where
    M: RemoteMutator + ?Sized,
{
    let (additions, removals) = mutator.diff(desired, observed);

    if !removals.is_empty() {
        debug!(relation = mutator.relation(), ?removals, "removing");
        mutator.apply_removals(&removals).await?;
    }

    if !additions.is_empty() {
        debug!(relation = mutator.relation(), ?additions, "adding");
        mutator.apply_additions(&additions).await?;
    }

    Ok(())
}

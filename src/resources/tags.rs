//! Tag synchronization shared by every kind

use async_trait::async_trait;

use crate::compare::tags::{self, Tags};
use crate::crd::Tag;
use crate::ram::TagTarget;
use crate::sync::RemoteMutator;
use crate::Result;

use super::{op, AwsSession};

/// Tags and untags one RAM entity
pub struct TagMutator<'a> {
    session: &'a AwsSession,
    target: TagTarget<'a>,
}

impl<'a> TagMutator<'a> {
    pub fn new(session: &'a AwsSession, target: TagTarget<'a>) -> Self {
        Self { session, target }
    }
}

#[async_trait]
impl<'a> RemoteMutator for TagMutator<'a> {
    type Snapshot = [Tag];
    type Additions = Tags;
    type Removals = Tags;

    fn relation(&self) -> &'static str {
        "tags"
    }

    fn diff(&self, desired: &[Tag], observed: &[Tag]) -> (Tags, Tags) {
        let diff = tags::difference(desired, observed);
        (diff.to_add, diff.to_remove)
    }

    async fn apply_removals(&self, removals: &Tags) -> Result<()> {
        let keys: Vec<String> = removals.keys().cloned().collect();
        let result = self.session.ram.untag_resource(self.target, &keys).await;
        self.session.record(op::UPDATE, "UntagResource", result)
    }

    async fn apply_additions(&self, additions: &Tags) -> Result<()> {
        let result = self
            .session
            .ram
            .tag_resource(self.target, &tags::from_map(additions))
            .await;
        self.session.record(op::UPDATE, "TagResource", result)
    }
}

//! Tag normalization and tag difference

use std::collections::BTreeMap;

use crate::crd::Tag;

/// Prefix of tags managed by AWS services; they cannot be changed or removed
pub const AWS_TAG_PREFIX: &str = "aws:";

pub const NAMESPACE_TAG_KEY: &str = "services.k8s.aws/namespace";
pub const CONTROLLER_VERSION_TAG_KEY: &str = "services.k8s.aws/controller-version";

/// Tags the controller attaches itself
pub const SYSTEM_TAG_KEYS: [&str; 2] = [NAMESPACE_TAG_KEY, CONTROLLER_VERSION_TAG_KEY];

/// Tags keyed by tag key
pub type Tags = BTreeMap<String, String>;

/// Tags to apply and tags to remove to move observed onto desired
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagDifference {
    /// New keys and keys whose value changed
    pub to_add: Tags,
    /// Keys absent from desired, excluding reserved and system tags
    pub to_remove: Tags,
}

impl TagDifference {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

pub fn to_map(tags: &[Tag]) -> Tags {
    tags.iter()
        .map(|t| (t.key.clone(), t.value.clone()))
        .collect()
}

pub fn from_map(tags: &Tags) -> Vec<Tag> {
    tags.iter().map(|(k, v)| Tag::new(k, v)).collect()
}

pub fn is_reserved(key: &str) -> bool {
    key.starts_with(AWS_TAG_PREFIX)
}

/// Reserved `aws:` tags and the controller's own tags
pub fn is_system_tag(key: &str) -> bool {
    is_reserved(key) || SYSTEM_TAG_KEYS.contains(&key)
}

/// Drop tags user reconciliation must not see
pub fn ignore_system_tags(tags: &mut Tags) {
    tags.retain(|k, _| !is_system_tag(k));
}

/// Copy every reserved tag of `observed` into `desired`
pub fn sync_aws_tags(desired: &mut Tags, observed: &Tags) {
    for (k, v) in observed {
        if is_reserved(k) {
            desired.insert(k.clone(), v.clone());
        }
    }
}

/// Controller tags attached on creation
pub fn system_tags(namespace: &str) -> Tags {
    Tags::from([
        (NAMESPACE_TAG_KEY.to_string(), namespace.to_string()),
        (
            CONTROLLER_VERSION_TAG_KEY.to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        ),
    ])
}

/// Difference between desired and observed tags
///
/// Desired is first augmented with the observed reserved tags, so user
/// specs may omit them. A changed value is re-applied as an addition.
pub fn difference(desired: &[Tag], observed: &[Tag]) -> TagDifference {
    let observed = to_map(observed);
    let mut desired = to_map(desired);
    sync_aws_tags(&mut desired, &observed);

    let to_add = desired
        .iter()
        .filter(|(k, v)| observed.get(*k) != Some(*v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let to_remove = observed
        .iter()
        .filter(|(k, _)| !desired.contains_key(*k) && !is_system_tag(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    TagDifference { to_add, to_remove }
}

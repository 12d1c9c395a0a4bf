//! Field-level differences between two resource snapshots

use serde::Serialize;
use serde_json::Value;

use crate::crd::Tag;

use super::{sets, tags};

/// Path recorded when one side of the comparison is missing entirely
pub const WHOLE_RESOURCE: &str = "";

/// One differing field
#[derive(Clone, Debug, PartialEq)]
pub struct Difference {
    pub path: String,
    pub a: Value,
    pub b: Value,
}

/// The set of differing fields between two snapshots
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Delta {
    differences: Vec<Difference>,
}

impl Delta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<A: Serialize + ?Sized, B: Serialize + ?Sized>(&mut self, path: &str, a: &A, b: &B) {
        self.differences.push(Difference {
            path: path.to_string(),
            a: serde_json::to_value(a).unwrap_or(Value::Null),
            b: serde_json::to_value(b).unwrap_or(Value::Null),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    pub fn differences(&self) -> &[Difference] {
        &self.differences
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.differences.iter().map(|d| d.path.as_str())
    }

    /// True if `path`, or a field nested under it, differs
    pub fn different_at(&self, path: &str) -> bool {
        self.differences.iter().any(|d| {
            d.path == path
                || d.path
                    .strip_prefix(path)
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }
}

/// Start a delta, short-circuiting when exactly one side is missing
///
/// Returns `Err` with a single whole-resource difference when one side is
/// absent, and `Ok` with both sides when present.
pub fn start<'a, T: Serialize>(
    a: Option<&'a T>,
    b: Option<&'a T>,
) -> Result<(&'a T, &'a T), Delta> {
    match (a, b) {
        (Some(a), Some(b)) => Ok((a, b)),
        (a, b) => {
            let mut delta = Delta::new();
            if a.is_some() || b.is_some() {
                delta.add(WHOLE_RESOURCE, &a, &b);
            }
            Err(delta)
        }
    }
}

/// Required scalar: exact equality
pub fn compare_scalar<T: PartialEq + Serialize + ?Sized>(delta: &mut Delta, path: &str, a: &T, b: &T) {
    if a != b {
        delta.add(path, a, b);
    }
}

/// Optional scalar: presence on one side only, or different values
pub fn compare_optional<T: PartialEq + Serialize>(
    delta: &mut Delta,
    path: &str,
    a: Option<&T>,
    b: Option<&T>,
) {
    match (a, b) {
        (Some(x), Some(y)) if x == y => {}
        (None, None) => {}
        _ => delta.add(path, &a, &b),
    }
}

/// Ordered list: length or index-wise mismatch
pub fn compare_sequence<T: PartialEq + Serialize>(delta: &mut Delta, path: &str, a: &[T], b: &[T]) {
    if a.len() != b.len() || a.iter().zip(b).any(|(x, y)| x != y) {
        delta.add(path, a, b);
    }
}

/// Unordered identifier set: different members, duplicates ignored
pub fn compare_string_set(delta: &mut Delta, path: &str, a: &[String], b: &[String]) {
    if !sets::same_elements(a, b) {
        delta.add(path, a, b);
    }
}

/// Tags: length mismatch, or a non-empty normalized tag difference
pub fn compare_tags(delta: &mut Delta, path: &str, a: &[Tag], b: &[Tag]) {
    if a.len() != b.len() || (!a.is_empty() && !tags::difference(a, b).is_empty()) {
        delta.add(path, a, b);
    }
}

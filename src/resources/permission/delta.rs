//! Drift detection for Permission resources

use crate::compare::delta::{self, Delta};
use crate::crd::Permission;

/// Compare two Permission snapshots
pub fn new_resource_delta(a: Option<&Permission>, b: Option<&Permission>) -> Delta {
    let (a, b) = match delta::start(a, b) {
        Ok(pair) => pair,
        Err(delta) => return delta,
    };
    let mut delta = Delta::new();

    delta::compare_tags(&mut delta, "Spec.Tags", &a.spec.tags, &b.spec.tags);
    delta::compare_scalar(&mut delta, "Spec.Name", &a.spec.name, &b.spec.name);
    compare_policy(&mut delta, &a.spec.policy_template, &b.spec.policy_template);
    delta::compare_scalar(
        &mut delta,
        "Spec.ResourceType",
        &a.spec.resource_type,
        &b.spec.resource_type,
    );

    delta
}

/// Policy templates are equal when they hold the same JSON document
fn compare_policy(delta: &mut Delta, a: &str, b: &str) {
    let same = match (
        serde_json::from_str::<serde_json::Value>(a),
        serde_json::from_str::<serde_json::Value>(b),
    ) {
        (Ok(x), Ok(y)) => x == y,
        _ => a == b,
    };
    if !same {
        delta.add("Spec.PolicyTemplate", a, b);
    }
}

//! Drift detection for ResourceShare resources

use crate::compare::delta::{self, Delta};
use crate::crd::ResourceShare;

/// Compare two ResourceShare snapshots
pub fn new_resource_delta(a: Option<&ResourceShare>, b: Option<&ResourceShare>) -> Delta {
    let (a, b) = match delta::start(a, b) {
        Ok(pair) => pair,
        Err(delta) => return delta,
    };
    let (a, b) = (&a.spec, &b.spec);
    let mut delta = Delta::new();

    delta::compare_tags(&mut delta, "Spec.Tags", &a.tags, &b.tags);
    delta::compare_optional(
        &mut delta,
        "Spec.AllowExternalPrincipals",
        a.allow_external_principals.as_ref(),
        b.allow_external_principals.as_ref(),
    );
    delta::compare_scalar(&mut delta, "Spec.Name", &a.name, &b.name);
    delta::compare_string_set(
        &mut delta,
        "Spec.PermissionARNs",
        &a.permission_arns,
        &b.permission_arns,
    );
    delta::compare_string_set(&mut delta, "Spec.Principals", &a.principals, &b.principals);
    delta::compare_string_set(
        &mut delta,
        "Spec.ResourceARNs",
        &a.resource_arns,
        &b.resource_arns,
    );
    delta::compare_string_set(&mut delta, "Spec.Sources", &a.sources, &b.sources);

    delta
}

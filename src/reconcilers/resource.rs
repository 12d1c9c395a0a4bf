//! Read / create / delta / update pass driven through a [`ResourceManager`]

use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use tracing::{debug, info};

use crate::crd::ManagedResource;
use crate::resources::ResourceManager;
use crate::{Error, Result};

/// Outcome of a successful pass
#[derive(Clone, Debug)]
pub struct Reconciled<R> {
    /// Latest known state, conditions included, ready for a status patch
    pub resource: R,
    /// Whether the AWS entity has settled
    pub synced: bool,
}

/// Bring the AWS entity backing `desired` in line with it
///
/// Creates the entity when it does not exist, otherwise updates only the
/// fields the delta reports. Errors are returned untouched; see
/// [`record_failure`] for turning them into conditions.
pub async fn reconcile<M: ResourceManager>(
    manager: &M,
    desired: &M::Resource,
) -> Result<Reconciled<M::Resource>> {
    manager.validate(desired)?;

    let mut requeue = false;
    let mut resource = match manager.read_one(desired).await {
        Ok(latest) => {
            let delta = manager.delta(Some(desired), Some(&latest));
            if delta.is_empty() {
                latest
            } else {
                debug!(paths = ?delta.paths().collect::<Vec<_>>(), "desired state differs");
                requeue = manager.requeue_after_update(&delta);
                manager.update(desired, &latest, &delta).await?
            }
        }
        Err(e) if e.is_not_found() => {
            info!(name = %desired.name_any(), "creating AWS entity");
            manager.create(desired).await?
        }
        Err(e) => return Err(e),
    };

    resource.set_status_defaults(manager.session().region.as_deref());
    let synced = !requeue && manager.is_synced(&resource);
    let conditions = resource.conditions_mut();
    conditions.record_outcome(None);
    let message = (!synced).then(|| "waiting for the AWS entity to settle".to_string());
    conditions.set_synced(synced, message);

    Ok(Reconciled { resource, synced })
}

/// `desired` with conditions describing `err`
pub fn record_failure<R: ManagedResource>(desired: &R, err: &Error) -> R {
    let mut failed = desired.clone();
    let conditions = failed.conditions_mut();
    conditions.record_outcome(Some(err));
    conditions.set_synced(false, None);
    failed
}

/// Delete the AWS entity backing `desired`, tolerating its absence
pub async fn delete<M: ResourceManager>(manager: &M, desired: &M::Resource) -> Result<()> {
    if desired.arn().is_none() {
        debug!(name = %desired.name_any(), "no AWS entity was ever created");
        return Ok(());
    }

    let latest = match manager.read_one(desired).await {
        Ok(latest) => latest,
        Err(e) if e.is_not_found() => return Ok(()),
        Err(e) => return Err(e),
    };

    match manager.delete(&latest).await {
        Err(e) if e.is_not_found() => Ok(()),
        other => other,
    }
}

/// Merge-patch the status subresource with the status of `resource`
pub async fn update_status<R: ManagedResource>(client: &Client, resource: &R) -> Result<()> {
    let namespace = resource.namespace().unwrap_or_default();
    let name = resource.name_any();
    let api: Api<R> = Api::namespaced(client.clone(), &namespace);

    api.patch_status(
        &name,
        &PatchParams::default(),
        &Patch::Merge(&resource.status_patch()),
    )
    .await
    .map_err(|e| Error::KubeError(format!("Failed to update status: {}", e)))?;

    debug!("Updated status for {}/{}", namespace, name);
    Ok(())
}

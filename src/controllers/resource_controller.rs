//! Controller loop shared by every managed resource kind

use futures::StreamExt;
use kube::{
    runtime::{
        controller::{Action, Controller},
        finalizer::{finalizer, Event},
        watcher::Config,
    },
    Api, Resource, ResourceExt,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::controllers::Context;
use crate::reconcilers::resource as reconciler;
use crate::resources::ResourceManager;
use crate::Error;

/// Finalizer name for cleanup
pub const FINALIZER: &str = "ram.services.k8s.aws/finalizer";

/// Requeue interval while the AWS entity has not settled
pub const UNSYNCED_REQUEUE: Duration = Duration::from_secs(30);

fn kind<M: ResourceManager>() -> String {
    M::Resource::kind(&()).to_string()
}

/// Run the controller for the kind managed by `M`
pub async fn run<M: ResourceManager>(ctx: Arc<Context<M>>) {
    let kind = kind::<M>();
    let api: Api<M::Resource> = match &ctx.settings.watch_namespace {
        Some(ns) => Api::namespaced(ctx.client.clone(), ns),
        None => Api::all(ctx.client.clone()),
    };

    info!("Starting {} controller", kind);

    Controller::new(api, Config::default().any_semantic())
        .shutdown_on_signal()
        .run(reconcile::<M>, error_policy::<M>, ctx)
        .for_each(|res| async move {
            match res {
                Ok(o) => info!("Reconciled {:?}", o),
                Err(e) => error!("Reconcile failed: {:?}", e),
            }
        })
        .await;

    info!("{} controller stopped", kind);
}

/// Reconcile one resource through its finalizer
#[instrument(skip(resource, ctx), fields(name = %resource.name_any(), namespace = resource.namespace().unwrap_or_default()))]
async fn reconcile<M: ResourceManager>(
    resource: Arc<M::Resource>,
    ctx: Arc<Context<M>>,
) -> Result<Action, Error> {
    let start = std::time::Instant::now();
    let kind = kind::<M>();
    let ns = resource.namespace().unwrap_or_default();
    let name = resource.name_any();

    ctx.metrics
        .reconciliations
        .with_label_values(&[kind.as_str()])
        .inc();

    let api: Api<M::Resource> = Api::namespaced(ctx.client.clone(), &ns);

    let result = finalizer(&api, FINALIZER, resource, |event| async {
        match event {
            Event::Apply(resource) => apply(resource.as_ref(), &ctx).await,
            Event::Cleanup(resource) => cleanup(resource.as_ref(), &ctx).await,
        }
    })
    .await;

    let duration = start.elapsed().as_secs_f64();
    ctx.metrics
        .reconcile_duration
        .with_label_values(&[kind.as_str()])
        .observe(duration);

    match &result {
        Ok(_) => info!(
            "Successfully reconciled {} {}/{} in {:.2}s",
            kind, ns, name, duration
        ),
        Err(e) => {
            ctx.metrics
                .reconciliation_errors
                .with_label_values(&[kind.as_str()])
                .inc();
            error!("Failed to reconcile {} {}/{}: {:?}", kind, ns, name, e);
        }
    }

    Ok(result?)
}

/// Reconcile the AWS entity and report the outcome on the status subresource
async fn apply<M: ResourceManager>(desired: &M::Resource, ctx: &Context<M>) -> Result<Action, Error> {
    match reconciler::reconcile(&ctx.manager, desired).await {
        Ok(outcome) => {
            reconciler::update_status(&ctx.client, &outcome.resource).await?;
            if outcome.synced {
                Ok(Action::requeue(ctx.settings.resync_period))
            } else {
                Ok(Action::requeue(UNSYNCED_REQUEUE))
            }
        }
        Err(err) => {
            let failed = reconciler::record_failure(desired, &err);
            if let Err(e) = reconciler::update_status(&ctx.client, &failed).await {
                warn!("Could not record failure on status: {}", e);
            }

            if err.is_terminal() {
                warn!("Terminal error, waiting for a spec change: {}", err);
                Ok(Action::await_change())
            } else {
                Err(err)
            }
        }
    }
}

/// Delete the AWS entity before the finalizer is released
async fn cleanup<M: ResourceManager>(desired: &M::Resource, ctx: &Context<M>) -> Result<Action, Error> {
    info!(
        "Cleaning up {} {}/{}",
        kind::<M>(),
        desired.namespace().unwrap_or_default(),
        desired.name_any()
    );

    reconciler::delete(&ctx.manager, desired).await?;
    Ok(Action::await_change())
}

/// Error policy for the controller
fn error_policy<M: ResourceManager>(
    resource: Arc<M::Resource>,
    err: &Error,
    _ctx: Arc<Context<M>>,
) -> Action {
    let ns = resource.namespace().unwrap_or_default();
    let name = resource.name_any();

    error!("Reconciliation error for {}/{}: {:?}", ns, name, err);

    Action::requeue(error_backoff(err))
}

/// Backoff for errors `apply` hands back to the runtime
///
/// Terminal errors never get here: `apply` waits for a spec change instead.
fn error_backoff(err: &Error) -> Duration {
    match err {
        Error::KubeError(_) => Duration::from_secs(30),
        _ => Duration::from_secs(60),
    }
}

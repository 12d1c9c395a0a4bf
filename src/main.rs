//! RAM controller
//!
//! Main entry point for the controller. Sets up the Kubernetes and RAM
//! clients, registers the CRD controllers, and runs the reconciliation loops.

use std::sync::Arc;

use aws_config::{BehaviorVersion, Region};
use kube::Client;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ram_controller::{
    adapters::SdkRamApi,
    config::Settings,
    controllers::{resource_controller, Context},
    metrics::{self, Metrics},
    resources::{AwsSession, PermissionManager, ResourceShareManager},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    info!("Starting RAM controller");

    let settings = Settings::from_env()?;

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes API server");

    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &settings.aws_region {
        loader = loader.region(Region::new(region.clone()));
    }
    let sdk_config = loader.load().await;
    let region = sdk_config.region().map(|r| r.to_string());
    info!(region = ?region, "Loaded AWS configuration");

    let controller_metrics = Arc::new(Metrics::new()?);
    let session = AwsSession::new(
        Arc::new(SdkRamApi::from_conf(&sdk_config)),
        controller_metrics.clone(),
        region,
    );

    let permissions = Context::new(
        client.clone(),
        PermissionManager::new(session.clone()),
        controller_metrics.clone(),
        settings.clone(),
    );
    let resource_shares = Context::new(
        client,
        ResourceShareManager::new(session),
        controller_metrics.clone(),
        settings.clone(),
    );

    // Start metrics server
    let metrics_handle = tokio::spawn(metrics::serve(settings.metrics_port, controller_metrics));
    info!("Metrics server starting on port {}", settings.metrics_port);

    let permission_handle = tokio::spawn(resource_controller::run(permissions));
    let resource_share_handle = tokio::spawn(resource_controller::run(resource_shares));

    // Handle graceful shutdown
    tokio::select! {
        _ = permission_handle => {
            error!("Permission controller exited unexpectedly");
        }
        _ = resource_share_handle => {
            error!("ResourceShare controller exited unexpectedly");
        }
        _ = metrics_handle => {
            error!("Metrics server exited unexpectedly");
        }
        _ = shutdown_signal() => {
            info!("Received shutdown signal, stopping controller");
        }
    }

    info!("RAM controller stopped");
    Ok(())
}

/// Initialize tracing subscriber
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ram_controller=debug,kube=warn,hyper=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for CTRL+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received CTRL+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}

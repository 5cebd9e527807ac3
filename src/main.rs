use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use feedmovie_client::{
    config::Config,
    routes::{create_router, AppState},
    services::{BroadcastNotifier, Discovery, DiscoverySettings, HttpBackend},
    store::FilterStore,
};

const NOTIFICATION_CAPACITY: usize = 32;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feedmovie_client=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(backend = %config.backend_url, "Starting discovery service");

    let backend = HttpBackend::new(&config).context("Failed to build backend client")?;
    let notifier = BroadcastNotifier::new(NOTIFICATION_CAPACITY);
    let discovery = Discovery::new(
        Arc::new(backend),
        Arc::new(notifier.clone()),
        DiscoverySettings::from(&config),
        Some(FilterStore::new(&config.filters_path)),
    );

    // The surface shows the load error and offers a manual reload
    if let Err(e) = discovery.start().await {
        tracing::warn!(error = %e, "Initial batch load failed");
    }

    let app = create_router(AppState::new(discovery.clone(), notifier));

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
    tracing::info!("Local API listening on http://{}:{}", config.host, config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    discovery.shutdown().await;
    tracing::info!("Discovery service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

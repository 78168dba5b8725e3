//! TTS Playground Server Entry Point

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use tts_playground_client::HttpBackend;
use tts_playground_config::{load_settings, Settings};
use tts_playground_server::{create_router, AppState};
use tts_playground_store::PlaygroundStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Need observability settings before tracing can start
    let env = std::env::var("TTS_PLAYGROUND_ENV").ok();
    let config = load_settings(env.as_deref())?;

    init_tracing(&config);

    tracing::info!("Starting TTS Playground v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(backend = %config.backend.base_url, "Loaded configuration");

    let backend = HttpBackend::from_config(&config.backend)?;
    let state = AppState::new(config.clone(), Arc::new(backend));
    tracing::info!("Initialized application state");

    spawn_update_log(state.store.clone());

    // Initial catalog load; the page shows the loading state meanwhile
    let dispatcher = state.dispatcher.clone();
    tokio::spawn(async move {
        if let Err(e) = dispatcher.load_catalog().await {
            tracing::warn!(error = %e, "Initial catalog load failed");
        }
    });

    let app = create_router(state);

    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Log every published store update
fn spawn_update_log(store: Arc<PlaygroundStore>) {
    let mut updates = store.subscribe();
    tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(snapshot) => {
                    tracing::debug!(
                        revision = snapshot.revision,
                        epoch = snapshot.catalog_epoch,
                        pending = snapshot.runs.any_pending(),
                        "Playground updated"
                    );
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Update log lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

/// Console logging, plain or JSON
fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("tts_playground={},tower_http=debug", level).into()
    });

    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

//! Badminton scoreboard binary entrypoint wiring REST, SSE and match storage.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use badminton_scoreboard::{
    config::{AppConfig, StorageConfig},
    dao::{
        document::DocumentExtras,
        slot_store::{FileSlotStore, MatchStore, MemorySlotStore},
    },
    routes,
    services::{persistence, sse_events, storage_supervisor},
    state::{AppState, MatchEngine, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let store = open_store(&config.storage);
    info!(storage = %store.describe(), "match storage selected");

    let (engine, extras) = match persistence::restore(store.as_ref()).await {
        Some((state, extras)) => (
            MatchEngine::new(state, config.settings.clone(), config.reset_policy),
            extras,
        ),
        None => (
            MatchEngine::fresh(config.settings.clone(), config.reset_policy),
            DocumentExtras::default(),
        ),
    };

    let app_state = AppState::new(engine, store, extras, config.sheet_page_columns);
    sse_events::spawn_status_forwarder(app_state.clone());
    tokio::spawn(storage_supervisor::run(app_state.clone()));

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Build the configured store.
fn open_store(storage: &StorageConfig) -> Arc<dyn MatchStore> {
    match storage {
        StorageConfig::File { path, key } => Arc::new(FileSlotStore::new(path, key)),
        StorageConfig::Memory => Arc::new(MemorySlotStore::new()),
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

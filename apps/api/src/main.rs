use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tailor_api::config::Config;
use tailor_api::generation::session::SessionRegistry;
use tailor_api::generation::workflow::GenerationWorkflow;
use tailor_api::llm_client::build_client;
use tailor_api::routes::build_router;
use tailor_api::state::AppState;
use tailor_api::templates::store::FsTemplateStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("tailor_api={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize completion client (fails fast when the provider key is missing)
    let client_config = config.client_config();
    let client = build_client(&client_config)
        .with_context(|| format!("Failed to initialize {} backend", config.backend))?;
    info!(
        "Completion client initialized (backend: {}, model: {})",
        client_config.backend, client_config.model
    );

    // Initialize template store
    let store = Arc::new(FsTemplateStore::new(config.templates_dir.clone()));
    info!("Template store at {}", store.dir().display());

    let workflow = GenerationWorkflow::new(client, config.completion_options())
        .with_marker(config.cover_letter_marker.clone());

    // Build app state
    let state = AppState {
        store,
        workflow: Arc::new(workflow),
        sessions: SessionRegistry::new(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web form has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use polku_api::backend::{HttpBackend, OpportunityBackend};
use polku_api::codeset::CodesetResolver;
use polku_api::config::Config;
use polku_api::routes::build_router;
use polku_api::sessions::SessionRegistry;
use polku_api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Polku API v{}", env!("CARGO_PKG_VERSION"));

    // Load codeset lookup tables
    let codesets = Arc::new(CodesetResolver::load(&config.codeset_dir)?);
    info!("Codesets loaded from {}", config.codeset_dir.display());

    // Initialize the upstream backend client
    let backend: Arc<dyn OpportunityBackend> =
        Arc::new(HttpBackend::new(config.backend_api_url.clone()));
    info!("Backend client initialized ({})", config.backend_api_url);

    // Session registry: stores are created per session on first use
    let sessions = Arc::new(SessionRegistry::new());

    // Build app state
    let state = AppState {
        backend,
        codesets,
        sessions,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

mod analytics;
mod config;
mod errors;
mod insights;
mod jobs;
mod llm_client;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StoreBackend};
use crate::insights::InsightGateway;
use crate::jobs::store::demo_jobs;
use crate::jobs::{JobRepository, JsonFileJobStore, MemoryJobStore};
use crate::llm_client::{CompletionProvider, LlmClient};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting jobtrack API v{}", env!("CARGO_PKG_VERSION"));

    let store = build_store(&config).await?;
    info!("Job store initialized (backend: {})", store.backend());

    let gateway = build_gateway(&config)?;

    let state = AppState::new(store.clone(), gateway);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.shutdown().await?;
    info!("Shutdown complete");

    Ok(())
}

async fn build_store(config: &Config) -> Result<Arc<dyn JobRepository>> {
    let store: Arc<dyn JobRepository> = match config.store_backend {
        StoreBackend::Memory => {
            if config.seed_demo_data {
                info!("Seeding memory store with demo jobs");
                Arc::new(MemoryJobStore::with_jobs(demo_jobs()))
            } else {
                Arc::new(MemoryJobStore::new())
            }
        }
        StoreBackend::File => {
            let store = JsonFileJobStore::open(&config.data_file).await?;
            info!("Jobs document: {}", store.path().display());
            if config.seed_demo_data {
                warn!("SEED_DEMO_DATA only applies to the memory backend; ignoring");
            }
            Arc::new(store)
        }
    };
    Ok(store)
}

fn build_gateway(config: &Config) -> Result<InsightGateway> {
    let Some(api_key) = config.openai_api_key.clone() else {
        info!("OPENAI_API_KEY not set; AI insights will return copyable prompts");
        return Ok(InsightGateway::new(None));
    };

    let client = LlmClient::new(
        api_key,
        config.openai_api_url.clone(),
        Duration::from_secs(config.llm_timeout_secs),
    )?;
    info!("LLM client initialized (model: {})", client.model());
    Ok(InsightGateway::new(Some(
        Arc::new(client) as Arc<dyn CompletionProvider>
    )))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {e}");
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
                warn!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

mod config;
mod db;
mod errors;
mod extraction;
mod llm_client;
mod models;
mod pipeline;
mod ratelimit;
mod routes;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::extraction::PdfAnalyzer;
use crate::llm_client::embeddings::EmbeddingClient;
use crate::llm_client::vision::VisionClient;
use crate::llm_client::LlmClient;
use crate::pipeline::Pipelines;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{postgres::PgDocumentStore, Store};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (panics on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging. The package name carries a hyphen but
    // tracing targets use the crate path, so swap it for an underscore.
    let crate_target = env!("CARGO_PKG_NAME").replace('-', "_");
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", crate_target, &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting TalentFlow API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;
    let store = Store::new(Arc::new(PgDocumentStore::new(db)));

    // Initialize inference clients. All three speak to the same
    // OpenAI-compatible endpoint under different model names.
    let llm = Arc::new(LlmClient::new(
        config.inference_base_url.clone(),
        config.inference_api_key.clone(),
        config.llm_model.clone(),
    ));
    let vision = Arc::new(VisionClient::new(
        config.inference_base_url.clone(),
        config.inference_api_key.clone(),
        config.vision_model.clone(),
    ));
    let embedder = Arc::new(EmbeddingClient::new(
        config.inference_base_url.clone(),
        config.inference_api_key.clone(),
        config.embeddings_model.clone(),
    ));
    info!(
        "Inference clients initialized (llm: {}, vision: {}, embeddings: {})",
        config.llm_model, config.vision_model, config.embeddings_model
    );

    // Start the document pipelines. Recovery of PENDING runs happens inside,
    // before any worker picks up new submissions.
    let analyzer = Arc::new(PdfAnalyzer);
    let pipelines = Pipelines::start(&config, store.clone(), analyzer, vision, llm, embedder)
        .await?;

    // Build app state
    let state = AppState {
        store,
        config: config.clone(),
        resume_queue: pipelines.resume_queue.clone(),
        listing_queue: pipelines.listing_queue.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Server stopped taking requests; let in-flight pipeline work finish.
    pipelines.shutdown().await;
    info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

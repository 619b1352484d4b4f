mod auth;
mod config;
mod courses;
mod errors;
mod generation;
mod llm_client;
mod models;
mod profile;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::courses::gateway::CourseGateway;
use crate::generation::pipeline::CoursePipeline;
use crate::llm_client::transport::ReqwestTransport;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{CourseStore, MemoryCourseStore, PgCourseStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Upskill API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize storage
    let store: Arc<dyn CourseStore> = match &config.database_url {
        Some(url) => Arc::new(PgCourseStore::connect(url).await?),
        None => {
            warn!("DATABASE_URL not set; courses are kept in memory and lost on restart");
            Arc::new(MemoryCourseStore::new())
        }
    };

    // Initialize LLM client
    let transport = ReqwestTransport::new(Duration::from_secs(config.provider.timeout_secs))?;
    let llm = LlmClient::new(config.provider.clone(), Arc::new(transport))?;
    info!(
        "LLM client initialized (model: {}, backend: {:?})",
        config.provider.model,
        llm.select_backend(&config.provider.model)
    );

    let gateway = CourseGateway::new(store);
    let state = AppState {
        pipeline: CoursePipeline::new(Arc::new(llm), gateway.clone()),
        gateway,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

mod analysis;
mod config;
mod errors;
mod github;
mod llm_client;
mod models;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::analysis::cache::AnalysisCache;
use crate::analysis::pipeline::AnalysisPipeline;
use crate::analysis::rate_limit::{spawn_sweeper, RateLimiter, SWEEP_INTERVAL};
use crate::analysis::scoring::ScoringEngine;
use crate::config::Config;
use crate::github::GitHubClient;
use crate::llm_client::{CompletionModel, LlmClient};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Hireability API v{}", env!("CARGO_PKG_VERSION"));

    for key in config.missing_recommended() {
        warn!("{key} is not set; live analysis will be degraded");
    }

    let github = GitHubClient::new(config.github_api_url.clone(), config.github_token.clone())?;
    info!(
        "GitHub client initialized ({}, authenticated: {})",
        config.github_api_url,
        config.github_token.is_some()
    );

    let model: Option<Arc<dyn CompletionModel>> = match config.openrouter_api_key.clone() {
        Some(key) => {
            let client = LlmClient::new(
                key,
                config.openrouter_base_url.clone(),
                config.ai_model.clone(),
            )?;
            info!("LLM client initialized (model: {})", config.ai_model);
            Some(Arc::new(client))
        }
        None => None,
    };
    if config.demo_mode {
        info!("Demo mode enabled: every analysis returns canned data");
    }

    let limiter = Arc::new(RateLimiter::default());
    spawn_sweeper(limiter.clone(), SWEEP_INTERVAL);

    let pipeline = AnalysisPipeline::new(
        limiter,
        Arc::new(AnalysisCache::default()),
        Arc::new(github),
        ScoringEngine::new(model, config.demo_mode),
    );

    let state = AppState {
        pipeline: Arc::new(pipeline),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict allowed origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

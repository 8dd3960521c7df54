mod config;
mod errors;
mod models;
mod routes;
mod scoring;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Semaphore;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::scoring::batch::{BatchConfig, BatchCoordinator};
use crate::scoring::cache::{MemoryResultCache, RedisResultCache, ResultCache};
use crate::scoring::orchestrator::{Orchestrator, RetryPolicy};
use crate::scoring::tiers::{AnthropicTier, InferenceTier, OpenAiTier};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on unparseable env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let target = env!("CARGO_PKG_NAME").replace('-', "_");
            EnvFilter::new(format!("{target}={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting jobmatch API v{}", env!("CARGO_PKG_VERSION"));

    // Result cache: Redis when configured, in-process map otherwise.
    let cache: Arc<dyn ResultCache> = match &config.redis_url {
        Some(url) => match RedisResultCache::connect(url).await {
            Ok(redis) => {
                info!("Redis result cache connected");
                Arc::new(redis)
            }
            Err(e) => {
                warn!(error = %e, "Redis unreachable, falling back to in-process cache");
                Arc::new(MemoryResultCache::new())
            }
        },
        None => {
            info!("REDIS_URL not set, using in-process result cache");
            Arc::new(MemoryResultCache::new())
        }
    };

    // The fallback chain, cheap first, premium last. Tiers without
    // credentials stay in the chain and are skipped by the orchestrator.
    let tiers: Vec<Arc<dyn InferenceTier>> = vec![
        Arc::new(OpenAiTier::new(
            &format!("openai:{}", config.openai_model),
            &config.openai_model,
            config.openai_api_key.clone(),
            Arc::new(Semaphore::new(config.provider_max_in_flight)),
        )),
        Arc::new(AnthropicTier::new(
            &format!("anthropic:{}", config.anthropic_model),
            &config.anthropic_model,
            config.anthropic_api_key.clone(),
            Arc::new(Semaphore::new(config.provider_max_in_flight)),
        )),
    ];
    for tier in &tiers {
        info!(
            tier = tier.id(),
            configured = tier.configured(),
            "inference tier registered"
        );
    }

    let orchestrator = Arc::new(Orchestrator::new(tiers, RetryPolicy::default()));
    let coordinator = Arc::new(BatchCoordinator::new(
        orchestrator,
        cache,
        BatchConfig {
            prefilter_threshold: config.prefilter_threshold,
            default_concurrency: config.default_concurrency,
            cache_ttl: config.cache_ttl,
            hybrid_enabled: config.hybrid_enabled,
        },
    ));

    let state = AppState { coordinator };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

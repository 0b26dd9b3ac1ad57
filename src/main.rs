use std::sync::Arc;

use reqwest::Client as HttpClient;
use tracing_subscriber::EnvFilter;

use movie_recs_api::{
    api::{create_router, AppState},
    config::Config,
    db::{create_redis_client, Cache, CacheWriterHandle},
    services::{
        artifacts::{self, ArtifactPlan},
        providers::TmdbProvider,
        MetadataService,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("movie_recs_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    // Refuse to serve without the catalog and similarity matrix
    let plan = ArtifactPlan::from_config(&config);
    let index = artifacts::load_index(&HttpClient::new(), &plan)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load recommendation data");
            anyhow::anyhow!("Failed to load recommendation data: {}", e)
        })?;

    let mut provider = TmdbProvider::from_config(&config)?;
    let mut cache_writer: Option<CacheWriterHandle> = None;
    if let Some(redis_url) = &config.redis_url {
        let (cache, handle) = Cache::new(create_redis_client(redis_url)?);
        provider = provider.with_cache(cache, config.metadata_cache_ttl);
        cache_writer = Some(handle);
        tracing::info!("Metadata caching enabled");
    }

    let metadata = MetadataService::new(Arc::new(provider), config.tmdb_image_url.clone());
    let state = AppState::new(index, metadata);
    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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

    tracing::info!("Shutdown signal received");
}

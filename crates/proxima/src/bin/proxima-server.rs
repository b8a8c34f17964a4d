//! `proxima-server`: the Proxima service as a standalone process.
//!
//! Configured from the environment (see [`ServerConfig::from_env`]).
//! Logging follows `RUST_LOG`, defaulting to `info`.

use std::process::ExitCode;
use std::sync::Arc;

use proxima::prelude::*;
use tokio::signal::ctrl_c;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match start().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "proxima-server failed");
            ExitCode::FAILURE
        }
    }
}

async fn start() -> Result<(), ProximaError> {
    let config = ServerConfig::from_env()?;

    let seed = match &config.seed_file {
        Some(path) => SeedData::load(path).await?,
        None => {
            tracing::warn!("PROXIMA_SEED_FILE not set, starting with an empty store");
            SeedData::default()
        }
    };
    let dev_verifier = seed
        .principals
        .iter()
        .fold(StaticTokenVerifier::new(), |verifier, principal| {
            verifier.with_token(principal.id.as_str(), principal.id.as_str())
        });
    let store = Arc::new(MemoryStore::from_seed(seed));

    match config.redis_url.clone() {
        Some(url) => {
            let cache = RedisCacheTier::connect(&url).await?;
            with_verifier(config, cache, store, dev_verifier).await
        }
        None => {
            let cache = Arc::new(MemoryCacheTier::new());
            cache.spawn_sweeper(SWEEP_INTERVAL);
            with_verifier(config, cache, store, dev_verifier).await
        }
    }
}

async fn with_verifier<K>(
    config: ServerConfig,
    cache: K,
    store: Arc<MemoryStore>,
    dev_verifier: StaticTokenVerifier,
) -> Result<(), ProximaError>
where
    K: CacheTier + Clone,
{
    match config.jwt_secret.clone() {
        Some(secret) => serve(config, JwtVerifier::hs256(secret.as_bytes()), cache, store).await,
        None => {
            tracing::warn!(
                principals = dev_verifier.len(),
                "JWT_SECRET not set, accepting principal ids as tokens (development only)"
            );
            serve(config, dev_verifier, cache, store).await
        }
    }
}

async fn serve<V, K>(
    config: ServerConfig,
    verifier: V,
    cache: K,
    store: Arc<MemoryStore>,
) -> Result<(), ProximaError>
where
    V: IdentityVerifier,
    K: CacheTier + Clone,
{
    let server = ProximaServer::builder()
        .config(config)
        .build(verifier, cache, store)
        .await?;

    server.run_until(shutdown_signal()).await?;
    tracing::info!("Proxima server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match ctrl_c().await {
        Ok(()) => tracing::info!("received Ctrl+C, shutting down"),
        Err(e) => {
            tracing::error!(error = %e, "failed to listen for Ctrl+C, running until killed");
            std::future::pending::<()>().await;
        }
    }
}

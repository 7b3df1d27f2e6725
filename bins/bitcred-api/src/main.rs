//! bitcred-api — HTTP front end for BitCred wallet scoring.
//!
//! `POST /score` fetches a wallet's history, scores it and returns registry
//! calldata for the user's Starknet wallet to submit. Read endpoints proxy
//! the score registry and lending pool.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

mod config;
mod routes;

use bitcred_chain::{ChainDataProvider, FallbackProvider};
use bitcred_core::traits::{Clock, OsRandom, RandomSource, SystemClock};
use bitcred_ledger::{LedgerClient, StarknetClient};
use bitcred_proof::CommitmentGenerator;
use bitcred_scoring::{Scorer, ScoringConfig};
use config::Config;

pub type SharedClock = Arc<dyn Clock>;
pub type SharedRandom = Arc<dyn RandomSource>;

/// Shared application state passed to every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub chain: Arc<dyn ChainDataProvider>,
    pub ledger: Arc<dyn LedgerClient>,
    pub scorer: Arc<Scorer<SharedClock>>,
    pub commitments: Arc<CommitmentGenerator<SharedClock, SharedRandom>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env().context("Failed to load API configuration")?;

    info!(
        bind = %config.bind_addr,
        starknet = %config.starknet.rpc_url,
        registry = %config.starknet.registry,
        lending = %config.starknet.lending,
        "Starting bitcred-api"
    );

    let chain = FallbackProvider::from_config(&config.providers)
        .context("Failed to build explorer HTTP client")?;
    let ledger = StarknetClient::new(&config.starknet).context("Failed to build Starknet client")?;

    let clock: SharedClock = Arc::new(SystemClock);
    let rng: SharedRandom = Arc::new(OsRandom);
    let scorer = Scorer::new(ScoringConfig::default(), clock.clone())
        .context("Invalid scoring configuration")?;

    let state = AppState {
        chain: Arc::new(chain),
        ledger: Arc::new(ledger),
        scorer: Arc::new(scorer),
        commitments: Arc::new(CommitmentGenerator::new(clock, rng)),
    };
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    info!("Listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await.context("HTTP server error")?;
    Ok(())
}

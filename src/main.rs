//! malltrack server: loads configuration, seeds the store, serves REST

use anyhow::{Result, anyhow};
use malltrack::config::{LedgerConfig, LoggingConfig};
use malltrack::core::service::LedgerStore;
use malltrack::ledger::Ledger;
use malltrack::server::ServerBuilder;
use malltrack::storage::InMemoryLedgerStore;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = LedgerConfig::load()?;
    init_logging(&config.logging)?;

    let store: Arc<dyn LedgerStore> = Arc::new(InMemoryLedgerStore::new());

    if let Some(seed) = &config.seed {
        seed.apply(&Ledger::new(store.clone())).await?;
    }

    ServerBuilder::new()
        .with_shared_store(store)
        .serve(&config.server.address())
        .await
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&logging.filter))?;

    let builder = fmt().with_env_filter(filter).with_target(true);
    let installed = if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow!("failed to initialise logging: {e}"))
}

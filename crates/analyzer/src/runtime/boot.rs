//! Boot — logging init, config load, store construction.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{AnalyzerConfig, StoreBackend};
use crate::store::{JsonlStore, MemoryStore, SharedStore};

/// Initialise the tracing / logging subsystem.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "analyzer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load configuration and open the configured store backend.
///
/// Returns `(SharedStore, AnalyzerConfig)` on success.
pub fn boot() -> Result<(SharedStore, AnalyzerConfig), Box<dyn std::error::Error>> {
    let config = AnalyzerConfig::load()?;
    config.validate()?;

    let store: SharedStore = match config.store.backend {
        StoreBackend::Memory => {
            info!("Using in-memory store");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Jsonl => {
            info!("Using jsonl store at: {}", config.store.path);
            Arc::new(JsonlStore::new(&config.store.path))
        }
    };

    Ok((store, config))
}

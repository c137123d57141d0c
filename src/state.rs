use std::sync::Arc;

use anyhow::Context;

use crate::clients::remote::RemoteClient;
use crate::clients::wordpress::WordPressClient;
use crate::config::Config;
use crate::db::{RecordStore, Store};
use crate::services::{EnrichmentService, SyncEngine, SyncOptions};

/// Everything a command or request handler needs, built once from the config.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Arc<dyn RecordStore>,

    pub engine: Arc<SyncEngine>,

    pub enrichment: Arc<EnrichmentService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
        )
        .await
        .with_context(|| format!("Failed to open database {}", config.general.database_path))?;

        let remote = WordPressClient::new(&config.remote).context("Invalid [remote] settings")?;
        let enrichment = EnrichmentService::from_config(&config.metadata);

        Ok(Self::from_parts(
            config,
            Arc::new(store),
            Arc::new(remote),
            Arc::new(enrichment),
        ))
    }

    /// Wires the engine over already-built collaborators.
    #[must_use]
    pub fn from_parts(
        config: Config,
        store: Arc<dyn RecordStore>,
        remote: Arc<dyn RemoteClient>,
        enrichment: Arc<EnrichmentService>,
    ) -> Self {
        let options = SyncOptions::from(&config.sync);
        let engine = Arc::new(SyncEngine::new(store.clone(), remote, options));

        Self {
            config: Arc::new(config),
            store,
            engine,
            enrichment,
        }
    }
}

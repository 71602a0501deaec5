pub mod config;
pub mod error;
pub mod identity;
pub mod rest;
pub mod roadmap;
pub mod storage;

use std::sync::Arc;

use anyhow::Result;

use config::Config;
use identity::Resolver;
use roadmap::service::RoadmapService;
use storage::Storage;

/// Shared application state passed to every REST handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub storage: Arc<Storage>,
    /// Roadmap operations behind the HTTP boundary.
    pub roadmaps: RoadmapService,
    pub started_at: std::time::Instant,
}

impl AppContext {
    /// Open the database under `config.data_dir`, run migrations, and
    /// wire the service layer.
    pub async fn new(config: Config) -> Result<Self> {
        let storage = Arc::new(
            Storage::new_with_slow_query(
                &config.data_dir,
                config.observability.slow_query_threshold_ms,
            )
            .await?,
        );
        let resolver = Resolver::new(storage.clone());
        let roadmaps =
            RoadmapService::new(storage.pool(), resolver, config.presentation.clone());

        Ok(Self {
            config: Arc::new(config),
            storage,
            roadmaps,
            started_at: std::time::Instant::now(),
        })
    }
}

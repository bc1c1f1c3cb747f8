//! Engine state and dependency wiring
//!
//! `HasAbac` abstracts the state so callers can run against the MySQL
//! repository or an in-memory one in tests.

use crate::cache::AbacCacheManager;
use crate::config::Config;
use crate::repository::{AbacRepository, AbacRepositoryImpl, DbPool};
use crate::service::AbacService;
use anyhow::Context;
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use tracing::info;

/// State that provides the case ABAC service
pub trait HasAbac: Clone + Send + Sync + 'static {
    /// The repository type behind the service
    type AbacRepo: AbacRepository;

    fn config(&self) -> &Config;

    fn abac_service(&self) -> &AbacService<Self::AbacRepo>;
}

/// Shared engine state over any repository
pub struct AbacState<R: AbacRepository> {
    config: Arc<Config>,
    abac_service: Arc<AbacService<R>>,
}

impl<R: AbacRepository> Clone for AbacState<R> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            abac_service: self.abac_service.clone(),
        }
    }
}

impl<R: AbacRepository + 'static> AbacState<R> {
    /// Wire the cache and service around an existing repository
    pub fn with_repository(config: Config, repo: Arc<R>) -> Self {
        let cache = Arc::new(AbacCacheManager::new(&config.abac));
        let abac_service = Arc::new(AbacService::new(
            repo,
            cache,
            config.abac.full_access_roles.clone(),
        ));
        Self {
            config: Arc::new(config),
            abac_service,
        }
    }
}

impl AbacState<AbacRepositoryImpl> {
    /// Connect to MySQL and wire the production repository
    pub async fn connect(config: Config) -> anyhow::Result<Self> {
        let db_pool = MySqlPoolOptions::new()
            .max_connections(config.database.max_connections)
            .min_connections(config.database.min_connections)
            .connect(&config.database.url)
            .await
            .context("Failed to connect to database")?;
        let db_pool = DbPool::new(db_pool);

        info!(
            max_connections = config.database.max_connections,
            cache_capacity = config.abac.cache_capacity,
            cache_ttl_secs = config.abac.cache_ttl_secs,
            "Connected to database"
        );

        let repo = Arc::new(AbacRepositoryImpl::new(db_pool.inner().clone()));
        Ok(Self::with_repository(config, repo))
    }
}

impl<R: AbacRepository + 'static> HasAbac for AbacState<R> {
    type AbacRepo = R;

    fn config(&self) -> &Config {
        &self.config
    }

    fn abac_service(&self) -> &AbacService<R> {
        &self.abac_service
    }
}

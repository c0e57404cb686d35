use std::sync::Arc;
use std::time::Duration;

use crate::{
    cache::{ListingCache, MemoryCache, NoopCache},
    config::AppConfig,
    db::{DbPool, OrmConn, raw_pool},
    notify::{LogNotifier, OrderNotifier},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub cache: Arc<dyn ListingCache>,
    pub notifier: Arc<dyn OrderNotifier>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Wires the default cache and notifier from configuration.
    pub fn new(orm: OrmConn, config: AppConfig) -> Self {
        let cache: Arc<dyn ListingCache> = if config.cache_enabled {
            Arc::new(MemoryCache::new(Duration::from_secs(config.cache_ttl_secs)))
        } else {
            Arc::new(NoopCache)
        };
        let notifier = Arc::new(LogNotifier::new(config.order_notify_email.clone()));
        Self {
            pool: raw_pool(&orm),
            orm,
            cache,
            notifier,
            config: Arc::new(config),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn ListingCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn OrderNotifier>) -> Self {
        self.notifier = notifier;
        self
    }
}

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::future::Cache;
use sea_orm::DatabaseConnection;

use crate::auth::Caller;
use crate::config::CacheConfig;

#[derive(Clone)]
pub struct AppState {
    pub database: DatabaseConnection,
    pub cache: Arc<ApiCache>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(database: DatabaseConnection, cache: Arc<ApiCache>) -> Self {
        assert!(
            cache.token_capacity >= 100,
            "Token cache capacity must be configured"
        );
        Self {
            database,
            cache,
            start_time: Instant::now(),
        }
    }
}

/// Bearer-token resolution cache. Aggregation output is never cached:
/// summaries are recomputed from the store on every read.
pub struct ApiCache {
    pub caller_tokens: Cache<String, Arc<Caller>>,
    pub token_capacity: u64,
}

impl ApiCache {
    pub fn new(config: &CacheConfig) -> Self {
        assert!(
            config.tokens_max_capacity >= 100,
            "Token cache capacity threshold"
        );

        let caller_tokens = Cache::builder()
            .max_capacity(config.tokens_max_capacity)
            .time_to_live(Duration::from_secs(config.tokens_ttl_seconds))
            .time_to_idle(Duration::from_secs(config.tokens_ttl_seconds / 2 + 1))
            .build();

        Self {
            caller_tokens,
            token_capacity: config.tokens_max_capacity,
        }
    }

    /// Drop every cached token resolution so role or assignment changes take
    /// effect on the next request.
    pub fn invalidate_callers(&self) {
        self.caller_tokens.invalidate_all();
    }
}

//! Cache handler: store access, background maintenance and invalidation

use crate::cache::runner::TaskRunner;
use crate::cache::store::{Cacher, JsonFileCache};
use crate::config::{CacheConfig, CacheMode, CacheProvider};
use crate::error::{Result, TeamsResolverError};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cache statistics for monitoring
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub clears: u64,
    pub read_errors: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    clears: AtomicU64,
    read_errors: AtomicU64,
}

/// Long-lived cache front shared by all resolutions in a process
pub struct CacheHandler {
    store: Arc<dyn Cacher>,
    runner: TaskRunner,
    counters: Counters,
}

impl CacheHandler {
    pub fn new(store: Arc<dyn Cacher>, runner: TaskRunner) -> Self {
        tracing::info!(background = runner.is_async(), "Creating cache handler");

        Self {
            store,
            runner,
            counters: Counters::default(),
        }
    }

    /// Build the handler described by `config`, or None when caching is off
    pub fn from_config(config: &CacheConfig) -> Result<Option<Self>> {
        let runner = match config.mode {
            CacheMode::Disabled => {
                tracing::info!("Cache disabled, every resolution goes to the API");
                return Ok(None);
            }
            CacheMode::Sync => TaskRunner::sync(),
            CacheMode::Async => TaskRunner::background(),
        };

        let store: Arc<dyn Cacher> = match config.provider {
            CacheProvider::JsonFile => {
                tracing::debug!(path = %config.path.display(), "Using JSON file cache");
                Arc::new(JsonFileCache::new(config.path.clone()))
            }
        };

        Ok(Some(Self::new(store, runner)))
    }

    pub fn store(&self) -> &Arc<dyn Cacher> {
        &self.store
    }

    /// Single trusted ID under `key`
    ///
    /// Missing keys, empty or multi-ID entries, malformed values and read
    /// failures all count as a miss so a damaged cache falls back to the API.
    pub async fn get_single(&self, key: &str) -> Option<String> {
        let ids = match self.store.get(key).await {
            Ok(Some(ids)) => ids,
            Ok(None) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(cache_key = %key, "Cache miss");
                return None;
            }
            Err(e) => {
                self.counters.read_errors.fetch_add(1, Ordering::Relaxed);
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    cache_key = %key,
                    error = %e,
                    "Unreadable cache entry, treating as miss"
                );
                return None;
            }
        };

        match <[String; 1]>::try_from(ids) {
            Ok([id]) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(cache_key = %key, id = %id, "Cache hit");
                Some(id)
            }
            Err(ids) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    cache_key = %key,
                    stored = ids.len(),
                    "Cache entry does not hold exactly one ID, treating as miss"
                );
                None
            }
        }
    }

    /// Raw IDs under `key`, for inspection
    pub async fn get_ids(&self, key: &str) -> Result<Option<Vec<String>>> {
        self.store.get(key).await
    }

    /// Record `id` under `key` through the runner
    pub async fn set(&self, key: &str, id: &str) {
        self.counters.writes.fetch_add(1, Ordering::Relaxed);
        let store = self.store.clone();
        let key = key.to_string();
        let id = id.to_string();
        self.runner
            .run("cache.set", async move {
                store.set(&key, &id).await?;
                tracing::info!(cache_key = %key, id = %id, "Cached resolved ID");
                Ok(())
            })
            .await;
    }

    pub async fn invalidate(&self, key: &str) {
        let store = self.store.clone();
        let key = key.to_string();
        self.runner
            .run("cache.invalidate", async move {
                store.invalidate(&key).await?;
                tracing::debug!(cache_key = %key, "Invalidated cache entry");
                Ok(())
            })
            .await;
    }

    pub async fn clear(&self) {
        self.counters.clears.fetch_add(1, Ordering::Relaxed);
        let store = self.store.clone();
        self.runner
            .run("cache.clear", async move {
                store.clear().await?;
                tracing::info!("Cleared resolver cache");
                Ok(())
            })
            .await;
    }

    /// Clear the whole cache when `err` shows a cached mapping may be wrong
    ///
    /// Only 400, 404, 409, 412, 413 and 422 responses qualify. A status code
    /// cannot say which key went stale, so everything is dropped.
    pub async fn on_error(&self, err: &TeamsResolverError) {
        if err.invalidates_cache() {
            tracing::info!(
                status = err.status_code().unwrap_or_default(),
                "Remote error suggests stale identity mappings, clearing cache"
            );
            self.clear().await;
        }
    }

    /// Run `operation`, applying the invalidation policy to its error
    pub async fn with_error_clear<T, F>(&self, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match operation.await {
            Ok(value) => Ok(value),
            Err(e) => {
                self.on_error(&e).await;
                Err(e)
            }
        }
    }

    /// Wait for background maintenance to land
    pub async fn wait(&self) {
        self.runner.wait().await;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            writes: self.counters.writes.load(Ordering::Relaxed),
            clears: self.counters.clears.load(Ordering::Relaxed),
            read_errors: self.counters.read_errors.load(Ordering::Relaxed),
        }
    }

    /// Log cache statistics (for periodic monitoring)
    pub fn log_stats(&self) {
        let stats = self.stats();
        let lookups = stats.hits + stats.misses;
        let hit_rate = if lookups > 0 {
            (stats.hits as f32 / lookups as f32 * 100.0) as u32
        } else {
            0
        };

        tracing::info!(
            hits = stats.hits,
            misses = stats.misses,
            hit_rate = hit_rate,
            writes = stats.writes,
            clears = stats.clears,
            read_errors = stats.read_errors,
            "Resolver cache statistics"
        );
    }
}

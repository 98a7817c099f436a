//! Generic cache-aside resolution
//!
//! Every resource kind follows the same sequence: reject empty references,
//! pass through anything that already looks like an ID, try the cache, fetch
//! the candidate list, match exactly one candidate, and write the answer back.

use crate::cache::{CacheHandler, CacheKey};
use crate::error::{Result, TeamsResolverError};
use crate::logging::Timer;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;

type KeyFn<'a> = Box<dyn FnOnce() -> CacheKey + Send + 'a>;
type FetchFn<'a, T> = Box<dyn FnOnce() -> BoxFuture<'a, Result<T>> + Send + 'a>;
type ExtractFn<'a, T> = Box<dyn FnOnce(T, &str) -> Result<String> + Send + 'a>;

/// One resolution episode
///
/// Built per call and consumed by [`Resolver::resolve`]. The cache key is
/// computed lazily so references that are already IDs never touch the
/// pepper.
pub struct ResolverContext<'a, T> {
    kind: &'static str,
    reference: String,
    is_already_id: fn(&str) -> bool,
    cache_key: KeyFn<'a>,
    fetch: FetchFn<'a, T>,
    extract: ExtractFn<'a, T>,
}

impl<'a, T> ResolverContext<'a, T> {
    pub fn new<K, F, E>(
        kind: &'static str,
        reference: &str,
        is_already_id: fn(&str) -> bool,
        cache_key: K,
        fetch: F,
        extract: E,
    ) -> Self
    where
        K: FnOnce() -> CacheKey + Send + 'a,
        F: FnOnce() -> BoxFuture<'a, Result<T>> + Send + 'a,
        E: FnOnce(T, &str) -> Result<String> + Send + 'a,
    {
        Self {
            kind,
            reference: reference.trim().to_string(),
            is_already_id,
            cache_key: Box::new(cache_key),
            fetch: Box::new(fetch),
            extract: Box::new(extract),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Trimmed reference
    pub fn reference(&self) -> &str {
        &self.reference
    }
}

/// Runs resolution episodes against an optional shared cache
#[derive(Clone, Default)]
pub struct Resolver {
    cache: Option<Arc<CacheHandler>>,
    fetch_timeout: Option<Duration>,
}

impl Resolver {
    pub fn new(cache: Option<Arc<CacheHandler>>) -> Self {
        Self {
            cache,
            fetch_timeout: None,
        }
    }

    /// Bound every remote fetch by `timeout`
    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn cache(&self) -> Option<&Arc<CacheHandler>> {
        self.cache.as_ref()
    }

    pub async fn resolve<T>(&self, ctx: ResolverContext<'_, T>) -> Result<String> {
        let ResolverContext {
            kind,
            reference,
            is_already_id,
            cache_key,
            fetch,
            extract,
        } = ctx;

        if reference.is_empty() {
            return Err(TeamsResolverError::EmptyReference);
        }

        if is_already_id(&reference) {
            tracing::trace!(kind, reference = %reference, "Reference is already an ID");
            return Ok(reference);
        }

        let _timer = Timer::new("resolve", kind);

        let key = match &self.cache {
            Some(cache) => {
                let key = cache_key();
                if let Some(id) = cache.get_single(key.as_str()).await {
                    tracing::debug!(kind, cache_key = %key, id = %id, "Resolved from cache");
                    return Ok(id);
                }
                Some(key)
            }
            None => None,
        };

        tracing::debug!(kind, "Fetching candidates from Teams API");
        let data = match self.fetch_with_timeout(kind, fetch()).await {
            Ok(data) => data,
            Err(e) => {
                if let Some(cache) = &self.cache {
                    cache.on_error(&e).await;
                }
                return Err(e);
            }
        };

        let id = extract(data, &reference)?;

        if let (Some(cache), Some(key)) = (&self.cache, key) {
            cache.set(key.as_str(), &id).await;
        }

        tracing::debug!(kind, id = %id, "Resolved reference");
        Ok(id)
    }

    async fn fetch_with_timeout<T>(
        &self,
        kind: &'static str,
        fetch: BoxFuture<'_, Result<T>>,
    ) -> Result<T> {
        match self.fetch_timeout {
            Some(timeout) => tokio::time::timeout(timeout, fetch)
                .await
                .map_err(|_| TeamsResolverError::FetchTimeout { kind, timeout })?,
            None => fetch.await,
        }
    }
}

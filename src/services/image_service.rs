//! Cached image resolution for review rows
//!
//! This is the entry point the review UI talks to: every lookup goes
//! through the result cache, and the two SKUs of a row resolve side by side.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use super::resolver::ImageResolver;
use super::result_cache::{CacheStats, ResultCache};
use crate::config::Config;
use crate::errors::AppResult;
use crate::models::{ResolveOutcome, ReviewRow, Sku};
use crate::utils::http_client::HttpTransport;

#[derive(Clone)]
pub struct ImageResolutionService {
    resolver: Arc<ImageResolver>,
    cache: Arc<ResultCache>,
}

impl ImageResolutionService {
    pub fn new(resolver: ImageResolver, cache: ResultCache) -> Self {
        Self {
            resolver: Arc::new(resolver),
            cache: Arc::new(cache),
        }
    }

    /// Build the resolver and cache described by `config`
    pub fn from_config(config: &Config, transport: Arc<dyn HttpTransport>) -> AppResult<Self> {
        let resolver = ImageResolver::from_config(config, transport)?;
        let cache = ResultCache::from_config(&config.cache);
        Ok(Self::new(resolver, cache))
    }

    /// Resolve `sku` through the cache using the configured locale order
    pub async fn resolve(&self, sku: &Sku) -> ResolveOutcome {
        if sku.is_empty() {
            return ResolveOutcome::Unresolved;
        }

        let resolver = self.resolver.clone();
        let key = sku.clone();
        self.cache
            .get_or_resolve(sku, move || async move { resolver.resolve_default(&key).await })
            .await
    }

    /// Resolve both SKUs concurrently
    pub async fn resolve_pair(&self, own: &Sku, oem: &Sku) -> (ResolveOutcome, ResolveOutcome) {
        tokio::join!(self.resolve(own), self.resolve(oem))
    }

    /// Images for a review row, own product first
    pub async fn resolve_row(&self, row: &ReviewRow) -> (ResolveOutcome, ResolveOutcome) {
        self.resolve_pair(&row.own_sku, &row.oem_sku).await
    }

    /// Start background resolutions so later lookups hit the cache
    ///
    /// Dropping the handles does not cancel the work.
    pub fn prewarm<I>(&self, skus: I) -> Vec<JoinHandle<ResolveOutcome>>
    where
        I: IntoIterator<Item = Sku>,
    {
        skus.into_iter()
            .filter(|sku| !sku.is_empty())
            .map(|sku| {
                debug!("Prewarming SKU {}", sku);
                let service = self.clone();
                tokio::spawn(async move { service.resolve(&sku).await })
            })
            .collect()
    }

    pub fn resolver(&self) -> &ImageResolver {
        &self.resolver
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}

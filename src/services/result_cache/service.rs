//! Result cache service with single-flight resolution and TTL maintenance

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::entry::CacheEntry;
use crate::config::CacheConfig;
use crate::models::{ResolveOutcome, Sku};

/// Per-SKU cell; holding its lock means owning the SKU's resolution
type Slot = Arc<Mutex<Option<CacheEntry>>>;

/// SKU -> resolution outcome cache
pub struct ResultCache {
    /// SKU -> slot; a slot's entry is replaced, never edited
    slots: RwLock<HashMap<String, Slot>>,
    /// Lifetime of `Resolved` outcomes
    ttl: Duration,
    /// Lifetime of `Unresolved` outcomes
    negative_ttl: Duration,
    /// Lookups answered from a live entry
    hits: AtomicU64,
    /// Lookups that started a resolution
    misses: AtomicU64,
    /// Resolutions that completed and were stored
    resolutions: Arc<AtomicU64>,
}

impl ResultCache {
    pub fn new(ttl: Duration, negative_ttl: Duration) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            ttl,
            negative_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            resolutions: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl, config.effective_negative_ttl())
    }

    /// Return the live outcome for `sku`, or run `resolve` and cache its result
    ///
    /// Concurrent callers for the same SKU share one resolution. The
    /// resolution runs on its own task: if the calling future is dropped the
    /// outcome is still stored.
    pub async fn get_or_resolve<F, Fut>(&self, sku: &Sku, resolve: F) -> ResolveOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ResolveOutcome> + Send + 'static,
    {
        let slot = self.slot(sku).await;
        let mut guard = slot.lock_owned().await;

        if let Some(entry) = &*guard
            && entry.is_live()
        {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit for SKU {} (age {:?})", sku, entry.age());
            return entry.outcome.clone();
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Cache miss for SKU {}, resolving", sku);

        let pending = resolve();
        let key = sku.clone();
        let (ttl, negative_ttl) = (self.ttl, self.negative_ttl);
        let resolutions = self.resolutions.clone();

        let task = tokio::spawn(async move {
            let outcome = pending.await;
            let lifetime = if outcome.is_resolved() {
                ttl
            } else {
                negative_ttl
            };
            *guard = Some(CacheEntry::new(key, outcome.clone(), lifetime));
            resolutions.fetch_add(1, Ordering::Relaxed);
            outcome
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Resolution task for SKU {} failed: {}", sku, e);
                ResolveOutcome::Unresolved
            }
        }
    }

    /// Peek at the live outcome for `sku` without resolving
    ///
    /// Returns `None` while a resolution is in flight; an expired entry is
    /// evicted.
    pub async fn get(&self, sku: &Sku) -> Option<ResolveOutcome> {
        let slot = self.slots.read().await.get(sku.as_str()).cloned()?;
        let mut guard = slot.try_lock().ok()?;

        match &*guard {
            Some(entry) if entry.is_live() => Some(entry.outcome.clone()),
            Some(_) => {
                debug!("Evicting expired entry for SKU {}", sku);
                *guard = None;
                None
            }
            None => None,
        }
    }

    /// Drop the entry for `sku`; an in-flight resolution is left alone
    pub async fn invalidate(&self, sku: &Sku) -> bool {
        let mut slots = self.slots.write().await;
        let Some(slot) = slots.get(sku.as_str()) else {
            return false;
        };

        if Arc::strong_count(slot) == 1 {
            let had_entry = slot.try_lock().map(|g| g.is_some()).unwrap_or(false);
            slots.remove(sku.as_str());
            return had_entry;
        }

        match slot.try_lock() {
            Ok(mut guard) => guard.take().is_some(),
            Err(_) => {
                debug!("SKU {} is being resolved, not invalidated", sku);
                false
            }
        }
    }

    /// Drop every entry not currently being resolved; returns how many were dropped
    pub async fn clear(&self) -> u64 {
        let mut slots = self.slots.write().await;
        let mut cleared = 0u64;

        slots.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            if slot.try_lock().map(|g| g.is_some()).unwrap_or(false) {
                cleared += 1;
            }
            false
        });

        info!("Cleared {} cached resolution(s)", cleared);
        cleared
    }

    /// Evict every expired entry; returns how many were evicted
    pub async fn purge_expired(&self) -> u64 {
        let now = Instant::now();
        let mut slots = self.slots.write().await;
        let before = slots.len();
        let mut purged = 0u64;

        slots.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            let Ok(guard) = slot.try_lock() else {
                return true;
            };
            match &*guard {
                Some(entry) if entry.is_live_at(now) => true,
                Some(_) => {
                    purged += 1;
                    false
                }
                None => false,
            }
        });

        if purged > 0 {
            info!(
                "Purged {} expired resolution(s), {} slot(s) remain of {}",
                purged,
                slots.len(),
                before
            );
        }
        purged
    }

    pub async fn stats(&self) -> CacheStats {
        let slots = self.slots.read().await;
        let now = Instant::now();
        let entries = slots
            .values()
            .filter(|slot| {
                slot.try_lock()
                    .map(|g| g.as_ref().is_some_and(|e| e.is_live_at(now)))
                    .unwrap_or(false)
            })
            .count() as u64;

        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            resolutions: self.resolutions.load(Ordering::Relaxed),
            entries,
        }
    }

    async fn slot(&self, sku: &Sku) -> Slot {
        if let Some(slot) = self.slots.read().await.get(sku.as_str()) {
            return slot.clone();
        }

        let mut slots = self.slots.write().await;
        slots.entry(sku.as_str().to_string()).or_default().clone()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Completed resolutions; lower than `misses` when a resolution panicked
    pub resolutions: u64,
    /// Live entries at the time of the call
    pub entries: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResolvedImage;
    use bytes::Bytes;
    use image::ImageFormat;
    use std::sync::atomic::AtomicUsize;

    const TTL: Duration = Duration::from_secs(3600);

    fn image(tag: &'static [u8]) -> ResolvedImage {
        ResolvedImage {
            bytes: Bytes::from_static(tag),
            width: 1,
            height: 1,
            format: ImageFormat::Png,
        }
    }

    /// Resolution taking one second that counts its invocations
    fn counting(
        calls: &Arc<AtomicUsize>,
        outcome: ResolveOutcome,
    ) -> impl FnOnce() -> std::pin::Pin<Box<dyn Future<Output = ResolveOutcome> + Send>> {
        let calls = calls.clone();
        move || {
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(1)).await;
                outcome
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_resolution() {
        let cache = ResultCache::new(TTL, TTL);
        let calls = Arc::new(AtomicUsize::new(0));
        let sku = Sku::new("P-100");
        let resolved = ResolveOutcome::Resolved(image(b"one"));

        let (first, second) = tokio::join!(
            cache.get_or_resolve(&sku, counting(&calls, resolved.clone())),
            cache.get_or_resolve(&sku, counting(&calls, resolved.clone())),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, resolved);
        assert_eq!(second, resolved);

        let stats = cache.stats().await;
        assert_eq!(stats.resolutions, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_skus_resolve_independently() {
        let cache = ResultCache::new(TTL, TTL);
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = (Sku::new("A"), Sku::new("B"));
        let started = Instant::now();
        tokio::join!(
            cache.get_or_resolve(&a, counting(&calls, ResolveOutcome::Unresolved)),
            cache.get_or_resolve(&b, counting(&calls, ResolveOutcome::Unresolved)),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_entry_is_reused_then_expires() {
        let cache = ResultCache::new(Duration::from_secs(60), Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));
        let sku = Sku::new("P-200");

        let first = cache
            .get_or_resolve(&sku, counting(&calls, ResolveOutcome::Resolved(image(b"v1"))))
            .await;
        let again = cache
            .get_or_resolve(&sku, counting(&calls, ResolveOutcome::Resolved(image(b"v2"))))
            .await;
        assert_eq!(first, again);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(61)).await;

        let refreshed = cache
            .get_or_resolve(&sku, counting(&calls, ResolveOutcome::Resolved(image(b"v2"))))
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(refreshed, ResolveOutcome::Resolved(image(b"v2")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresolved_uses_negative_ttl() {
        let cache = ResultCache::new(TTL, Duration::from_secs(30));
        let calls = Arc::new(AtomicUsize::new(0));
        let sku = Sku::new("MISSING");

        cache
            .get_or_resolve(&sku, counting(&calls, ResolveOutcome::Unresolved))
            .await;
        assert_eq!(cache.get(&sku).await, Some(ResolveOutcome::Unresolved));

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(cache.get(&sku).await, None);

        cache
            .get_or_resolve(&sku, counting(&calls, ResolveOutcome::Unresolved))
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_caller_still_populates_cache() {
        let cache = ResultCache::new(TTL, TTL);
        let calls = Arc::new(AtomicUsize::new(0));
        let sku = Sku::new("P-300");
        let resolved = ResolveOutcome::Resolved(image(b"late"));

        let abandoned = tokio::time::timeout(
            Duration::from_millis(100),
            cache.get_or_resolve(&sku, counting(&calls, resolved.clone())),
        )
        .await;
        assert!(abandoned.is_err());
        assert_eq!(cache.get(&sku).await, None);

        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(cache.get(&sku).await, Some(resolved.clone()));
        let reused = cache
            .get_or_resolve(&sku, counting(&calls, ResolveOutcome::Unresolved))
            .await;
        assert_eq!(reused, resolved);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    fn sku_is_cursed() -> bool {
        true
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_resolution_is_unresolved_and_not_cached() {
        let cache = ResultCache::new(TTL, TTL);
        let sku = Sku::new("BOOM");

        let outcome = cache
            .get_or_resolve(&sku, || async {
                if sku_is_cursed() {
                    panic!("resolver blew up");
                }
                ResolveOutcome::Unresolved
            })
            .await;
        assert_eq!(outcome, ResolveOutcome::Unresolved);
        assert_eq!(cache.get(&sku).await, None);

        let stats = cache.stats().await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.resolutions, 0);
        assert_eq!(stats.entries, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_new_resolution() {
        let cache = ResultCache::new(TTL, TTL);
        let calls = Arc::new(AtomicUsize::new(0));
        let sku = Sku::new("P-400");

        cache
            .get_or_resolve(&sku, counting(&calls, ResolveOutcome::Unresolved))
            .await;
        assert!(cache.invalidate(&sku).await);
        assert!(!cache.invalidate(&sku).await);

        cache
            .get_or_resolve(&sku, counting(&calls, ResolveOutcome::Unresolved))
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired_and_clear() {
        let cache = ResultCache::new(Duration::from_secs(10), Duration::from_secs(10));
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .get_or_resolve(&Sku::new("OLD"), counting(&calls, ResolveOutcome::Unresolved))
            .await;
        tokio::time::advance(Duration::from_secs(5)).await;
        cache
            .get_or_resolve(&Sku::new("NEW"), counting(&calls, ResolveOutcome::Unresolved))
            .await;
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.stats().await.entries, 1);
        assert_eq!(cache.get(&Sku::new("NEW")).await, Some(ResolveOutcome::Unresolved));

        assert_eq!(cache.clear().await, 1);
        assert_eq!(cache.stats().await.entries, 0);
        assert_eq!(cache.get(&Sku::new("NEW")).await, None);
    }
}

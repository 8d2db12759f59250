//! Cached resolution outcome for one SKU

use std::time::Duration;

use tokio::time::Instant;

use crate::models::{ResolveOutcome, Sku};

/// Upper bound used when `now + ttl` does not fit in an `Instant`
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub sku: Sku,
    pub outcome: ResolveOutcome,
    pub fetched_at: Instant,
    pub expires_at: Instant,
}

impl CacheEntry {
    /// Entry fetched now and live for `ttl`
    pub fn new(sku: Sku, outcome: ResolveOutcome, ttl: Duration) -> Self {
        let fetched_at = Instant::now();
        let expires_at = fetched_at
            .checked_add(ttl)
            .unwrap_or_else(|| fetched_at + MAX_TTL);

        Self {
            sku,
            outcome,
            fetched_at,
            expires_at,
        }
    }

    pub fn is_live_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    pub fn is_live(&self) -> bool {
        self.is_live_at(Instant::now())
    }

    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }

    /// Time left before expiry, zero once expired
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let entry = CacheEntry::new(Sku::new("A1"), ResolveOutcome::Unresolved, Duration::from_secs(60));
        assert!(entry.is_live());
        assert_eq!(entry.remaining(), Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(entry.is_live());
        assert_eq!(entry.age(), Duration::from_secs(59));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!entry.is_live());
        assert_eq!(entry.remaining(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_ttl_is_never_live() {
        let entry = CacheEntry::new(Sku::new("A1"), ResolveOutcome::Unresolved, Duration::ZERO);
        assert!(!entry.is_live());
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_ttl_does_not_overflow() {
        let entry = CacheEntry::new(Sku::new("A1"), ResolveOutcome::Unresolved, Duration::MAX);
        assert!(entry.is_live());
    }
}

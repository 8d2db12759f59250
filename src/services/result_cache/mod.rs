//! Per-SKU resolution cache with TTL expiry and single-flight resolution
//!
//! Each SKU owns a slot: a mutex around its (optional) cache entry. The
//! caller that finds a slot empty or expired resolves while holding the
//! slot, so concurrent callers for the same SKU wait and reuse the result
//! instead of hitting the storefronts again. Expired entries are evicted
//! lazily on access, or in bulk through `purge_expired`.

pub mod entry;
pub mod service;

pub use entry::CacheEntry;
pub use service::{CacheStats, ResultCache};

//! Resolution services
//!
//! Bottom-up: page and image fetchers wrap the HTTP transport, the
//! resolver walks the locales, the result cache deduplicates work per SKU
//! and the image service ties the two together.

pub mod image_fetcher;
pub mod image_service;
pub mod page_fetcher;
pub mod resolver;
pub mod result_cache;

pub use image_fetcher::{ImageFetcher, decode_image};
pub use image_service::ImageResolutionService;
pub use page_fetcher::PageFetcher;
pub use resolver::ImageResolver;
pub use result_cache::{CacheEntry, CacheStats, ResultCache};

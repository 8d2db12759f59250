//! Image URL extraction from storefront product pages
//!
//! The storefront markup is not a contract, so the parsing strategy sits
//! behind [`ImageUrlExtractor`]: page text in, optional URL out. The
//! orchestrator never sees how the URL was found.

pub mod embedded;

pub use embedded::EmbeddedDataExtractor;

use tracing::debug;

use crate::errors::ResolveResult;

/// Finds the product image URL in a product page
pub trait ImageUrlExtractor: Send + Sync {
    /// Raw (not yet normalized) image URL, or the reason there is none
    fn extract(&self, page_body: &str) -> ResolveResult<String>;

    /// Raw image URL, `None` on any failure
    fn extract_image_url(&self, page_body: &str) -> Option<String> {
        match self.extract(page_body) {
            Ok(url) => Some(url),
            Err(e) => {
                debug!("No image URL in page: {}", e);
                None
            }
        }
    }
}

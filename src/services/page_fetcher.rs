//! Product page retrieval

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::debug;

pub use crate::utils::http_client::FetchError;
use crate::utils::http_client::{HttpTransport, get_bounded};

/// Body of a product page, or why it could not be fetched
pub type PageFetchResult = Result<Bytes, FetchError>;

/// Issues a single, timed GET for a locale's product page
///
/// Retrying is not this component's job: the orchestrator moves on to the
/// next locale instead.
#[derive(Clone)]
pub struct PageFetcher {
    transport: Arc<dyn HttpTransport>,
}

impl PageFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    pub async fn fetch_page(&self, url: &str, timeout: Duration, user_agent: &str) -> PageFetchResult {
        let result = get_bounded(self.transport.as_ref(), url, timeout, user_agent).await;
        match &result {
            Ok(body) => debug!("Fetched product page {} ({} bytes)", url, body.len()),
            Err(e) => debug!("Product page {} unavailable: {}", url, e),
        }
        result
    }
}

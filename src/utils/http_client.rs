use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::USER_AGENT;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;

use crate::errors::AppResult;

/// Connection establishment limit for the shared client
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Why a single GET did not produce a usable body
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection refused, reset, DNS failure, truncated body
    #[error("network error: {0}")]
    Network(String),

    /// The request did not complete within its timeout
    #[error("request timed out")]
    Timeout,

    /// The server answered with something other than 200
    #[error("unexpected HTTP status {0}")]
    BadStatus(u16),
}

/// Minimal GET transport used by the page and image fetchers
///
/// Implementations perform exactly one request per call and never retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GET `url` with the given timeout and `User-Agent`, returning the body of a 200 response
    async fn get(&self, url: &str, timeout: Duration, user_agent: &str)
    -> Result<Bytes, FetchError>;
}

/// Run one GET, bounded by `timeout` whatever the transport does internally
pub async fn get_bounded(
    transport: &dyn HttpTransport,
    url: &str,
    timeout: Duration,
    user_agent: &str,
) -> Result<Bytes, FetchError> {
    match tokio::time::timeout(timeout, transport.get(url, timeout, user_agent)).await {
        Ok(result) => result,
        Err(_) => {
            debug!("GET {} exceeded {:?}", url, timeout);
            Err(FetchError::Timeout)
        }
    }
}

/// Default transport backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with the default connection timeout
    pub fn new() -> AppResult<Self> {
        Self::with_connection_timeout(CONNECT_TIMEOUT)
    }

    /// Create a transport with a custom connection timeout
    ///
    /// The total request timeout is passed per call.
    pub fn with_connection_timeout(connect_timeout: Duration) -> AppResult<Self> {
        let client = Client::builder().connect_timeout(connect_timeout).build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client (shared connection pool)
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    fn classify(error: &reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(error.to_string())
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Bytes, FetchError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|e| Self::classify(&e))?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(
                "GET {} returned {} {}",
                url,
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            );
            return Err(FetchError::BadStatus(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| Self::classify(&e))?;
        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StalledTransport;

    #[async_trait]
    impl HttpTransport for StalledTransport {
        async fn get(&self, _: &str, _: Duration, _: &str) -> Result<Bytes, FetchError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Bytes::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_bounded_times_out_stalled_transport() {
        let started = tokio::time::Instant::now();
        let result = get_bounded(
            &StalledTransport,
            "https://slow.example/p",
            Duration::from_secs(5),
            "test-agent",
        )
        .await;

        assert_eq!(result, Err(FetchError::Timeout));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(5) && elapsed < Duration::from_secs(6));
    }

    #[tokio::test]
    async fn test_get_bounded_passes_through_transport_result() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_get()
            .withf(|url, timeout, agent| {
                url == "https://a.example/p" && *timeout == Duration::from_secs(2) && agent == "ua"
            })
            .times(1)
            .returning(|_, _, _| Err(FetchError::BadStatus(503)));

        let result = get_bounded(&transport, "https://a.example/p", Duration::from_secs(2), "ua").await;
        assert_eq!(result, Err(FetchError::BadStatus(503)));
    }

    #[test]
    fn test_reqwest_transport_builds() {
        assert!(ReqwestTransport::new().is_ok());
    }
}

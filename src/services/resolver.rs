//! Resolution orchestrator
//!
//! Walks the locale list in priority order and stops at the first locale
//! that yields a decodable image. Locales are tried strictly one after the
//! other; a later locale is only contacted when every earlier one failed.
//! Each locale gets one request timeout in total, so a lookup never takes
//! longer than the timeout times the number of locales tried.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::image_fetcher::ImageFetcher;
use super::page_fetcher::PageFetcher;
use crate::config::{Config, ResolverConfig};
use crate::errors::{AppResult, ResolveError, ResolveResult};
use crate::extractor::{EmbeddedDataExtractor, ImageUrlExtractor};
use crate::locale::{LocaleEntry, LocaleRegistry};
use crate::models::{ResolveOutcome, ResolvedImage, Sku};
use crate::utils::http_client::HttpTransport;
use crate::utils::url::UrlUtils;

#[derive(Clone)]
pub struct ImageResolver {
    registry: Arc<LocaleRegistry>,
    extractor: Arc<dyn ImageUrlExtractor>,
    page_fetcher: PageFetcher,
    image_fetcher: ImageFetcher,
    settings: Arc<ResolverConfig>,
}

impl ImageResolver {
    pub fn new(
        registry: LocaleRegistry,
        extractor: Arc<dyn ImageUrlExtractor>,
        transport: Arc<dyn HttpTransport>,
        settings: ResolverConfig,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            extractor,
            page_fetcher: PageFetcher::new(transport.clone()),
            image_fetcher: ImageFetcher::new(transport),
            settings: Arc::new(settings),
        }
    }

    /// Validate `config` and build a resolver around `transport`
    pub fn from_config(config: &Config, transport: Arc<dyn HttpTransport>) -> AppResult<Self> {
        config.validate()?;
        let registry = config.locale_registry()?;
        let extractor = EmbeddedDataExtractor::from_config(&config.extractor)?;

        Ok(Self::new(
            registry,
            Arc::new(extractor),
            transport,
            config.resolver.clone(),
        ))
    }

    pub fn registry(&self) -> &LocaleRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &ResolverConfig {
        &self.settings
    }

    /// Resolve using the configured locale order
    pub async fn resolve_default(&self, sku: &Sku) -> ResolveOutcome {
        self.resolve(sku, &self.settings.locale_order).await
    }

    /// Try `locale_codes` in order; the first locale producing an image wins
    pub async fn resolve<S: AsRef<str>>(&self, sku: &Sku, locale_codes: &[S]) -> ResolveOutcome {
        if sku.is_empty() {
            debug!("Empty SKU, nothing to resolve");
            return ResolveOutcome::Unresolved;
        }

        for code in locale_codes.iter().map(AsRef::as_ref) {
            let Some(entry) = self.registry.entry(code) else {
                warn!("Skipping unknown locale '{}' for SKU {}", code, sku);
                continue;
            };

            let timeout = self.settings.request_timeout;
            let deadline = Instant::now() + timeout;
            let attempt = tokio::time::timeout(timeout, self.attempt(sku, entry, deadline))
                .await
                .unwrap_or_else(|_| {
                    Err(ResolveError::Network {
                        url: entry.page_url(sku.as_str()),
                        message: format!("locale attempt exceeded {timeout:?}"),
                    })
                });

            match attempt {
                Ok(image) => {
                    info!(
                        "Resolved image for SKU {} via locale {} ({}x{})",
                        sku, code, image.width, image.height
                    );
                    return ResolveOutcome::Resolved(image);
                }
                Err(e) => {
                    debug!("Locale {} failed for SKU {}: {}", code, sku, e);
                }
            }
        }

        info!(
            "No image found for SKU {} after {} locale(s)",
            sku,
            locale_codes.len()
        );
        ResolveOutcome::Unresolved
    }

    /// One locale: page, embedded data, image URL, image
    ///
    /// Page and image share one budget ending at `deadline`.
    async fn attempt(
        &self,
        sku: &Sku,
        entry: &LocaleEntry,
        deadline: Instant,
    ) -> ResolveResult<ResolvedImage> {
        let settings = &self.settings;
        let page_url = entry.page_url(sku.as_str());

        let body = self
            .page_fetcher
            .fetch_page(&page_url, settings.request_timeout, &settings.user_agent)
            .await
            .map_err(|e| ResolveError::from_fetch(&page_url, &e))?;

        let raw_url = self.extractor.extract(&String::from_utf8_lossy(&body))?;

        let domain = entry.domain().unwrap_or_default();
        let image_url = UrlUtils::normalize_image_url(&raw_url, &domain);
        if image_url.is_empty() {
            return Err(ResolveError::parse("image URL normalized to nothing"));
        }
        debug!("Locale {} image URL for SKU {}: {}", entry.code, sku, image_url);

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(ResolveError::Network {
                url: image_url,
                message: "no time left for the image request".to_string(),
            });
        }

        self.image_fetcher
            .try_fetch_image(
                &image_url,
                remaining,
                &settings.user_agent,
                settings.max_dimension(),
            )
            .await
    }
}

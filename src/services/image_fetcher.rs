//! Image download and decode
//!
//! Every failure (transport, status, empty body, undecodable payload) ends
//! as `None`: nothing upstream can repair a broken image.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use image::imageops::FilterType;
use image::{ImageError, ImageFormat};
use tracing::debug;

use crate::errors::{ResolveError, ResolveResult};
use crate::models::ResolvedImage;
use crate::utils::http_client::{HttpTransport, get_bounded};

#[derive(Clone)]
pub struct ImageFetcher {
    transport: Arc<dyn HttpTransport>,
}

impl ImageFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Fetch and decode the image at `url`, downsampling to `max_dimension` if given
    pub async fn fetch_image(
        &self,
        url: &str,
        timeout: Duration,
        user_agent: &str,
        max_dimension: Option<u32>,
    ) -> Option<ResolvedImage> {
        match self.try_fetch_image(url, timeout, user_agent, max_dimension).await {
            Ok(image) => Some(image),
            Err(e) => {
                debug!("Image {} unusable: {}", url, e);
                None
            }
        }
    }

    /// Same as [`fetch_image`](Self::fetch_image) but keeps the failure reason
    pub async fn try_fetch_image(
        &self,
        url: &str,
        timeout: Duration,
        user_agent: &str,
        max_dimension: Option<u32>,
    ) -> ResolveResult<ResolvedImage> {
        if url.is_empty() {
            return Err(ResolveError::parse("empty image URL"));
        }

        let body = get_bounded(self.transport.as_ref(), url, timeout, user_agent)
            .await
            .map_err(|e| ResolveError::from_fetch(url, &e))?;

        if body.is_empty() {
            return Err(ResolveError::decode(url, "empty response body"));
        }

        let raw_len = body.len();
        let image = tokio::task::spawn_blocking(move || decode_image(body, max_dimension))
            .await
            .map_err(|e| ResolveError::decode(url, format!("decode task failed: {e}")))?
            .map_err(|e| ResolveError::decode(url, e.to_string()))?;

        debug!(
            "Decoded image {} ({} bytes -> {}x{} {:?})",
            url, raw_len, image.width, image.height, image.format
        );
        Ok(image)
    }
}

/// Decode `bytes`; images larger than `max_dimension` on either side are
/// downsampled (aspect ratio kept) and re-encoded as PNG
pub fn decode_image(bytes: Bytes, max_dimension: Option<u32>) -> Result<ResolvedImage, ImageError> {
    let format = image::guess_format(&bytes)?;
    let decoded = image::load_from_memory_with_format(&bytes, format)?;
    let (width, height) = (decoded.width(), decoded.height());

    match max_dimension {
        Some(max) if width > max || height > max => {
            let thumbnail = decoded.resize(max, max, FilterType::Lanczos3);
            let mut png_bytes = Vec::new();
            thumbnail.write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)?;

            Ok(ResolvedImage {
                bytes: Bytes::from(png_bytes),
                width: thumbnail.width(),
                height: thumbnail.height(),
                format: ImageFormat::Png,
            })
        }
        _ => Ok(ResolvedImage {
            bytes,
            width,
            height,
            format,
        }),
    }
}

//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};
use sku_image_resolver::utils::{FetchError, HttpTransport};

#[derive(Clone)]
struct Route {
    response: Result<Bytes, FetchError>,
    delay: Duration,
}

/// In-memory storefront: canned responses per URL, with call counting
///
/// Unknown URLs answer 404.
#[derive(Default)]
pub struct FakeStorefront {
    routes: HashMap<String, Route>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FakeStorefront {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(mut self, url: &str, body: impl Into<Bytes>) -> Self {
        self.routes.insert(
            url.to_string(),
            Route {
                response: Ok(body.into()),
                delay: Duration::ZERO,
            },
        );
        self
    }

    pub fn serve_slowly(mut self, url: &str, body: impl Into<Bytes>, delay: Duration) -> Self {
        self.routes.insert(
            url.to_string(),
            Route {
                response: Ok(body.into()),
                delay,
            },
        );
        self
    }

    pub fn fail(mut self, url: &str, error: FetchError) -> Self {
        self.routes.insert(
            url.to_string(),
            Route {
                response: Err(error),
                delay: Duration::ZERO,
            },
        );
        self
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl HttpTransport for FakeStorefront {
    async fn get(&self, url: &str, _timeout: Duration, _user_agent: &str) -> Result<Bytes, FetchError> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;

        let Some(route) = self.routes.get(url).cloned() else {
            return Err(FetchError::BadStatus(404));
        };
        if !route.delay.is_zero() {
            tokio::time::sleep(route.delay).await;
        }
        route.response
    }
}

/// Transport whose requests never finish
pub struct BlackHole;

#[async_trait]
impl HttpTransport for BlackHole {
    async fn get(&self, _url: &str, _timeout: Duration, _user_agent: &str) -> Result<Bytes, FetchError> {
        std::future::pending::<()>().await;
        Err(FetchError::Timeout)
    }
}

/// Product page carrying the image URL in its data layer
pub fn product_page(image_url: &str) -> String {
    format!(
        r#"<html><head><script>
        var digitalData = {{
            page: {{type: 'product'}},
            productInfo: {{skuImageURL: "{image_url}", brand: 'Acme'}}
        }};
        </script></head><body>product</body></html>"#
    )
}

pub fn encoded_image(width: u32, height: u32, format: ImageFormat) -> Bytes {
    let img: RgbImage = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 3 % 256) as u8, 200])
    });
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), format).unwrap();
    Bytes::from(out)
}

//! URL utilities for consistent URL handling
//!
//! Storefront pages reference images with protocol-relative, root-relative
//! or scheme-less URLs. Everything handed to the image fetcher goes through
//! [`UrlUtils::normalize_image_url`] first.

/// URL utilities for consistent URL handling
pub struct UrlUtils;

impl UrlUtils {
    /// Turn an image reference found in page data into an absolute https URL
    ///
    /// Rules, applied in order:
    ///
    /// 1. `//host/path` gets an `https:` prefix
    /// 2. `/path` is resolved against `https://{domain_hint}`
    /// 3. anything without an `http`/`https` scheme gets `https://`
    /// 4. absolute http(s) URLs are returned unchanged
    ///
    /// Never fails. Empty input yields an empty string, which callers treat
    /// as "no image URL".
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sku_image_resolver::utils::url::UrlUtils;
    ///
    /// assert_eq!(UrlUtils::normalize_image_url("//cdn/x.png", "example.com"), "https://cdn/x.png");
    /// assert_eq!(UrlUtils::normalize_image_url("/img/x.png", "example.com"), "https://example.com/img/x.png");
    /// assert_eq!(UrlUtils::normalize_image_url("cdn.com/x.png", "example.com"), "https://cdn.com/x.png");
    /// assert_eq!(UrlUtils::normalize_image_url("https://a/b", "x"), "https://a/b");
    /// ```
    pub fn normalize_image_url(raw: &str, domain_hint: &str) -> String {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            String::new()
        } else if trimmed.starts_with("//") {
            format!("https:{trimmed}")
        } else if trimmed.starts_with('/') {
            format!("https://{}{trimmed}", domain_hint.trim_end_matches('/'))
        } else if Self::has_http_scheme(trimmed) {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        }
    }

    /// Whether the URL starts with `http://` or `https://` (case-insensitive)
    pub fn has_http_scheme(url: &str) -> bool {
        let prefix: String = url.chars().take(8).collect::<String>().to_ascii_lowercase();
        prefix.starts_with("http://") || prefix.starts_with("https://")
    }
}

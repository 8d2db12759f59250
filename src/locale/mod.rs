/*!
 Locale Registry

 Static mapping from a storefront locale code to the page-URL template used
 to look up a SKU on that storefront. Templates carry a `{sku}` placeholder:

   let reg = LocaleRegistry::builtin();
   let url = reg.page_url("nl", "12345"); // -> Some("https://www.storefront.nl/nl-nl/p/12345")

 The registry only answers lookups. Which locales are tried, and in what
 order, is decided by the caller (see `ResolverConfig::locale_order`).
*/

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::{AppError, AppResult};

/// Placeholder substituted with the (percent-encoded) SKU
pub const SKU_PLACEHOLDER: &str = "{sku}";

/// Built-in storefront table, in default priority order
static BUILTIN_LOCALES: &[(&str, &str)] = &[
    ("nl", "https://www.storefront.nl/nl-nl/p/{sku}"),
    ("be", "https://www.storefront.be/nl-be/p/{sku}"),
    ("de", "https://www.storefront.de/de-de/p/{sku}"),
    ("fr", "https://www.storefront.fr/fr-fr/p/{sku}"),
    ("uk", "https://www.storefront.co.uk/en-gb/p/{sku}"),
];

/// One storefront locale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleEntry {
    pub code: String,
    pub url_template: String,
}

impl LocaleEntry {
    pub fn new<C: Into<String>, T: Into<String>>(code: C, url_template: T) -> Self {
        Self {
            code: code.into(),
            url_template: url_template.into(),
        }
    }

    /// Host of the storefront, used to absolutize root-relative image paths
    pub fn domain(&self) -> Option<String> {
        let sample = self.url_template.replace(SKU_PLACEHOLDER, "sample");
        Url::parse(&sample)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
    }

    /// Product page URL for `sku` on this storefront
    pub fn page_url(&self, sku: &str) -> String {
        self.url_template
            .replace(SKU_PLACEHOLDER, &urlencoding::encode(sku))
    }
}

/// Read-only lookup table of storefront locales
#[derive(Debug, Clone)]
pub struct LocaleRegistry {
    entries: Vec<LocaleEntry>,
    index: HashMap<String, usize>,
}

impl LocaleRegistry {
    /// Build a registry, rejecting duplicate codes and unusable templates
    pub fn from_entries(entries: Vec<LocaleEntry>) -> AppResult<Self> {
        if entries.is_empty() {
            return Err(AppError::configuration("locale table must not be empty"));
        }

        let mut index = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            if entry.code.trim().is_empty() {
                return Err(AppError::configuration("locale code must not be empty"));
            }
            if !entry.url_template.contains(SKU_PLACEHOLDER) {
                return Err(AppError::configuration(format!(
                    "locale '{}' template has no {} placeholder: {}",
                    entry.code, SKU_PLACEHOLDER, entry.url_template
                )));
            }
            if entry.domain().is_none() {
                return Err(AppError::configuration(format!(
                    "locale '{}' template is not an absolute URL: {}",
                    entry.code, entry.url_template
                )));
            }
            if index.insert(entry.code.clone(), position).is_some() {
                return Err(AppError::configuration(format!(
                    "duplicate locale code '{}'",
                    entry.code
                )));
            }
        }

        Ok(Self { entries, index })
    }

    /// Process-wide registry of the built-in storefronts
    pub fn builtin() -> &'static Self {
        static REGISTRY: OnceLock<LocaleRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            let entries: Vec<LocaleEntry> = BUILTIN_LOCALES
                .iter()
                .map(|(code, template)| LocaleEntry::new(*code, *template))
                .collect();
            let index = entries
                .iter()
                .enumerate()
                .map(|(position, entry)| (entry.code.clone(), position))
                .collect();
            Self { entries, index }
        })
    }

    pub fn entry(&self, code: &str) -> Option<&LocaleEntry> {
        self.index.get(code).map(|&position| &self.entries[position])
    }

    pub fn template_for(&self, code: &str) -> Option<&str> {
        self.entry(code).map(|entry| entry.url_template.as_str())
    }

    pub fn page_url(&self, code: &str, sku: &str) -> Option<String> {
        self.entry(code).map(|entry| entry.page_url(sku))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    /// Codes in table order
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.code.as_str())
    }

    pub fn entries(&self) -> &[LocaleEntry] {
        &self.entries
    }
}

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use crate::errors::{AppError, AppResult};
use crate::locale::{LocaleEntry, LocaleRegistry};
use defaults::*;
use duration_serde::{duration, option_duration};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    /// Replaces the built-in locale table when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locales: Option<Vec<LocaleEntry>>,
}

/// Locale fallback and network settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Locale codes to try, highest priority first
    #[serde(default = "default_locale_order")]
    pub locale_order: Vec<String>,
    /// Upper bound for every single HTTP request
    #[serde(default = "default_request_timeout", with = "duration")]
    pub request_timeout: Duration,
    /// Browser-like identification; the storefronts reject bare clients
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Longest image side after downsampling, 0 keeps images at full size
    #[serde(default = "default_max_image_dimension")]
    pub max_image_dimension: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of a resolved image
    #[serde(default = "default_cache_ttl", with = "duration")]
    pub ttl: Duration,
    /// Lifetime of an unresolved outcome, defaults to `ttl`
    #[serde(
        default,
        with = "option_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub negative_ttl: Option<Duration>,
}

/// Where the image URL lives inside the product page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Assignment target introducing the embedded object, e.g. `digitalData`
    #[serde(default = "default_data_assignment")]
    pub assignment: String,
    /// Dotted path of the image URL inside the embedded object
    #[serde(default = "default_image_field")]
    pub image_field: String,
}

fn default_locale_order() -> Vec<String> {
    DEFAULT_LOCALE_ORDER.iter().map(|code| code.to_string()).collect()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_max_image_dimension() -> u32 {
    DEFAULT_MAX_IMAGE_DIMENSION
}

fn default_cache_ttl() -> Duration {
    Duration::from_secs(DEFAULT_CACHE_TTL_SECS)
}

fn default_data_assignment() -> String {
    DEFAULT_DATA_ASSIGNMENT.to_string()
}

fn default_image_field() -> String {
    DEFAULT_IMAGE_FIELD.to_string()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            locale_order: default_locale_order(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
            max_image_dimension: default_max_image_dimension(),
        }
    }
}

impl ResolverConfig {
    pub fn max_dimension(&self) -> Option<u32> {
        (self.max_image_dimension > 0).then_some(self.max_image_dimension)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: default_cache_ttl(),
            negative_ttl: None,
        }
    }
}

impl CacheConfig {
    /// Lifetime applied to `Unresolved` outcomes
    pub fn effective_negative_ttl(&self) -> Duration {
        self.negative_ttl.unwrap_or(self.ttl)
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            assignment: default_data_assignment(),
            image_field: default_image_field(),
        }
    }
}

impl Config {
    pub fn load() -> AppResult<Self> {
        let config_file =
            std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from_file(&config_file)
    }

    /// Load from `config_file`, falling back to defaults when it does not exist
    pub fn load_from_file(config_file: &str) -> AppResult<Self> {
        if Path::new(config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            let config = Self::from_toml_str(&contents)?;
            info!("Configuration loaded from: {}", config_file);
            Ok(config)
        } else {
            info!("Config file {} not found, using defaults", config_file);
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(contents: &str) -> AppResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Locale table in effect: the configured one, or the built-in storefronts
    pub fn locale_registry(&self) -> AppResult<LocaleRegistry> {
        match &self.locales {
            Some(entries) => LocaleRegistry::from_entries(entries.clone()),
            None => Ok(LocaleRegistry::builtin().clone()),
        }
    }

    /// Reject configurations that can never resolve anything
    pub fn validate(&self) -> AppResult<()> {
        if self.resolver.locale_order.is_empty() {
            return Err(AppError::configuration(
                "resolver.locale_order must list at least one locale",
            ));
        }

        let registry = self.locale_registry()?;
        if let Some(unknown) = self
            .resolver
            .locale_order
            .iter()
            .find(|code| !registry.contains(code))
        {
            return Err(AppError::configuration(format!(
                "resolver.locale_order references unknown locale '{unknown}'"
            )));
        }

        if self.resolver.request_timeout.is_zero() {
            return Err(AppError::configuration(
                "resolver.request_timeout must be greater than zero",
            ));
        }

        if self.resolver.user_agent.trim().is_empty() {
            return Err(AppError::configuration("resolver.user_agent must not be empty"));
        }

        if self.extractor.assignment.trim().is_empty() || self.extractor.image_field.trim().is_empty()
        {
            return Err(AppError::configuration(
                "extractor.assignment and extractor.image_field must not be empty",
            ));
        }

        Ok(())
    }
}

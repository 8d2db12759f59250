/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Resolver defaults
pub const DEFAULT_LOCALE_ORDER: &[&str] = &["nl", "be", "de", "fr", "uk"];
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 8;
pub const DEFAULT_MAX_IMAGE_DIMENSION: u32 = 300;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

// Cache defaults
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

// Extractor defaults
pub const DEFAULT_DATA_ASSIGNMENT: &str = "digitalData";
pub const DEFAULT_IMAGE_FIELD: &str = "productInfo.skuImageURL";

// Config file
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
pub const CONFIG_FILE_ENV: &str = "CONFIG_FILE";

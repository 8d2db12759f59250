//! Error type definitions for the SKU image resolver

use thiserror::Error;

use crate::utils::http_client::FetchError;

/// Top-level application error type
///
/// Only produced while building the resolver (configuration loading and
/// validation, HTTP client construction). The resolution path itself never
/// returns one of these.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Filesystem errors (config file, output directory)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failure of a single locale attempt
///
/// The orchestrator recovers from every variant by advancing to the next
/// locale.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Timeout, connection refused or reset
    #[error("Network error: {url} - {message}")]
    Network { url: String, message: String },

    /// Non-200 response
    #[error("HTTP status error: {status} - {url}")]
    HttpStatus { url: String, status: u16 },

    /// Pattern not found, malformed embedded object or missing field
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// Image bytes could not be decoded
    #[error("Decode error: {url} - {message}")]
    Decode { url: String, message: String },
}

impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl ResolveError {
    /// Create a parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Classify a transport failure for the given URL
    pub fn from_fetch(url: &str, error: &FetchError) -> Self {
        match error {
            FetchError::BadStatus(status) => Self::HttpStatus {
                url: url.to_string(),
                status: *status,
            },
            FetchError::Timeout => Self::Network {
                url: url.to_string(),
                message: "request timed out".to_string(),
            },
            FetchError::Network(message) => Self::Network {
                url: url.to_string(),
                message: message.clone(),
            },
        }
    }
}

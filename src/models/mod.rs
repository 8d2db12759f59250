//! Core value types shared by the resolver, the cache and the CLI

use std::fmt;

use bytes::Bytes;
use image::ImageFormat;
use serde::{Deserialize, Serialize};

/// Stock-keeping unit identifier
///
/// Opaque to the resolver. Surrounding whitespace (common in spreadsheet
/// exports) is trimmed on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Sku(String);

impl Sku {
    pub fn new<S: AsRef<str>>(value: S) -> Self {
        Self(value.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Sku {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Sku {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<Sku> for String {
    fn from(value: Sku) -> Self {
        value.0
    }
}

/// A fetched and decoded product image
///
/// `bytes` holds the payload exactly as served when no downsampling was
/// needed, otherwise the PNG encoding of the downsampled image. `format`
/// always describes `bytes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub bytes: Bytes,
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
}

impl ResolvedImage {
    /// MIME type of the stored payload
    pub fn content_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Preferred file extension for the stored payload
    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("img")
    }
}

/// The only two results a resolution can have
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    Resolved(ResolvedImage),
    Unresolved,
}

impl ResolveOutcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn image(&self) -> Option<&ResolvedImage> {
        match self {
            Self::Resolved(image) => Some(image),
            Self::Unresolved => None,
        }
    }

    pub fn into_image(self) -> Option<ResolvedImage> {
        match self {
            Self::Resolved(image) => Some(image),
            Self::Unresolved => None,
        }
    }
}

impl From<Option<ResolvedImage>> for ResolveOutcome {
    fn from(value: Option<ResolvedImage>) -> Self {
        value.map_or(Self::Unresolved, Self::Resolved)
    }
}

/// Accept/reject decision recorded by the review UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Accepted,
    Rejected,
}

/// One row of a product-matching review sheet
///
/// Reading and writing the sheet is left to the surrounding application;
/// the resolver only needs the two SKUs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRow {
    pub own_sku: Sku,
    pub own_title: String,
    pub oem_sku: Sku,
    pub oem_title: String,
    pub certainty_score: Option<f64>,
    pub reasoning: Option<String>,
    pub decision: Option<ReviewDecision>,
}

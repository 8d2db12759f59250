//! Extraction from a JavaScript data-layer assignment
//!
//! Product pages carry something like
//!
//! ```text
//! <script>
//!   var digitalData = {'productInfo': {'sku': '12345', 'skuImageURL': '//img.cdn/12345.jpg'}};
//! </script>
//! ```
//!
//! The object literal is JSON except, often, for its quoting. Valid JSON is
//! parsed as is; otherwise bare object keys are quoted and apostrophes are
//! turned into double quotes before giving up.

use regex::Regex;
use serde_json::Value;

use super::ImageUrlExtractor;
use crate::config::ExtractorConfig;
use crate::errors::{AppError, AppResult, ResolveError, ResolveResult};

/// An unquoted object key following `{` or `,`
const BARE_KEY_PATTERN: &str = r"([{,]\s*)([A-Za-z_$][A-Za-z0-9_$]*)\s*:";

/// Regex + loose-JSON extractor for an embedded data object
#[derive(Debug, Clone)]
pub struct EmbeddedDataExtractor {
    pattern: Regex,
    bare_key: Regex,
    field_path: Vec<String>,
}

impl EmbeddedDataExtractor {
    /// `assignment` is the variable the page assigns the object to,
    /// `image_field` the dotted path of the URL inside it
    pub fn new(assignment: &str, image_field: &str) -> AppResult<Self> {
        let assignment = assignment.trim();
        if assignment.is_empty() {
            return Err(AppError::configuration("extractor assignment must not be empty"));
        }

        let field_path: Vec<String> = image_field
            .split('.')
            .map(str::trim)
            .map(str::to_string)
            .collect();
        if field_path.iter().any(String::is_empty) {
            return Err(AppError::configuration(format!(
                "invalid extractor image field path '{image_field}'"
            )));
        }

        let pattern = Regex::new(&format!(
            r"(?s)(?:^|[^A-Za-z0-9_$]){}\s*=\s*(\{{.*?\}})\s*;",
            regex::escape(assignment)
        ))
        .map_err(|e| AppError::configuration(format!("invalid extractor pattern: {e}")))?;
        let bare_key = Regex::new(BARE_KEY_PATTERN)
            .map_err(|e| AppError::configuration(format!("invalid key pattern: {e}")))?;

        Ok(Self {
            pattern,
            bare_key,
            field_path,
        })
    }

    pub fn from_config(config: &ExtractorConfig) -> AppResult<Self> {
        Self::new(&config.assignment, &config.image_field)
    }

    /// Parse the literal as is, then with bare keys quoted, then with
    /// apostrophes turned into double quotes (with and without key quoting)
    fn parse_literal(&self, literal: &str) -> ResolveResult<Value> {
        let strict_error = match serde_json::from_str::<Value>(literal) {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        let requoted = literal.replace('\'', "\"");
        let candidates = [
            self.bare_key.replace_all(literal, "$1\"$2\":").into_owned(),
            self.bare_key.replace_all(&requoted, "$1\"$2\":").into_owned(),
            requoted,
        ];

        candidates
            .iter()
            .find_map(|candidate| serde_json::from_str::<Value>(candidate).ok())
            .ok_or_else(|| ResolveError::parse(format!("malformed embedded object: {strict_error}")))
    }

    fn lookup<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.field_path
            .iter()
            .try_fold(root, |node, segment| match node {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            })
    }
}

impl ImageUrlExtractor for EmbeddedDataExtractor {
    fn extract(&self, page_body: &str) -> ResolveResult<String> {
        let literal = self
            .pattern
            .captures(page_body)
            .and_then(|captures| captures.get(1))
            .ok_or_else(|| ResolveError::parse("embedded data assignment not found"))?;

        let data = self.parse_literal(literal.as_str())?;

        match self.lookup(&data) {
            Some(Value::String(url)) if !url.trim().is_empty() => Ok(url.trim().to_string()),
            Some(Value::String(_)) => Err(ResolveError::parse(format!(
                "field '{}' is empty",
                self.field_path.join(".")
            ))),
            Some(_) => Err(ResolveError::parse(format!(
                "field '{}' is not a string",
                self.field_path.join(".")
            ))),
            None => Err(ResolveError::parse(format!(
                "field '{}' is missing",
                self.field_path.join(".")
            ))),
        }
    }
}

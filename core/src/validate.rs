//! Argument validation shared by every request builder.
//!
//! # Design
//! The scheme allow-list and the per-operation limits are plain values owned
//! by `Validator` and `Limits`, carried inside `ClientConfig`, rather than
//! global constants. `ValidationLog` is the deferred-error accumulator the
//! builders push into; the first recorded error is the one reported.

use url::Url;

use crate::error::ValidationError;
use crate::params::Params;

/// Schemes the service accepts for a bookmark URL.
pub const DEFAULT_SCHEMES: [&str; 7] =
    ["http", "https", "javascript", "mailto", "ftp", "file", "feed"];

/// Characters that may never appear inside a single tag.
const TAG_FORBIDDEN: [char; 8] = ['\t', '\n', '\u{0B}', '\u{0C}', '\r', ' ', '\u{85}', '\u{A0}'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validator {
    schemes: Vec<String>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::with_schemes(DEFAULT_SCHEMES)
    }
}

impl Validator {
    pub fn with_schemes<I, S>(schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            schemes: schemes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn schemes(&self) -> &[String] {
        &self.schemes
    }

    /// Accept `u` only if it parses as an absolute URL with an allowed scheme.
    pub fn validate_url(&self, u: &str) -> Result<(), ValidationError> {
        let parsed = Url::parse(u).map_err(|_| ValidationError::InvalidUrl(u.to_string()))?;
        if self.schemes.iter().any(|s| s == parsed.scheme()) {
            Ok(())
        } else {
            Err(ValidationError::InvalidUrl(u.to_string()))
        }
    }
}

/// Per-operation caps and defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Tag filter cap for the read, search and recent operations.
    pub read_tags: usize,
    /// Tag cap when saving a post.
    pub add_tags: usize,
    pub recent_default: u32,
    pub recent_max: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            read_tags: 3,
            add_tags: 100,
            recent_default: 15,
            recent_max: 100,
        }
    }
}

/// Split a space-delimited tag string.
///
/// An empty string yields no tags. Tokens are not deduplicated and empty
/// tokens produced by consecutive spaces are kept.
pub fn parse_tags(s: &str) -> Result<Vec<String>, ValidationError> {
    if s.is_empty() {
        return Ok(Vec::new());
    }
    s.split(' ')
        .map(|tag| {
            if tag.contains(&TAG_FORBIDDEN[..]) {
                Err(ValidationError::InvalidTag(tag.to_string()))
            } else {
                Ok(tag.to_string())
            }
        })
        .collect()
}

/// Parse `s` and enforce an operation-specific tag cap.
pub fn parse_tags_limited(s: &str, limit: usize) -> Result<Vec<String>, ValidationError> {
    let tags = parse_tags(s)?;
    if tags.len() > limit {
        return Err(ValidationError::TooManyTags { limit });
    }
    Ok(tags)
}

/// Accept a single tag name: non-empty and free of whitespace.
pub fn validate_tag(tag: &str) -> Result<(), ValidationError> {
    if tag.is_empty() || tag.contains(&TAG_FORBIDDEN[..]) {
        return Err(ValidationError::InvalidTag(tag.to_string()));
    }
    Ok(())
}

/// Deferred validation errors, in the order they were recorded.
#[derive(Debug, Clone, Default)]
pub struct ValidationLog {
    errors: Vec<ValidationError>,
}

impl ValidationLog {
    /// Keep the value on success; otherwise record the error and drop it.
    pub fn record<T>(&mut self, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.errors.push(err);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Hand back `params` if nothing was recorded, else the first error.
    pub fn finish(&self, params: Params) -> Result<Params, ValidationError> {
        match self.errors.first() {
            Some(err) => Err(err.clone()),
            None => Ok(params),
        }
    }
}

//! Per-source element path configuration

use scraper::Selector;
use std::fmt;

use crate::extract::ExtractError;

/// Where each canonical field lives inside a source document.
///
/// `rows` locates the repeated row elements in the whole document; the
/// remaining queries are evaluated relative to one row. A query is a CSS
/// selector, optionally ending in `@name` to read attribute `name` from
/// the matched element instead of its text.
///
/// `rows`, `ip` and `port` are mandatory. The other entries may be left
/// empty when the source never publishes that field; the extractor then
/// resolves the field to an empty string without any lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElementPaths {
    pub rows: &'static str,
    pub ip: &'static str,
    pub port: &'static str,
    pub protocol: &'static str,
    pub country: &'static str,
    pub anonymity: &'static str,
}

/// A compiled field query: CSS selector plus optional attribute read.
#[derive(Debug, Clone)]
pub struct FieldQuery {
    css: String,
    selector: Selector,
    attr: Option<String>,
}

impl FieldQuery {
    /// Compile a query string, splitting a trailing `@attr` component off
    /// the selector part. Fails when the selector part is not valid CSS.
    pub fn parse(query: &str) -> Result<Self, ExtractError> {
        let (css, attr) = match query.rsplit_once('@') {
            Some((selector, attr)) if !selector.is_empty() && !attr.is_empty() => {
                (selector.trim(), Some(attr.trim().to_string()))
            }
            _ => (query, None),
        };
        let selector =
            Selector::parse(css).map_err(|_| ExtractError::BadQuery(query.to_string()))?;
        Ok(Self {
            css: css.to_string(),
            selector,
            attr,
        })
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Attribute to read instead of element text, if any
    pub fn attr(&self) -> Option<&str> {
        self.attr.as_deref()
    }
}

impl fmt::Display for FieldQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attr {
            Some(attr) => write!(f, "{}@{}", self.css, attr),
            None => f.write_str(&self.css),
        }
    }
}

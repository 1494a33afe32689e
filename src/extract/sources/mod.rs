//! Registered proxy listing sources
//!
//! Each submodule wires one listing site or API into the shared
//! extraction contract: its start URLs, retrieval flags, and either a
//! configured [`TableExtractor`] or a body parser for non-markup feeds.

pub mod freeproxylist;
pub mod geonode;
pub mod proxynova;
pub mod proxyscrape;
pub mod spysone;

use scraper::Html;
use url::Url;

use crate::extract::record::ProxyRecord;
use crate::extract::table::TableExtractor;
use crate::Result;

/// How a source's response body turns into records.
#[derive(Debug, Clone)]
pub enum SourceKind {
    /// Markup walked row by row through the shared contract
    Table(TableExtractor),
    /// Plain text body; fields derive from body lines and the request URL
    Text(fn(&str, &Url) -> Vec<ProxyRecord>),
    /// JSON body with typed fields
    Json(fn(&str) -> Result<Vec<ProxyRecord>>),
}

/// A follow-up form submission harvested from an initial document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRequest {
    /// Form action, possibly relative to the page URL
    pub action: String,
    /// Payload submitted urlencoded
    pub fields: Vec<(String, String)>,
}

/// One registered listing source.
#[derive(Debug, Clone)]
pub struct Source {
    /// Identifier stamped into every record's `source` field
    pub name: &'static str,
    /// Start targets fetched for this source
    pub urls: Vec<String>,
    /// The document must come from a full browser render, not a raw fetch
    pub render: bool,
    /// A challenge-solving pre-step must run before the first request
    pub challenge: bool,
    /// Harvest a follow-up form request from the first document; its
    /// response becomes the document that is actually extracted
    pub follow_up: Option<fn(&Html) -> Option<FormRequest>>,
    /// Body-to-records conversion
    pub kind: SourceKind,
}

impl Source {
    /// Create a source with the given identifier and parse kind; both
    /// retrieval flags start off.
    pub fn new(name: &'static str, kind: SourceKind) -> Self {
        Self {
            name,
            urls: Vec::new(),
            render: false,
            challenge: false,
            follow_up: None,
            kind,
        }
    }

    /// Set the start URLs
    pub fn with_urls(mut self, urls: Vec<String>) -> Self {
        self.urls = urls;
        self
    }

    /// Require a rendered document
    pub fn with_render(mut self) -> Self {
        self.render = true;
        self
    }

    /// Require the challenge-solving pre-step
    pub fn with_challenge(mut self) -> Self {
        self.challenge = true;
        self
    }

    /// Set the follow-up form harvester
    pub fn with_follow_up(mut self, harvest: fn(&Html) -> Option<FormRequest>) -> Self {
        self.follow_up = Some(harvest);
        self
    }
}

/// All registered sources, in a stable order.
pub fn all() -> Result<Vec<Source>> {
    Ok(vec![
        freeproxylist::source()?,
        proxynova::source()?,
        spysone::source()?,
        proxyscrape::source(),
        geonode::source(),
    ])
}

/// Look up a registered source by its identifier.
pub fn find(name: &str) -> Result<Option<Source>> {
    Ok(all()?.into_iter().find(|source| source.name == name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_holds_all_sources() {
        let sources = all().unwrap();
        assert_eq!(sources.len(), 5);

        let names: HashSet<_> = sources.iter().map(|source| source.name).collect();
        assert_eq!(names.len(), 5);
        for source in &sources {
            assert!(!source.urls.is_empty(), "{} has no start URL", source.name);
        }
    }

    #[test]
    fn test_find_by_name() {
        assert!(find("geonode").unwrap().is_some());
        assert!(find("nosuchsource").unwrap().is_none());
    }
}

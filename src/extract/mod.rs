//! Extraction and normalization core
//!
//! Turns heterogeneous source documents into uniform [`ProxyRecord`]s:
//!
//! - [`pattern`]: fixed per-field cleaning patterns and the first-match rule
//! - [`paths`]: per-source element path configuration
//! - [`table`]: the shared row-to-record contract with per-field overrides
//! - [`sources`]: one registered extractor per supported listing site or API

pub mod paths;
pub mod pattern;
pub mod record;
pub mod sources;
pub mod table;

pub use paths::{ElementPaths, FieldQuery};
pub use record::ProxyRecord;
pub use sources::{FormRequest, Source, SourceKind};
pub use table::{FieldOverrides, Records, Row, TableExtractor};

use thiserror::Error;

/// Configuration errors raised while building an extractor. These surface
/// immediately at construction; field-level extraction misses are not
/// errors and resolve to empty defaults instead.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// A mandatory element path (`rows`, `ip`, `port`) was left empty
    #[error("missing required element path `{0}`")]
    MissingPath(&'static str),
    /// A query expression failed to compile as a CSS selector
    #[error("invalid query expression `{0}`")]
    BadQuery(String),
    /// A source was registered without any start URL
    #[error("source `{0}` has no start URL")]
    NoStartUrl(&'static str),
}

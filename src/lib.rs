//! Proxy Harvest - proxy list collection and normalization
//!
//! Collects public proxy listings from several third-party sites and
//! APIs and normalizes them into one record shape. Each source declares
//! where its fields live and how to reach its documents; a shared
//! extraction contract turns heterogeneous tables, text feeds and JSON
//! payloads into uniform records.

pub mod extract;
pub mod fetch;

pub use extract::record::ProxyRecord;
pub use extract::sources::{Source, SourceKind};
pub use extract::table::{FieldOverrides, Row, TableExtractor};
pub use extract::{ElementPaths, ExtractError};
pub use fetch::{FetchConfig, Fetcher, HarvestResult, RequestContext};

/// Application result type
pub type Result<T> = anyhow::Result<T>;

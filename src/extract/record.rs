//! Normalized proxy record type

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single proxy entry normalized from one row of a source document.
///
/// Fields that fail to extract keep their empty/zero defaults; a record is
/// emitted for every located row no matter how many fields resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProxyRecord {
    /// Dotted-quad IPv4 literal, or empty when not extractable
    pub ip: String,
    /// Port number; 0 means "not found"
    pub port: u16,
    /// One of http/https/socks4/socks5, or empty
    pub protocol: String,
    /// Two-letter uppercase country code, or empty
    pub country: String,
    /// One of transparent/anonymous/elite, or empty
    pub anonymity: String,
    /// Identifier of the producing source, always present
    pub source: String,
}

impl ProxyRecord {
    /// Get the record in IP:PORT format
    pub fn to_simple_string(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

impl fmt::Display for ProxyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_simple_string())
    }
}

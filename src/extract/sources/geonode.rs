//! proxylist.geonode.com
//!
//! A JSON API whose entries already carry every canonical field, so the
//! mapping is nearly 1:1. The port arrives as a string and the protocol
//! comes as a sequence of which only the first entry is kept.

use serde::Deserialize;

use crate::extract::record::ProxyRecord;
use crate::extract::sources::{Source, SourceKind};
use crate::Result;

pub const NAME: &str = "geonode";

const START_URL: &str = "https://proxylist.geonode.com/api/proxy-list?limit=500&page=1&sort_by=lastChecked&sort_type=desc&anonymityLevel=elite&anonymityLevel=anonymous";

/// API response envelope
#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(default)]
    data: Vec<Entry>,
}

/// One proxy object as the API publishes it
#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    ip: String,
    /// Arrives as a string, not a number
    #[serde(default)]
    port: String,
    #[serde(default)]
    protocols: Vec<String>,
    #[serde(default)]
    country: String,
    #[serde(default, rename = "anonymityLevel")]
    anonymity_level: String,
}

fn parse(body: &str) -> Result<Vec<ProxyRecord>> {
    let listing: Listing = serde_json::from_str(body)?;
    Ok(listing
        .data
        .into_iter()
        .map(|entry| ProxyRecord {
            ip: entry.ip,
            port: entry.port.parse().unwrap_or(0),
            protocol: entry.protocols.into_iter().next().unwrap_or_default(),
            country: entry.country,
            anonymity: entry.anonymity_level,
            source: NAME.to_string(),
        })
        .collect())
}

pub fn source() -> Source {
    Source::new(NAME, SourceKind::Json(parse)).with_urls(vec![START_URL.to_string()])
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "data": [
            {
                "_id": "64a1f7",
                "ip": "124.109.22.174",
                "anonymityLevel": "elite",
                "asn": "AS45702",
                "city": "Karachi",
                "country": "PK",
                "created_at": "2021-07-02T03:14:07.774Z",
                "port": "5678",
                "protocols": ["socks4"],
                "upTime": 60.5
            },
            {
                "ip": "91.209.11.131",
                "anonymityLevel": "anonymous",
                "country": "RU",
                "port": "80",
                "protocols": ["http", "https"]
            }
        ],
        "total": 2, "page": 1, "limit": 500
    }"#;

    #[test]
    fn test_fields_map_one_to_one() {
        let records = parse(FIXTURE).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].ip, "124.109.22.174");
        assert_eq!(records[0].port, 5678);
        assert_eq!(records[0].protocol, "socks4");
        assert_eq!(records[0].country, "PK");
        assert_eq!(records[0].anonymity, "elite");
        assert_eq!(records[0].source, "geonode");
        // only the first protocol is kept
        assert_eq!(records[1].protocol, "http");
    }

    #[test]
    fn test_missing_entry_fields_fall_back_to_defaults() {
        let records = parse(r#"{"data": [{"ip": "1.2.3.4"}]}"#).unwrap();
        assert_eq!(records[0].ip, "1.2.3.4");
        assert_eq!(records[0].port, 0);
        assert_eq!(records[0].protocol, "");
        assert_eq!(records[0].anonymity, "");
    }

    #[test]
    fn test_missing_data_array_yields_no_records() {
        assert!(parse(r#"{"total": 0}"#).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_body_is_an_error() {
        assert!(parse("<html>rate limited</html>").is_err());
    }
}

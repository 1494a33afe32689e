//! api.proxyscrape.com
//!
//! A plain text API returning one `ip:port` per line. Protocol and
//! anonymity never appear in the body; they are echoed back from the
//! request URL's own query parameters, with one twist: the API labels
//! TLS-capable http proxies via `ssl=yes` rather than a distinct
//! protocol, so that combination reads back as https. One URL is built
//! per protocol/ssl/anonymity combination.

use url::Url;

use crate::extract::pattern::{self, IP_REGEX};
use crate::extract::record::ProxyRecord;
use crate::extract::sources::{Source, SourceKind};

pub const NAME: &str = "proxyscrape";

const PROTOCOLS: [&str; 3] = ["http", "socks4", "socks5"];
const SSL: [&str; 2] = ["yes", "no"];
const ANONYMITY: [&str; 2] = ["elite", "anonymous"];

fn build_urls() -> Vec<String> {
    let mut urls = Vec::new();
    for anonymity in ANONYMITY {
        for ssl in SSL {
            for protocol in PROTOCOLS {
                urls.push(format!(
                    "https://api.proxyscrape.com/v2/?request=displayproxies&protocol={}&ssl={}&anonymity={}&country=all&timeout=10000",
                    protocol, ssl, anonymity
                ));
            }
        }
    }
    urls
}

fn query_param(url: &Url, key: &str) -> String {
    url.query_pairs()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.to_string())
        .unwrap_or_default()
}

fn parse(body: &str, url: &Url) -> Vec<ProxyRecord> {
    let mut protocol = query_param(url, "protocol");
    let ssl = query_param(url, "ssl");
    let anonymity = query_param(url, "anonymity");
    if protocol == "http" && ssl == "yes" {
        protocol = "https".to_string();
    }

    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let (ip, port) = line.split_once(':').unwrap_or((line, ""));
            ProxyRecord {
                ip: pattern::match_first(ip, &IP_REGEX),
                port: pattern::match_port(port),
                protocol: protocol.clone(),
                country: String::new(),
                anonymity: anonymity.clone(),
                source: NAME.to_string(),
            }
        })
        .collect()
}

pub fn source() -> Source {
    Source::new(NAME, SourceKind::Text(parse)).with_urls(build_urls())
}

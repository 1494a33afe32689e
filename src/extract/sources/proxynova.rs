//! proxynova.com
//!
//! Needs a rendered document. IP cells sometimes wrap the address in an
//! `<abbr>` carrying a decoy script ahead of the real value, and port
//! cells sometimes wrap the number in a link, so both fields probe for
//! the wrapper before reading:
//!
//! ```html
//! <td><abbr title="54.37.160.88"><script>document.write('54.37.160.88')</script>54.37.160.88</abbr></td>
//! <td><a href="...">3128</a></td>
//! ```
//!
//! Country sits in the flag image's `alt` attribute. The crawled listing
//! is the elite page, so protocol and anonymity are fixed values.

use crate::extract::paths::ElementPaths;
use crate::extract::pattern::{self, IP_REGEX};
use crate::extract::sources::{Source, SourceKind};
use crate::extract::table::{FieldOverrides, Row, TableExtractor};
use crate::extract::ExtractError;

pub const NAME: &str = "proxynova";

const START_URL: &str = "https://www.proxynova.com/proxy-server-list/elite-proxies/";

fn paths() -> ElementPaths {
    ElementPaths {
        rows: "table#tbl_proxy_list > tbody > tr",
        ip: "td:nth-of-type(1) > abbr",
        port: "td:nth-of-type(2) > a",
        protocol: "",
        country: "td:nth-of-type(6) > img@alt",
        anonymity: "",
    }
}

// A decoy text node can precede the address inside the wrapper; the real
// address is the last one.
fn ip(row: &Row<'_>, paths: &ElementPaths) -> String {
    let texts = if row.has(paths.ip) {
        row.all(paths.ip)
    } else {
        row.all("td:nth-of-type(1)")
    };
    let raw = if texts.len() > 1 {
        texts.last()
    } else {
        texts.first()
    };
    pattern::match_first(raw.map(String::as_str).unwrap_or(""), &IP_REGEX)
}

fn port(row: &Row<'_>, paths: &ElementPaths) -> u16 {
    let text = if row.has(paths.port) {
        row.first(paths.port)
    } else {
        row.first("td:nth-of-type(2)")
    };
    pattern::match_port(&text)
}

fn protocol(_row: &Row<'_>, _paths: &ElementPaths) -> String {
    "https".to_string()
}

fn anonymity(_row: &Row<'_>, _paths: &ElementPaths) -> String {
    "elite".to_string()
}

pub fn source() -> Result<Source, ExtractError> {
    let extractor = TableExtractor::new(NAME, paths())?.with_overrides(FieldOverrides {
        ip: Some(ip),
        port: Some(port),
        protocol: Some(protocol),
        anonymity: Some(anonymity),
        ..Default::default()
    });
    Ok(Source::new(NAME, SourceKind::Table(extractor))
        .with_urls(vec![START_URL.to_string()])
        .with_render())
}

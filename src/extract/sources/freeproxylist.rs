//! free-proxy-list.net
//!
//! A plain HTML table. The seventh column is not a protocol name but a
//! yes/no "Https" flag, so the protocol field maps that flag instead of
//! matching protocol tokens:
//!
//! ```html
//! <tr>
//!   <td>154.16.63.16</td>
//!   <td>3129</td>
//!   <td>US</td>
//!   <td class="hm">United States</td>
//!   <td>elite proxy</td>
//!   <td class="hm">no</td>
//!   <td class="hx">no</td>
//!   <td class="hm">21 secs ago</td>
//! </tr>
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use crate::extract::paths::ElementPaths;
use crate::extract::pattern;
use crate::extract::sources::{Source, SourceKind};
use crate::extract::table::{FieldOverrides, Row, TableExtractor};
use crate::extract::ExtractError;

pub const NAME: &str = "freeproxylist";

const START_URL: &str = "https://free-proxy-list.net/";

static YES_NO_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"yes|no").expect("Invalid yes/no regex"));

fn paths() -> ElementPaths {
    ElementPaths {
        rows: "section#list table > tbody > tr",
        ip: "td:nth-of-type(1)",
        port: "td:nth-of-type(2)",
        protocol: "td:nth-of-type(7)",
        country: "td:nth-of-type(3)",
        anonymity: "td:nth-of-type(5)",
    }
}

// The Https flag cell: "yes" means the proxy speaks https, anything else http.
fn protocol(row: &Row<'_>, paths: &ElementPaths) -> String {
    let flag = row.first(paths.protocol).to_lowercase();
    if pattern::match_first(&flag, &YES_NO_REGEX) == "yes" {
        "https".to_string()
    } else {
        "http".to_string()
    }
}

pub fn source() -> Result<Source, ExtractError> {
    let extractor = TableExtractor::new(NAME, paths())?.with_overrides(FieldOverrides {
        protocol: Some(protocol),
        ..Default::default()
    });
    Ok(Source::new(NAME, SourceKind::Table(extractor)).with_urls(vec![START_URL.to_string()]))
}

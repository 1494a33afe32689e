//! spys.one
//!
//! Sits behind an anti-bot challenge and renders its listing with
//! scripts, so both retrieval flags are set. The full listing only comes
//! back after resubmitting the page's filter form together with a hidden
//! session token, which [`follow_up`] harvests from the initial document.
//!
//! Address and port share one cell, with the separator nested in its own
//! `font` element, so only the outer font's direct text nodes carry data:
//!
//! ```html
//! <tr class="spy1x">
//!   <td><font class="spy14">185.10.129.14<font class="spy2">:</font>3128</font></td>
//!   <td><a href="/en/http-proxy-list/"><font class="spy1">HTTP</font></a></td>
//!   <td><a href="/en/anonymous-proxy-list/"><font class="spy1">ANM</font></a></td>
//!   <td><a href="/free-proxy-list/US/"><font class="spy14">United States</font></a></td>
//! </tr>
//! ```
//!
//! The first matched row is the column header styled like a data row.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use crate::extract::paths::ElementPaths;
use crate::extract::pattern::{self, PROTOCOL_REGEX};
use crate::extract::sources::{FormRequest, Source, SourceKind};
use crate::extract::table::{FieldOverrides, Row, TableExtractor};
use crate::extract::ExtractError;

pub const NAME: &str = "spysone";

const START_URL: &str = "https://spys.one/en/anonymous-proxy-list/";

/// Anonymity codes used by the listing
static ANON_CODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"anm|hia|noa").expect("Invalid anonymity code regex"));

fn paths() -> ElementPaths {
    ElementPaths {
        rows: "tr.spy1x, tr.spy1xx",
        ip: "td:nth-of-type(1) > font",
        port: "td:nth-of-type(1) > font",
        protocol: "td:nth-of-type(2) > a > font",
        country: "td:nth-of-type(4) > a@href",
        anonymity: "td:nth-of-type(3) > a > font",
    }
}

// The shared cell reads "ip:port"; the port is the last direct text node.
fn port(row: &Row<'_>, paths: &ElementPaths) -> u16 {
    let texts = row.all(paths.port);
    pattern::match_port(texts.last().map(String::as_str).unwrap_or(""))
}

// Protocol text can split across nodes ("SOCKS5" plus an annotation).
fn protocol(row: &Row<'_>, paths: &ElementPaths) -> String {
    let joined = row.all(paths.protocol).concat().to_lowercase();
    pattern::match_first(&joined, &PROTOCOL_REGEX)
}

fn anonymity(row: &Row<'_>, paths: &ElementPaths) -> String {
    let text = row.first(paths.anonymity).to_lowercase();
    match pattern::match_first(&text, &ANON_CODE_REGEX).as_str() {
        "anm" => "anonymous".to_string(),
        "hia" => "elite".to_string(),
        "noa" => "transparent".to_string(),
        _ => String::new(),
    }
}

/// Resubmit the page's filter form: the hidden session token must be
/// echoed back, xpp=5 asks for the largest page size and xf1=1 keeps
/// anonymous and elite rows.
fn follow_up(document: &Html) -> Option<FormRequest> {
    let token = attr_of(document, "input[name='xx0']", "value")?;
    let action = attr_of(document, "form", "action").unwrap_or_default();
    Some(FormRequest {
        action,
        fields: vec![
            ("xx0".to_string(), token),
            ("xpp".to_string(), "5".to_string()),
            ("xf1".to_string(), "1".to_string()),
            ("xf2".to_string(), "0".to_string()),
            ("xf4".to_string(), "0".to_string()),
            ("xf5".to_string(), "0".to_string()),
        ],
    })
}

fn attr_of(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()?
        .value()
        .attr(attr)
        .map(str::to_string)
}

pub fn source() -> Result<Source, ExtractError> {
    let extractor = TableExtractor::new(NAME, paths())?
        .with_overrides(FieldOverrides {
            port: Some(port),
            protocol: Some(protocol),
            anonymity: Some(anonymity),
            ..Default::default()
        })
        .with_skip_rows(1);
    Ok(Source::new(NAME, SourceKind::Table(extractor))
        .with_urls(vec![START_URL.to_string()])
        .with_render()
        .with_challenge()
        .with_follow_up(follow_up))
}

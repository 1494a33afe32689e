//! Per-field cleaning patterns
//!
//! Every canonical field has one fixed pattern. Raw cell text is matched
//! against it and the first match wins; no match resolves to an empty
//! string. Case folding happens before matching (protocol and anonymity
//! are lowercased, country is uppercased), never inside the patterns.
//!
//! The patterns are deliberately permissive: the IP pattern only counts
//! digits per octet and the port pattern accepts any run of up to five
//! digits, with the u16 conversion as the only upper bound.

use once_cell::sync::Lazy;
use regex::Regex;

/// Dotted-quad IPv4 literal
pub static IP_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}").expect("Invalid IP regex"));

/// Port digits
pub static PORT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,5}").expect("Invalid port regex"));

/// Known protocol tokens, matched against lowercased input
pub static PROTOCOL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"http|https|socks4|socks5").expect("Invalid protocol regex"));

/// Two-letter country code, matched against uppercased input
pub static COUNTRY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Z]{2}").expect("Invalid country regex"));

/// Anonymity level tokens, matched against lowercased input
pub static ANONYMITY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"transparent|anonymous|elite").expect("Invalid anonymity regex"));

/// Return the first match of `regex` in `text`, or an empty string when
/// there is none. A miss is a normal outcome, never an error.
pub fn match_first(text: &str, regex: &Regex) -> String {
    regex
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Extract a port number from raw cell text. Returns 0 when the text has
/// no digits or the digits do not fit in a port number.
pub fn match_port(text: &str) -> u16 {
    match_first(text, &PORT_REGEX).parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ip_extracted_from_surrounding_noise() {
        assert_eq!(
            match_first("document.write('185.178.47.135')", &IP_REGEX),
            "185.178.47.135"
        );
        assert_eq!(
            match_first("...111.222.111.222...", &IP_REGEX),
            "111.222.111.222"
        );
        assert_eq!(match_first("no address here", &IP_REGEX), "");
    }

    #[test]
    fn test_ip_pattern_only_counts_digits() {
        // octet range is not validated, only digit counts
        assert_eq!(match_first("999.1.1.1", &IP_REGEX), "999.1.1.1");
        assert_eq!(match_first("1234.1.1.1", &IP_REGEX), "234.1.1.1");
    }

    #[test]
    fn test_port_conversion_bounds() {
        assert_eq!(match_port("8060"), 8060);
        assert_eq!(match_port(""), 0);
        assert_eq!(match_port("n/a"), 0);
        // five digits that overflow u16 fall back to 0
        assert_eq!(match_port("99999"), 0);
        assert_eq!(match_port("65535"), 65535);
    }

    #[test]
    fn test_protocol_tokens() {
        assert_eq!(match_first(&"SOCKS5".to_lowercase(), &PROTOCOL_REGEX), "socks5");
        assert_eq!(match_first(&"ftp".to_lowercase(), &PROTOCOL_REGEX), "");
        assert_eq!(match_first("socks4", &PROTOCOL_REGEX), "socks4");
        // leftmost alternative wins on https text
        assert_eq!(match_first("https", &PROTOCOL_REGEX), "http");
    }

    #[test]
    fn test_country_wants_uppercase() {
        assert_eq!(match_first(&"us".to_uppercase(), &COUNTRY_REGEX), "US");
        assert_eq!(match_first("us", &COUNTRY_REGEX), "");
        assert_eq!(match_first("United States (US)", &COUNTRY_REGEX), "US");
        // folding first changes which pair wins
        assert_eq!(
            match_first(&"United States (US)".to_uppercase(), &COUNTRY_REGEX),
            "UN"
        );
    }

    #[test]
    fn test_anonymity_tokens() {
        assert_eq!(match_first("elite proxy", &ANONYMITY_REGEX), "elite");
        assert_eq!(match_first("transparent", &ANONYMITY_REGEX), "transparent");
        assert_eq!(match_first("unknown", &ANONYMITY_REGEX), "");
    }
}

//! Shared row-to-record extraction contract
//!
//! A [`TableExtractor`] owns one source's compiled element paths and walks
//! the repeated row elements of a parsed document, producing one
//! [`ProxyRecord`] per row. The defaults cover the common case: query the
//! configured path, fold case, apply the field pattern, first match wins.
//! Sources with quirky markup override individual fields through
//! [`FieldOverrides`] and keep the defaults for everything else.

use scraper::{ElementRef, Html};
use tracing::{debug, warn};

use crate::extract::paths::{ElementPaths, FieldQuery};
use crate::extract::pattern::{self, ANONYMITY_REGEX, COUNTRY_REGEX, IP_REGEX, PROTOCOL_REGEX};
use crate::extract::record::ProxyRecord;
use crate::extract::ExtractError;

/// Signature of a per-field override. Receives the row and the source's
/// configured path map; returns the final field value.
pub type FieldFn = fn(&Row<'_>, &ElementPaths) -> String;

/// Port override; returns the final port number.
pub type PortFn = fn(&Row<'_>, &ElementPaths) -> u16;

/// Per-field override table. Entries left `None` fall through to the
/// shared default extraction for that field.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldOverrides {
    pub ip: Option<FieldFn>,
    pub port: Option<PortFn>,
    pub protocol: Option<FieldFn>,
    pub country: Option<FieldFn>,
    pub anonymity: Option<FieldFn>,
}

/// One located row of a source document.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    element: ElementRef<'a>,
}

impl<'a> Row<'a> {
    pub fn new(element: ElementRef<'a>) -> Self {
        Self { element }
    }

    /// First textual result of a compiled query, or empty on a miss.
    pub fn get(&self, query: &FieldQuery) -> String {
        self.lookup(query).into_iter().next().unwrap_or_default()
    }

    /// Compile-and-run a query string for its first result. Override code
    /// uses this for ad-hoc probes; a query that fails to compile yields
    /// an empty result.
    pub fn first(&self, query: &str) -> String {
        self.all(query).into_iter().next().unwrap_or_default()
    }

    /// Compile-and-run a query string for all results.
    pub fn all(&self, query: &str) -> Vec<String> {
        match FieldQuery::parse(query) {
            Ok(compiled) => self.lookup(&compiled),
            Err(error) => {
                warn!("unusable field query: {}", error);
                Vec::new()
            }
        }
    }

    /// Whether the query matches at least one element inside this row.
    pub fn has(&self, query: &str) -> bool {
        match FieldQuery::parse(query) {
            Ok(compiled) => self.element.select(compiled.selector()).next().is_some(),
            Err(_) => false,
        }
    }

    // Every field read funnels through here.
    fn lookup(&self, query: &FieldQuery) -> Vec<String> {
        let values: Vec<String> = match query.attr() {
            Some(attr) => self
                .element
                .select(query.selector())
                .filter_map(|element| element.value().attr(attr).map(|v| v.trim().to_string()))
                .collect(),
            None => self
                .element
                .select(query.selector())
                .flat_map(direct_text)
                .collect(),
        };
        debug!("query {} matched {:?}", query, values);
        values
    }
}

/// Direct child text nodes of an element, trimmed, empties dropped. Text
/// inside nested elements (links, decoy scripts) is not included.
fn direct_text(element: ElementRef<'_>) -> Vec<String> {
    element
        .children()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect()
}

/// Walks the row elements of a document and turns each one into a record.
///
/// Built once per source and immutable afterwards; compiling the path map
/// up front means a bad configuration fails at startup instead of deep in
/// a crawl.
#[derive(Debug, Clone)]
pub struct TableExtractor {
    source: &'static str,
    paths: ElementPaths,
    rows: FieldQuery,
    ip: FieldQuery,
    port: FieldQuery,
    protocol: Option<FieldQuery>,
    country: Option<FieldQuery>,
    anonymity: Option<FieldQuery>,
    overrides: FieldOverrides,
    skip_rows: usize,
}

impl TableExtractor {
    /// Build an extractor for `source` from its element path map. The
    /// `rows`, `ip` and `port` paths are mandatory and every non-empty
    /// path must compile.
    pub fn new(source: &'static str, paths: ElementPaths) -> Result<Self, ExtractError> {
        let rows = required(paths.rows, "rows")?;
        let ip = required(paths.ip, "ip")?;
        let port = required(paths.port, "port")?;
        let protocol = optional(paths.protocol)?;
        let country = optional(paths.country)?;
        let anonymity = optional(paths.anonymity)?;
        Ok(Self {
            source,
            paths,
            rows,
            ip,
            port,
            protocol,
            country,
            anonymity,
            overrides: FieldOverrides::default(),
            skip_rows: 0,
        })
    }

    /// Set the per-field override table
    pub fn with_overrides(mut self, overrides: FieldOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Drop the first `count` located rows (header rows styled like data rows)
    pub fn with_skip_rows(mut self, count: usize) -> Self {
        self.skip_rows = count;
        self
    }

    /// Locate the row elements of `document` in document order, with any
    /// configured leading rows dropped.
    pub fn locate_rows<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        document
            .select(self.rows.selector())
            .skip(self.skip_rows)
            .collect()
    }

    /// Stream one record per located row. The iterator is lazy and single
    /// pass; call [`TableExtractor::process`] again to re-extract from the
    /// same document.
    pub fn process<'a>(&'a self, document: &'a Html) -> Records<'a> {
        let rows = self.locate_rows(document);
        debug!("{}: located {} rows", self.source, rows.len());
        Records {
            rows: rows.into_iter(),
            extractor: self,
        }
    }

    fn record(&self, row: &Row<'_>) -> ProxyRecord {
        ProxyRecord {
            ip: match self.overrides.ip {
                Some(field) => field(row, &self.paths),
                None => self.extract_ip(row),
            },
            port: match self.overrides.port {
                Some(field) => field(row, &self.paths),
                None => self.extract_port(row),
            },
            protocol: match self.overrides.protocol {
                Some(field) => field(row, &self.paths),
                None => self.extract_protocol(row),
            },
            country: match self.overrides.country {
                Some(field) => field(row, &self.paths),
                None => self.extract_country(row),
            },
            anonymity: match self.overrides.anonymity {
                Some(field) => field(row, &self.paths),
                None => self.extract_anonymity(row),
            },
            source: self.source.to_string(),
        }
    }

    fn extract_ip(&self, row: &Row<'_>) -> String {
        pattern::match_first(&row.get(&self.ip), &IP_REGEX)
    }

    fn extract_port(&self, row: &Row<'_>) -> u16 {
        pattern::match_port(&row.get(&self.port))
    }

    fn extract_protocol(&self, row: &Row<'_>) -> String {
        match &self.protocol {
            Some(query) => pattern::match_first(&row.get(query).to_lowercase(), &PROTOCOL_REGEX),
            None => String::new(),
        }
    }

    fn extract_country(&self, row: &Row<'_>) -> String {
        match &self.country {
            Some(query) => pattern::match_first(&row.get(query).to_uppercase(), &COUNTRY_REGEX),
            None => String::new(),
        }
    }

    fn extract_anonymity(&self, row: &Row<'_>) -> String {
        match &self.anonymity {
            Some(query) => pattern::match_first(&row.get(query).to_lowercase(), &ANONYMITY_REGEX),
            None => String::new(),
        }
    }
}

fn required(query: &'static str, field: &'static str) -> Result<FieldQuery, ExtractError> {
    if query.is_empty() {
        return Err(ExtractError::MissingPath(field));
    }
    FieldQuery::parse(query)
}

fn optional(query: &'static str) -> Result<Option<FieldQuery>, ExtractError> {
    if query.is_empty() {
        return Ok(None);
    }
    FieldQuery::parse(query).map(Some)
}

/// Lazy record stream over the rows of one document.
pub struct Records<'a> {
    rows: std::vec::IntoIter<ElementRef<'a>>,
    extractor: &'a TableExtractor,
}

impl<'a> Iterator for Records<'a> {
    type Item = ProxyRecord;

    fn next(&mut self) -> Option<ProxyRecord> {
        let element = self.rows.next()?;
        Some(self.extractor.record(&Row::new(element)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl<'a> ExactSizeIterator for Records<'a> {}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
        <html><body>
        <table id="proxies"><tbody>
        <tr><td>154.16.63.16</td><td>3129</td><td>socks4</td><td>us</td><td>Elite proxy</td></tr>
        <tr><td>91.209.11.131</td><td>80</td><td>http</td><td>ru</td><td>transparent</td></tr>
        <tr><td>bad row</td></tr>
        </tbody></table>
        </body></html>
    "#;

    fn fixture_paths() -> ElementPaths {
        ElementPaths {
            rows: "table#proxies > tbody > tr",
            ip: "td:nth-of-type(1)",
            port: "td:nth-of-type(2)",
            protocol: "td:nth-of-type(3)",
            country: "td:nth-of-type(4)",
            anonymity: "td:nth-of-type(5)",
        }
    }

    fn fixture_extractor() -> TableExtractor {
        TableExtractor::new("fixture", fixture_paths()).unwrap()
    }

    #[test]
    fn test_one_record_per_row_in_document_order() {
        let document = Html::parse_document(FIXTURE);
        let extractor = fixture_extractor();
        let records: Vec<_> = extractor.process(&document).collect();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].ip, "154.16.63.16");
        assert_eq!(records[0].port, 3129);
        assert_eq!(records[0].protocol, "socks4");
        assert_eq!(records[0].country, "US");
        assert_eq!(records[0].anonymity, "elite");
        assert_eq!(records[0].source, "fixture");
        assert_eq!(records[1].ip, "91.209.11.131");
        assert_eq!(records[1].port, 80);
    }

    #[test]
    fn test_missing_cells_leave_defaults_but_emit_the_record() {
        let document = Html::parse_document(FIXTURE);
        let extractor = fixture_extractor();
        let records: Vec<_> = extractor.process(&document).collect();

        let partial = &records[2];
        assert_eq!(partial.ip, "");
        assert_eq!(partial.port, 0);
        assert_eq!(partial.protocol, "");
        assert_eq!(partial.country, "");
        assert_eq!(partial.anonymity, "");
        assert_eq!(partial.source, "fixture");
    }

    #[test]
    fn test_empty_optional_path_short_circuits_to_empty() {
        let document = Html::parse_document(FIXTURE);
        let mut paths = fixture_paths();
        paths.protocol = "";
        paths.anonymity = "";
        let extractor = TableExtractor::new("fixture", paths).unwrap();
        let records: Vec<_> = extractor.process(&document).collect();

        // cells hold matchable text but the paths are not configured
        assert_eq!(records[0].protocol, "");
        assert_eq!(records[0].anonymity, "");
        assert_eq!(records[0].ip, "154.16.63.16");
    }

    #[test]
    fn test_skip_rows_drops_leading_rows() {
        let document = Html::parse_document(FIXTURE);
        let extractor = fixture_extractor().with_skip_rows(1);
        let records: Vec<_> = extractor.process(&document).collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].ip, "91.209.11.131");
    }

    #[test]
    fn test_reprocessing_the_same_document_is_identical() {
        let document = Html::parse_document(FIXTURE);
        let extractor = fixture_extractor();
        let first: Vec<_> = extractor.process(&document).collect();
        let second: Vec<_> = extractor.process(&document).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_matching_rows_yields_no_records() {
        let document = Html::parse_document(FIXTURE);
        let mut paths = fixture_paths();
        paths.rows = "table#absent > tbody > tr";
        let extractor = TableExtractor::new("fixture", paths).unwrap();
        let mut records = extractor.process(&document);
        assert_eq!(records.len(), 0);
        assert!(records.next().is_none());
    }

    #[test]
    fn test_attribute_query_reads_the_attribute() {
        let html = r#"
            <table id="proxies"><tbody>
            <tr><td>1.2.3.4</td><td>80</td><td>-</td>
                <td><img src="/flags/au.png" alt="au"></td><td>-</td></tr>
            </tbody></table>
        "#;
        let document = Html::parse_document(html);
        let mut paths = fixture_paths();
        paths.country = "td:nth-of-type(4) img@alt";
        let extractor = TableExtractor::new("fixture", paths).unwrap();
        let records: Vec<_> = extractor.process(&document).collect();
        assert_eq!(records[0].country, "AU");
    }

    #[test]
    fn test_nested_element_text_is_not_direct_text() {
        let html = r#"
            <table id="proxies"><tbody>
            <tr><td><script>document.write('9.9.9.9')</script>185.178.47.135</td>
                <td>8080</td></tr>
            </tbody></table>
        "#;
        let document = Html::parse_document(html);
        let extractor = fixture_extractor();
        let records: Vec<_> = extractor.process(&document).collect();
        assert_eq!(records[0].ip, "185.178.47.135");
    }

    #[test]
    fn test_override_replaces_the_default() {
        fn fixed_protocol(_row: &Row<'_>, _paths: &ElementPaths) -> String {
            "https".to_string()
        }

        let document = Html::parse_document(FIXTURE);
        let extractor = fixture_extractor().with_overrides(FieldOverrides {
            protocol: Some(fixed_protocol),
            ..Default::default()
        });
        let records: Vec<_> = extractor.process(&document).collect();

        // the cell says socks4; the override wins
        assert_eq!(records[0].protocol, "https");
        assert_eq!(records[0].ip, "154.16.63.16");
    }

    #[test]
    fn test_missing_required_path_is_refused() {
        let mut paths = fixture_paths();
        paths.rows = "";
        assert!(matches!(
            TableExtractor::new("fixture", paths),
            Err(ExtractError::MissingPath("rows"))
        ));

        let mut paths = fixture_paths();
        paths.ip = "";
        assert!(matches!(
            TableExtractor::new("fixture", paths),
            Err(ExtractError::MissingPath("ip"))
        ));
    }

    #[test]
    fn test_unparseable_path_is_refused() {
        let mut paths = fixture_paths();
        paths.port = "td[[";
        assert!(matches!(
            TableExtractor::new("fixture", paths),
            Err(ExtractError::BadQuery(_))
        ));
    }

    #[test]
    fn test_row_probes_and_ad_hoc_queries() {
        let document = Html::parse_document(FIXTURE);
        let extractor = fixture_extractor();
        let rows = extractor.locate_rows(&document);
        let row = Row::new(rows[0]);

        assert!(row.has("td"));
        assert!(!row.has("abbr"));
        assert_eq!(row.first("td:nth-of-type(2)"), "3129");
        assert_eq!(row.all("td").len(), 5);
        // an unusable query yields nothing rather than failing
        assert_eq!(row.first("td[["), "");
        assert!(!row.has("td[["));
    }
}

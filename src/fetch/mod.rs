//! Document retrieval
//!
//! Fetches each source's documents over HTTP, runs the optional
//! challenge pre-step and any follow-up form submission the source
//! declares, then hands bodies to the source's parser. Scheduling,
//! retries and politeness are left to callers.

pub mod agents;
pub mod context;
pub mod solver;

pub use context::{Cookie, RequestContext};
pub use solver::{Solution, Solver};

use std::path::PathBuf;
use std::time::Duration;

use futures::{stream, StreamExt};
use reqwest::header;
use scraper::Html;
use tracing::{info, warn};
use url::Url;

use crate::extract::sources::{FormRequest, Source, SourceKind};
use crate::extract::table::TableExtractor;
use crate::extract::{ExtractError, ProxyRecord};
use crate::Result;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONCURRENCY: usize = 4;

/// Configuration for document retrieval
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Timeout for plain HTTP requests
    pub timeout: Duration,
    /// Fixed user agent; a random one is drawn per fetcher when unset
    pub user_agent: Option<String>,
    /// Challenge-solving service endpoint; challenge and render sources
    /// degrade to raw fetches without one
    pub solver_url: Option<String>,
    /// How many sources run at once
    pub concurrency: usize,
    /// When set, write each source's raw body here instead of extracting
    pub dump_dir: Option<PathBuf>,
}

impl FetchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a fixed user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the challenge-solving service endpoint
    pub fn with_solver_url(mut self, url: impl Into<String>) -> Self {
        self.solver_url = Some(url.into());
        self
    }

    /// Set how many sources run at once
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Dump raw bodies to a directory instead of extracting
    pub fn with_dump_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dump_dir = Some(dir.into());
        self
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: None,
            solver_url: None,
            concurrency: DEFAULT_CONCURRENCY,
            dump_dir: None,
        }
    }
}

/// Outcome of one source's run.
#[derive(Debug, Clone)]
pub struct HarvestResult {
    pub source: String,
    pub records: Vec<ProxyRecord>,
    pub error: Option<String>,
}

impl HarvestResult {
    pub fn success(source: impl Into<String>, records: Vec<ProxyRecord>) -> Self {
        Self {
            source: source.into(),
            records,
            error: None,
        }
    }

    pub fn failure(source: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            records: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// HTTP fetcher honoring per-source request contexts.
pub struct Fetcher {
    config: FetchConfig,
    client: reqwest::Client,
    solver: Option<Solver>,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        Self::with_config(FetchConfig::new())
    }

    pub fn with_config(config: FetchConfig) -> Result<Self> {
        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| agents::random().to_string());
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(user_agent)
            .cookie_store(true)
            .build()?;
        let solver = match &config.solver_url {
            Some(endpoint) => Some(Solver::new(endpoint.clone())?),
            None => None,
        };
        Ok(Self {
            config,
            client,
            solver,
        })
    }

    /// Plain GET returning the body, with the context's session state applied.
    pub async fn get(&self, url: &str, context: &RequestContext) -> Result<String> {
        let mut request = self.client.get(url);
        if let Some(user_agent) = context.user_agent() {
            request = request.header(header::USER_AGENT, user_agent);
        }
        if !context.cookies().is_empty() {
            request = request.header(header::COOKIE, context.cookie_header());
        }
        Ok(request.send().await?.text().await?)
    }

    /// POST a urlencoded form, with the context's session state applied.
    pub async fn post_form(
        &self,
        url: &str,
        fields: &[(String, String)],
        context: &RequestContext,
    ) -> Result<String> {
        let mut request = self.client.post(url).form(fields);
        if let Some(user_agent) = context.user_agent() {
            request = request.header(header::USER_AGENT, user_agent);
        }
        if !context.cookies().is_empty() {
            request = request.header(header::COOKIE, context.cookie_header());
        }
        Ok(request.send().await?.text().await?)
    }

    /// Run one source end to end: challenge pre-step, one fetch per start
    /// URL with any follow-up form submission, then parsing. Records come
    /// back in URL order; a single failing URL is logged and skipped.
    pub async fn run_source(&self, source: &Source) -> Result<Vec<ProxyRecord>> {
        if source.urls.is_empty() {
            return Err(ExtractError::NoStartUrl(source.name).into());
        }

        let mut context = RequestContext::new();
        if source.challenge {
            context = self.challenge_context(source).await;
        }

        let mut records = Vec::new();
        for url in &source.urls {
            match self.harvest_url(source, url, &context).await {
                Ok(batch) => records.extend(batch),
                Err(error) => warn!("{}: {} failed: {}", source.name, url, error),
            }
        }
        Ok(records)
    }

    /// Run many sources concurrently, one result per source, in
    /// completion order.
    pub async fn run_sources(&self, sources: Vec<Source>) -> Vec<HarvestResult> {
        stream::iter(sources)
            .map(|source| async move {
                match self.run_source(&source).await {
                    Ok(records) => {
                        info!("{}: {} records", source.name, records.len());
                        HarvestResult::success(source.name, records)
                    }
                    Err(error) => HarvestResult::failure(source.name, error.to_string()),
                }
            })
            .buffer_unordered(self.config.concurrency)
            .collect()
            .await
    }

    // Solve the challenge against the first start URL; the solved session
    // state carries over to every later request of the run. Solve failures
    // degrade to a fresh context rather than aborting the source.
    async fn challenge_context(&self, source: &Source) -> RequestContext {
        let Some(solver) = &self.solver else {
            warn!(
                "{}: expects a challenge solve but no solver is configured",
                source.name
            );
            return RequestContext::new();
        };
        match solver.solve(&source.urls[0]).await {
            Ok(solution) => {
                info!(
                    "{}: challenge solved, carrying {} cookies",
                    source.name,
                    solution.cookies.len()
                );
                solution.context()
            }
            Err(error) => {
                warn!("{}: challenge solve failed: {}", source.name, error);
                RequestContext::new()
            }
        }
    }

    // Fetch one document. Render sources go through the solving service's
    // managed browser when one is configured.
    async fn document(
        &self,
        source: &Source,
        url: &str,
        context: &RequestContext,
    ) -> Result<String> {
        if source.render {
            if let Some(solver) = &self.solver {
                return Ok(solver.solve(url).await?.response);
            }
            warn!(
                "{}: needs a rendered document but no solver is configured, using a raw fetch",
                source.name
            );
        }
        self.get(url, context).await
    }

    async fn harvest_url(
        &self,
        source: &Source,
        url: &str,
        context: &RequestContext,
    ) -> Result<Vec<ProxyRecord>> {
        let mut body = self.document(source, url, context).await?;

        if let Some(harvest) = source.follow_up {
            let Some(form) = harvest_form(harvest, &body) else {
                warn!(
                    "{}: follow-up form not found in the initial document",
                    source.name
                );
                return Ok(Vec::new());
            };
            let action = Url::parse(url)?.join(&form.action)?;
            body = self.post_form(action.as_str(), &form.fields, context).await?;
        }

        if let Some(dir) = &self.config.dump_dir {
            std::fs::create_dir_all(dir)?;
            let path = dir.join(format!("{}.html", source.name));
            std::fs::write(&path, &body)?;
            info!("{}: wrote raw body to {}", source.name, path.display());
            return Ok(Vec::new());
        }

        parse_body(source, &body, url)
    }
}

// The parsed DOM stays inside these sync helpers so futures never hold it
// across an await.
fn harvest_form(harvest: fn(&Html) -> Option<FormRequest>, body: &str) -> Option<FormRequest> {
    let document = Html::parse_document(body);
    harvest(&document)
}

fn parse_table(extractor: &TableExtractor, body: &str) -> Vec<ProxyRecord> {
    let document = Html::parse_document(body);
    extractor.process(&document).collect()
}

fn parse_body(source: &Source, body: &str, url: &str) -> Result<Vec<ProxyRecord>> {
    match &source.kind {
        SourceKind::Table(extractor) => Ok(parse_table(extractor, body)),
        SourceKind::Text(parse) => Ok(parse(body, &Url::parse(url)?)),
        SourceKind::Json(parse) => parse(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = FetchConfig::new();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.concurrency, 4);
        assert!(config.user_agent.is_none());
        assert!(config.solver_url.is_none());
        assert!(config.dump_dir.is_none());
    }

    #[test]
    fn test_config_builders() {
        let config = FetchConfig::new()
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("test-agent")
            .with_solver_url("http://localhost:8191/v1")
            .with_concurrency(2);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, Some("test-agent".to_string()));
        assert_eq!(config.solver_url, Some("http://localhost:8191/v1".to_string()));
        assert_eq!(config.concurrency, 2);
    }

    #[test]
    fn test_harvest_result_constructors() {
        let ok = HarvestResult::success("geonode", vec![ProxyRecord::default()]);
        assert!(ok.is_success());
        assert_eq!(ok.records.len(), 1);

        let failed = HarvestResult::failure("spysone", "connection refused");
        assert!(!failed.is_success());
        assert!(failed.records.is_empty());
        assert_eq!(failed.error.as_deref(), Some("connection refused"));
    }

    #[tokio::test]
    async fn test_running_a_source_without_urls_is_an_error() {
        let source = Source::new("empty", SourceKind::Text(|_, _| Vec::new()));
        let fetcher = Fetcher::new().unwrap();
        let error = fetcher.run_source(&source).await.unwrap_err();
        assert!(error.to_string().contains("no start URL"));
    }

    #[test]
    fn test_parse_body_dispatches_on_kind() {
        let source = crate::extract::sources::proxyscrape::source();
        let records = parse_body(
            &source,
            "1.2.3.4:80\n",
            "https://api.proxyscrape.com/v2/?request=displayproxies&protocol=http&ssl=no&anonymity=elite",
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].protocol, "http");
    }
}

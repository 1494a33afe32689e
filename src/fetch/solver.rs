//! Challenge-solving collaborator
//!
//! Client for a FlareSolverr-compatible service: POST a `request.get`
//! command, get back the rendered page body plus the cookies and user
//! agent that cleared the challenge. Later plain requests reuse that
//! session state through a [`RequestContext`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fetch::context::{Cookie, RequestContext};
use crate::Result;

/// Solves wait out the service's own managed browser startup
const SOLVE_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Serialize)]
struct SolveRequest<'a> {
    cmd: &'a str,
    url: &'a str,
}

/// Service reply envelope
#[derive(Debug, Deserialize)]
pub struct SolveResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    pub solution: Option<Solution>,
}

/// The solved page: its rendered body plus the session state that
/// cleared the challenge.
#[derive(Debug, Clone, Deserialize)]
pub struct Solution {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub cookies: Vec<Cookie>,
    #[serde(default, rename = "userAgent")]
    pub user_agent: String,
}

impl Solution {
    /// Request context carrying the solved session state.
    pub fn context(&self) -> RequestContext {
        let mut context = RequestContext::new().with_cookies(self.cookies.clone());
        if !self.user_agent.is_empty() {
            context = context.with_user_agent(self.user_agent.clone());
        }
        context
    }
}

/// Client for one solving service endpoint.
#[derive(Debug, Clone)]
pub struct Solver {
    endpoint: String,
    client: reqwest::Client,
}

impl Solver {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(SOLVE_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    /// Ask the service to fetch `url` through its managed browser.
    pub async fn solve(&self, url: &str) -> Result<Solution> {
        debug!("requesting challenge solve for {}", url);
        let reply: SolveResponse = self
            .client
            .post(&self.endpoint)
            .json(&SolveRequest {
                cmd: "request.get",
                url,
            })
            .send()
            .await?
            .json()
            .await?;
        match reply.solution {
            Some(solution) => Ok(solution),
            None => Err(anyhow::anyhow!(
                "solver returned no solution: {} {}",
                reply.status,
                reply.message
            )),
        }
    }
}

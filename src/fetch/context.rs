//! Request context threaded through multi-step retrievals

use serde::{Deserialize, Serialize};

/// Cookie carried between retrieval steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// Per-source request state: the user agent and cookies every request in
/// a source's run must carry.
///
/// A context is never mutated in place. A pre-step that changes the state
/// (a challenge solve, say) builds a fresh value and later steps read
/// from that.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    user_agent: Option<String>,
    cookies: Vec<Cookie>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context carrying the given user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Context carrying the given cookies
    pub fn with_cookies(mut self, cookies: Vec<Cookie>) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    /// `Cookie` header value for the carried cookies, empty when there
    /// are none.
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|cookie| format!("{}={}", cookie.name, cookie.value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

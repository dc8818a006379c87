//! Ambient credential resolution.

use reqwest::RequestBuilder;
use tracing::warn;

/// Bearer token presented to the agent service.
pub const ACCESS_TOKEN_VAR: &str = "PROJECT_ACCESS_TOKEN";
/// API key presented to the agent service when no token is set.
pub const API_KEY_VAR: &str = "PROJECT_API_KEY";

/// How requests authenticate against the agent service.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// `Authorization: Bearer <token>`.
    Bearer(String),
    /// `api-key: <key>`.
    ApiKey(String),
    /// No credential; the service decides whether to accept the call.
    Anonymous,
}

impl Credential {
    /// Resolves the credential from the process environment.
    ///
    /// [`ACCESS_TOKEN_VAR`] wins over [`API_KEY_VAR`]. With neither set the
    /// credential is [`Credential::Anonymous`] and a warning is logged.
    pub fn from_environment() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves the credential through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v: &String| !v.trim().is_empty());

        if let Some(token) = non_empty(ACCESS_TOKEN_VAR) {
            Self::Bearer(token)
        } else if let Some(key) = non_empty(API_KEY_VAR) {
            Self::ApiKey(key)
        } else {
            warn!(
                "neither {ACCESS_TOKEN_VAR} nor {API_KEY_VAR} is set; calling the agent service anonymously"
            );
            Self::Anonymous
        }
    }

    pub(crate) fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Self::Bearer(token) => request.bearer_auth(token),
            Self::ApiKey(key) => request.header("api-key", key),
            Self::Anonymous => request,
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Self::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Self::Anonymous => f.write_str("Anonymous"),
        }
    }
}

//! [`AgentsService`] over HTTPS.

use std::time::Duration;

use agents::{
    Agent, AgentDefinition, AgentId, AgentsError, AgentsService, Connection, ConnectionName,
    MessageRole, Run, RunId, RunStep, Thread, ThreadId, ThreadMessage,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::RETRY_AFTER;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, field, info_span, Instrument, Span};
use uuid::Uuid;

use crate::credential::Credential;
use crate::wire::{CreateMessageRequest, CreateRunRequest, ErrorEnvelope, Page, TelemetryResponse};

/// API version sent with every request unless overridden.
pub const DEFAULT_API_VERSION: &str = "v1";

/// Overrides [`DEFAULT_API_VERSION`] when set.
pub const API_VERSION_VAR: &str = "PROJECT_API_VERSION";

/// Correlates a request with service-side logs.
const REQUEST_ID_HEADER: &str = "x-client-request-id";

/// Transport settings for [`HttpAgentsClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Value of the `api-version` query parameter.
    pub api_version: String,
    /// Upper bound on a single request, including reading the body.
    pub request_timeout: Duration,
    /// Items requested per page from list endpoints.
    pub page_size: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.to_string(),
            request_timeout: Duration::from_secs(60),
            page_size: 100,
        }
    }
}

/// Client handle for one agent service project.
///
/// The handle owns its connection pool; dropping it releases the pool.
pub struct HttpAgentsClient {
    http: reqwest::Client,
    base_url: String,
    credential: Credential,
    options: ClientOptions,
}

impl HttpAgentsClient {
    /// Opens a client for `endpoint` with default [`ClientOptions`].
    pub fn new(endpoint: &str, credential: Credential) -> Result<Self, AgentsError> {
        Self::with_options(endpoint, credential, ClientOptions::default())
    }

    pub fn with_options(
        endpoint: &str,
        credential: Credential,
        options: ClientOptions,
    ) -> Result<Self, AgentsError> {
        let base_url = endpoint.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(AgentsError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: "expected an http:// or https:// URL".into(),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .user_agent(concat!("browser-agent-demo/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(transport)?;

        debug!(endpoint = %base_url, credential = ?credential, api_version = %options.api_version, "agent service client opened");
        Ok(Self {
            http,
            base_url,
            credential,
            options,
        })
    }

    /// Base URL every request path is appended to.
    pub fn endpoint(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .query(&[("api-version", self.options.api_version.as_str())])
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());
        self.credential.apply(request)
    }

    /// Sends `request` and decodes a successful JSON body.
    ///
    /// `resource` names what was addressed; it labels errors and the span.
    async fn call<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &str,
    ) -> Result<T, AgentsError> {
        let span = info_span!(
            "agents.request",
            resource = resource,
            http.response.status_code = field::Empty,
        );

        async {
            let response = request.send().await.map_err(transport)?;
            let status = response.status();
            Span::current().record("http.response.status_code", status.as_u16());

            if !status.is_success() {
                return Err(error_from_response(response, resource).await);
            }

            let body = response.bytes().await.map_err(transport)?;
            serde_json::from_slice(&body).map_err(|e| AgentsError::InvalidResponse {
                message: format!("{resource}: {e}"),
            })
        }
        .instrument(span)
        .await
    }

    async fn page<T: DeserializeOwned>(
        &self,
        path: &str,
        order: &str,
        after: Option<&str>,
        resource: &str,
    ) -> Result<Page<T>, AgentsError> {
        let limit = self.options.page_size.to_string();
        let mut request = self
            .request(Method::GET, path)
            .query(&[("order", order), ("limit", limit.as_str())]);
        if let Some(after) = after {
            request = request.query(&[("after", after)]);
        }
        self.call(request, resource).await
    }
}

impl Drop for HttpAgentsClient {
    fn drop(&mut self) {
        debug!(endpoint = %self.base_url, "agent service client released");
    }
}

#[async_trait]
impl AgentsService for HttpAgentsClient {
    async fn get_connection(&self, name: &ConnectionName) -> Result<Connection, AgentsError> {
        let path = format!("/connections/{}", segment(name.as_str()));
        self.call(self.request(Method::GET, &path), &format!("connection '{name}'"))
            .await
    }

    async fn telemetry_connection_string(&self) -> Result<Option<String>, AgentsError> {
        let request = self.request(Method::GET, "/telemetry/connection-string");
        match self
            .call::<TelemetryResponse>(request, "telemetry connection string")
            .await
        {
            Ok(response) => Ok(response
                .connection_string
                .filter(|s| !s.trim().is_empty())),
            Err(AgentsError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn create_agent(&self, definition: &AgentDefinition) -> Result<Agent, AgentsError> {
        let request = self.request(Method::POST, "/assistants").json(definition);
        self.call(request, "agent").await
    }

    async fn create_thread(&self) -> Result<Thread, AgentsError> {
        let request = self.request(Method::POST, "/threads").json(&json!({}));
        self.call(request, "thread").await
    }

    async fn create_message(
        &self,
        thread_id: &ThreadId,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage, AgentsError> {
        let path = format!("/threads/{}/messages", segment(thread_id.as_str()));
        let request = self
            .request(Method::POST, &path)
            .json(&CreateMessageRequest { role, content });
        self.call(request, &format!("thread '{thread_id}'")).await
    }

    async fn create_run(
        &self,
        thread_id: &ThreadId,
        agent_id: &AgentId,
    ) -> Result<Run, AgentsError> {
        let path = format!("/threads/{}/runs", segment(thread_id.as_str()));
        let request = self.request(Method::POST, &path).json(&CreateRunRequest {
            assistant_id: agent_id,
        });
        self.call(request, &format!("thread '{thread_id}'")).await
    }

    async fn get_run(&self, thread_id: &ThreadId, run_id: &RunId) -> Result<Run, AgentsError> {
        let path = run_path(thread_id, run_id);
        self.call(self.request(Method::GET, &path), &format!("run '{run_id}'"))
            .await
    }

    async fn cancel_run(&self, thread_id: &ThreadId, run_id: &RunId) -> Result<Run, AgentsError> {
        let path = format!("{}/cancel", run_path(thread_id, run_id));
        self.call(self.request(Method::POST, &path), &format!("run '{run_id}'"))
            .await
    }

    async fn list_run_steps(
        &self,
        thread_id: &ThreadId,
        run_id: &RunId,
    ) -> Result<Vec<RunStep>, AgentsError> {
        let path = format!("{}/steps", run_path(thread_id, run_id));
        let resource = format!("steps of run '{run_id}'");

        let mut steps = Vec::new();
        let mut after: Option<String> = None;
        loop {
            let page: Page<RunStep> = self.page(&path, "asc", after.as_deref(), &resource).await?;
            let next = next_cursor(&page, after.as_deref(), &resource)?;
            steps.extend(page.data);
            match next {
                Some(cursor) => after = Some(cursor),
                None => return Ok(steps),
            }
        }
    }

    async fn last_message_by_role(
        &self,
        thread_id: &ThreadId,
        role: MessageRole,
    ) -> Result<Option<ThreadMessage>, AgentsError> {
        let path = format!("/threads/{}/messages", segment(thread_id.as_str()));
        let resource = format!("messages of thread '{thread_id}'");

        let mut after: Option<String> = None;
        loop {
            let page: Page<ThreadMessage> =
                self.page(&path, "desc", after.as_deref(), &resource).await?;
            let next = next_cursor(&page, after.as_deref(), &resource)?;
            if let Some(message) = page.data.into_iter().find(|m| m.role == role) {
                return Ok(Some(message));
            }
            match next {
                Some(cursor) => after = Some(cursor),
                None => return Ok(None),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn run_path(thread_id: &ThreadId, run_id: &RunId) -> String {
    format!(
        "/threads/{}/runs/{}",
        segment(thread_id.as_str()),
        segment(run_id.as_str())
    )
}

/// Everything outside the RFC 3986 unreserved set.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn segment(value: &str) -> String {
    utf8_percent_encode(value, SEGMENT).to_string()
}

fn next_cursor<T>(
    page: &Page<T>,
    previous: Option<&str>,
    resource: &str,
) -> Result<Option<String>, AgentsError> {
    if !page.has_more {
        return Ok(None);
    }
    match page.last_id.as_deref() {
        Some(id) if Some(id) != previous => Ok(Some(id.to_string())),
        _ => Err(AgentsError::InvalidResponse {
            message: format!("{resource}: has_more is set without a new last_id cursor"),
        }),
    }
}

fn transport(err: reqwest::Error) -> AgentsError {
    AgentsError::Transport {
        message: err.to_string(),
    }
}

async fn error_from_response(response: Response, resource: &str) -> AgentsError {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| parse_retry_after(v, Utc::now()));
    let body = response.text().await.unwrap_or_default();

    let (code, message) = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => (
            envelope.error.code,
            envelope
                .error
                .message
                .unwrap_or_else(|| fallback_message(status, &body)),
        ),
        Err(_) => (None, fallback_message(status, &body)),
    };

    match status {
        StatusCode::NOT_FOUND => AgentsError::NotFound {
            resource: resource.to_string(),
            message,
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentsError::Authentication {
            status: status.as_u16(),
            message,
        },
        _ => AgentsError::RemoteService {
            status: status.as_u16(),
            code,
            message,
            retry_after,
        },
    }
}

/// Reads `Retry-After` as delta-seconds or as an HTTP-date relative to `now`.
/// A date in the past means retry immediately.
fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}

fn fallback_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        status.canonical_reason().unwrap_or("unknown error").to_string()
    } else {
        body.to_string()
    }
}

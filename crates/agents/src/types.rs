//! Records exchanged with the agent service.
//!
//! Every record here is owned by the remote service and addressed by one of
//! the identifiers in [`crate::identifiers`]. The polymorphic payloads (step
//! details, tool calls, message content, annotations) are closed tagged
//! unions: each carries an `Other` variant that absorbs kinds this crate does
//! not interpret, so consumers match exhaustively and skip unknown kinds
//! through an explicit default arm.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    AgentId, ConnectionId, MessageId, ModelDeployment, RunId, RunStepId, ThreadId, ToolCallId,
};

// ---------------------------------------------------------------------------
// Connections
// ---------------------------------------------------------------------------

/// A named, pre-registered binding to an external tool integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Identifier used when declaring tools that depend on this connection.
    pub id: ConnectionId,

    /// Registration name the connection was looked up by.
    #[serde(default)]
    pub name: String,

    /// Service-defined connection category, when reported.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// A capability declared on an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolDefinition {
    /// Remote browser automation driven through a tool connection.
    BrowserAutomation {
        /// Parameters binding the tool to its browser workspace.
        browser_automation: BrowserAutomationParameters,
    },
    /// Any tool kind this crate does not declare itself.
    #[serde(other)]
    Other,
}

impl ToolDefinition {
    /// Declares the browser-automation tool bound to `connection`.
    pub fn browser_automation(connection: ConnectionId) -> Self {
        Self::BrowserAutomation {
            browser_automation: BrowserAutomationParameters {
                connection: ToolConnection { id: connection },
            },
        }
    }
}

/// Parameters of the browser-automation tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserAutomationParameters {
    /// The connection that resolves to the browser workspace.
    pub connection: ToolConnection,
}

/// A reference to a resolved connection inside a tool definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConnection {
    /// The resolved connection identifier.
    pub id: ConnectionId,
}

/// Everything needed to create a remote agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentDefinition {
    /// Model deployment the agent runs on.
    pub model: ModelDeployment,
    /// Display name of the agent.
    pub name: String,
    /// System instructions given to the agent.
    pub instructions: String,
    /// Declared capabilities.
    pub tools: Vec<ToolDefinition>,
}

/// A remote agent as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,
}

/// An ordered conversation container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: ThreadId,
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Author of a thread message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageRole {
    #[serde(rename = "user")]
    User,
    /// The agent. The service calls this role `assistant`.
    #[serde(rename = "assistant")]
    Agent,
}

impl MessageRole {
    /// Returns the wire name of the role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Agent => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message appended to a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub id: MessageId,
    #[serde(default)]
    pub thread_id: Option<ThreadId>,
    pub role: MessageRole,
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

impl ThreadMessage {
    /// Text segments of the message, in order.
    pub fn text_messages(&self) -> impl Iterator<Item = &MessageText> {
        self.content.iter().filter_map(|c| match c {
            MessageContent::Text { text } => Some(text),
            MessageContent::Other => None,
        })
    }

    /// URL citations attached to any text segment, in order.
    pub fn url_citations(&self) -> impl Iterator<Item = &UrlCitation> {
        self.text_messages()
            .flat_map(|t| t.annotations.iter())
            .filter_map(|a| match a {
                MessageAnnotation::UrlCitation { url_citation, .. } => Some(url_citation),
                MessageAnnotation::Other => None,
            })
    }
}

/// One content segment of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: MessageText },
    #[serde(other)]
    Other,
}

/// A text segment with its annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageText {
    pub value: String,
    #[serde(default)]
    pub annotations: Vec<MessageAnnotation>,
}

/// An annotation on a text segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageAnnotation {
    UrlCitation {
        /// The placeholder text in the message the citation replaces.
        #[serde(default)]
        text: Option<String>,
        url_citation: UrlCitation,
    },
    #[serde(other)]
    Other,
}

/// A cited web page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlCitation {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
}

// ---------------------------------------------------------------------------
// Runs
// ---------------------------------------------------------------------------

/// Lifecycle status of a [`Run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    /// The run is waiting for client-side tool output.
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Expired,
    Incomplete,
    /// A status value this crate does not recognise.
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Returns `true` if no further progress will occur on the run.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Cancelled | Self::Expired | Self::Incomplete
        )
    }

    /// Returns the wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::RequiresAction => "requires_action",
            Self::Cancelling => "cancelling",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Completed => "completed",
            Self::Expired => "expired",
            Self::Incomplete => "incomplete",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error payload reported by the service for a failed run or step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.code.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

/// One execution of an agent against a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    #[serde(default)]
    pub thread_id: Option<ThreadId>,
    #[serde(default, rename = "assistant_id")]
    pub agent_id: Option<AgentId>,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunError>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Run {
    /// Wall-clock time between creation and completion, when both are known.
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.created_at, self.completed_at) {
            (Some(start), Some(end)) if end >= start => Some(end - start),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Run steps
// ---------------------------------------------------------------------------

/// Status of a single [`RunStep`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStepStatus {
    InProgress,
    Cancelled,
    Failed,
    Completed,
    Expired,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for RunStepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::InProgress => "in_progress",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Completed => "completed",
            Self::Expired => "expired",
            Self::Unknown => "unknown",
        })
    }
}

/// One unit of progress within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStep {
    pub id: RunStepId,
    pub status: RunStepStatus,
    pub step_details: StepDetails,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

/// What a run step did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepDetails {
    /// The agent produced a message.
    MessageCreation {
        message_creation: MessageCreationDetails,
    },
    /// The agent invoked one or more tools.
    ToolCalls { tool_calls: Vec<ToolCall> },
    #[serde(other)]
    Other,
}

/// Points at the message a [`StepDetails::MessageCreation`] step produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageCreationDetails {
    pub message_id: MessageId,
}

/// A single tool invocation within a tool-call step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolCall {
    BrowserAutomation {
        id: ToolCallId,
        browser_automation: BrowserAutomationCall,
    },
    /// Any other tool kind (code interpreter, function, search, ...).
    #[serde(other)]
    Other,
}

/// Inputs, outputs and navigation trace of a browser-automation call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BrowserAutomationCall {
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub steps: Vec<BrowserStep>,
}

/// One navigation step taken by the remote browser.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BrowserStep {
    #[serde(default)]
    pub last_step_result: String,
    #[serde(default)]
    pub current_state: String,
    #[serde(default)]
    pub next_step: String,
}

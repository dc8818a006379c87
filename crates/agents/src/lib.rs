//! Domain model for the browser agent demo.
//!
//! This crate contains the identifiers, records, error types and the service
//! port used throughout the workspace. Infrastructure crates implement the
//! [`AgentsService`] trait defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Domain types + port definitions.** This crate has no I/O dependencies.
//! It defines *what* the agent service offers; `agents-http` defines *how* to
//! reach it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`AgentId`, `ThreadId`, `RunId`, etc.) |
//! | [`types`] | Remote records (`Run`, `RunStep`, `ThreadMessage`, etc.) |
//! | [`errors`] | Service error and retry-policy types |
//! | [`ports`] | The [`AgentsService`] trait |

pub mod errors;
pub mod identifiers;
pub mod ports;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{AgentsError, RetryPolicy};
pub use identifiers::{
    AgentId, ConnectionId, ConnectionName, MessageId, ModelDeployment, RunId, RunStepId, ThreadId,
    ToolCallId,
};
pub use ports::AgentsService;
pub use types::{
    Agent, AgentDefinition, BrowserAutomationCall, BrowserAutomationParameters, BrowserStep,
    Connection, MessageAnnotation, MessageContent, MessageCreationDetails, MessageRole,
    MessageText, Run, RunError, RunStatus, RunStep, RunStepStatus, StepDetails, Thread,
    ThreadMessage, ToolCall, ToolConnection, ToolDefinition, UrlCitation,
};

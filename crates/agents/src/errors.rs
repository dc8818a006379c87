//! Error and retry-policy types for calls against the agent service.
//!
//! [`AgentsError`] covers every failure a port call can report. Callers decide
//! whether to re-issue a call through [`AgentsError::retry_policy`]; nothing
//! in this crate retries on its own.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::RunId;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// - `Retryable` errors: request timeouts, throttling, server-side faults,
///   dropped connections.
/// - `NonRetryable` errors: missing resources, rejected credentials, invalid
///   requests, malformed responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    Retryable {
        /// Minimum back-off before the next attempt, derived from the
        /// `Retry-After` response header when the service sent one. `None`
        /// means apply the caller's own back-off schedule.
        after: Option<Duration>,
    },
    /// The operation must not be retried.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Service errors
// ---------------------------------------------------------------------------

/// Failures reported by an [`crate::AgentsService`] implementation.
#[derive(Debug, Error)]
pub enum AgentsError {
    /// The addressed resource does not exist (e.g. an unknown connection name).
    #[error("{resource} not found: {message}")]
    NotFound {
        /// Label of the resource that was looked up (e.g. `"connection 'x'"`).
        resource: String,
        message: String,
    },

    /// The service rejected the ambient credential.
    #[error("Authentication failed (HTTP {status}): {message}")]
    Authentication { status: u16, message: String },

    /// The service answered with a non-success status.
    #[error("Agent service returned HTTP {status}: {message}")]
    RemoteService {
        status: u16,
        /// Service-specific error code from the error body, when present.
        code: Option<String>,
        message: String,
        /// Parsed `Retry-After` header.
        retry_after: Option<Duration>,
    },

    /// The configured endpoint cannot be used as a base URL.
    #[error("Invalid agent service endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// The request never produced a response (DNS, TLS, connection reset, timeout).
    #[error("Transport failure: {message}")]
    Transport { message: String },

    /// A response arrived but its body did not match the expected shape.
    #[error("Invalid response from agent service: {message}")]
    InvalidResponse { message: String },

    /// The run did not reach a terminal status before the configured deadline.
    #[error("Run {run_id} did not finish within {waited:?}")]
    RunTimedOut { run_id: RunId, waited: Duration },

    /// Waiting for the run was cancelled locally.
    #[error("Waiting for run {run_id} was cancelled")]
    RunCancelled { run_id: RunId },
}

impl AgentsError {
    /// Returns whether the failed call may be re-issued.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::RemoteService {
                status,
                retry_after,
                ..
            } if *status == 408 || *status == 429 || *status >= 500 => RetryPolicy::Retryable {
                after: *retry_after,
            },
            Self::Transport { .. } => RetryPolicy::Retryable { after: None },
            _ => RetryPolicy::NonRetryable,
        }
    }

    /// Short, stable name of the error variant, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NotFound",
            Self::Authentication { .. } => "Authentication",
            Self::RemoteService { .. } => "RemoteService",
            Self::InvalidEndpoint { .. } => "InvalidEndpoint",
            Self::Transport { .. } => "Transport",
            Self::InvalidResponse { .. } => "InvalidResponse",
            Self::RunTimedOut { .. } => "RunTimedOut",
            Self::RunCancelled { .. } => "RunCancelled",
        }
    }
}

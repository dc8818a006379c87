//! Newtype identifiers for remote agent-service resources.
//!
//! Every record the agent service returns is addressed by an opaque string
//! identifier. Each kind gets its own newtype so a [`ThreadId`] can never be
//! passed where a [`RunId`] is expected, even though both are strings on the
//! wire.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers — service-assigned
// ---------------------------------------------------------------------------

string_id! {
    /// Identifies a resolved connection to an external tool integration.
    ///
    /// Obtained by looking up a [`ConnectionName`]; passed to the agent
    /// definition so the service knows which browser workspace to drive.
    ConnectionId
}

string_id! {
    /// Identifies a remote agent.
    ///
    /// Agents outlive the process; the identifier can be reused by later runs.
    AgentId
}

string_id! {
    /// Identifies a conversation thread.
    ThreadId
}

string_id! {
    /// Identifies a message appended to a thread.
    MessageId
}

string_id! {
    /// Identifies one execution of an agent over a thread.
    RunId
}

string_id! {
    /// Identifies one unit of progress within a run.
    RunStepId
}

string_id! {
    /// Identifies a tool invocation inside a tool-call step.
    ToolCallId
}

// ---------------------------------------------------------------------------
// Identifiers — configuration-supplied
// ---------------------------------------------------------------------------

string_id! {
    /// The human-readable name under which a tool connection was registered
    /// with the service (e.g. `"playwright-connection"`).
    ConnectionName
}

string_id! {
    /// Names the model deployment an agent runs on (e.g. `"gpt-4.1"`).
    ModelDeployment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_identifier_is_rejected() {
        assert!(RunId::new("").is_none());
        assert!(ThreadId::new(String::new()).is_none());
    }

    #[test]
    fn identifier_round_trips_as_bare_json_string() {
        let id = AgentId::new("asst_123").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"asst_123\"");

        let back: AgentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert_eq!(back.to_string(), "asst_123");
    }
}

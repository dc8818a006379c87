//! The port through which orchestration code reaches the agent service.
//!
//! Infrastructure crates implement [`AgentsService`]; orchestration code is
//! generic over it so tests can substitute an in-memory double.

use async_trait::async_trait;

use crate::{
    Agent, AgentDefinition, AgentId, AgentsError, Connection, ConnectionName, MessageRole, Run,
    RunId, RunStep, Thread, ThreadId, ThreadMessage,
};

/// Request/response operations offered by the remote agent service.
///
/// Every method is an independent remote call with its own failure modes;
/// implementations must not retry internally.
#[async_trait]
pub trait AgentsService: Send + Sync {
    /// Resolves a registered tool connection by name.
    ///
    /// Returns [`AgentsError::NotFound`] when no connection has that name.
    async fn get_connection(&self, name: &ConnectionName) -> Result<Connection, AgentsError>;

    /// Returns the telemetry sink connection string configured for the
    /// project, or `None` when no sink is attached.
    async fn telemetry_connection_string(&self) -> Result<Option<String>, AgentsError>;

    /// Creates a remote agent.
    async fn create_agent(&self, definition: &AgentDefinition) -> Result<Agent, AgentsError>;

    /// Creates an empty conversation thread.
    async fn create_thread(&self) -> Result<Thread, AgentsError>;

    /// Appends a message to a thread.
    async fn create_message(
        &self,
        thread_id: &ThreadId,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage, AgentsError>;

    /// Starts a run of `agent_id` over `thread_id`. Returns immediately with
    /// the run in a non-terminal status.
    async fn create_run(&self, thread_id: &ThreadId, agent_id: &AgentId)
        -> Result<Run, AgentsError>;

    /// Fetches the current state of a run.
    async fn get_run(&self, thread_id: &ThreadId, run_id: &RunId) -> Result<Run, AgentsError>;

    /// Asks the service to cancel a run. The returned run is usually in the
    /// `cancelling` status.
    async fn cancel_run(&self, thread_id: &ThreadId, run_id: &RunId) -> Result<Run, AgentsError>;

    /// Lists every step of a run in execution order.
    async fn list_run_steps(
        &self,
        thread_id: &ThreadId,
        run_id: &RunId,
    ) -> Result<Vec<RunStep>, AgentsError>;

    /// Returns the most recent message on the thread authored by `role`.
    async fn last_message_by_role(
        &self,
        thread_id: &ThreadId,
        role: MessageRole,
    ) -> Result<Option<ThreadMessage>, AgentsError>;
}

//! Scripted in-memory agent service shared by the orchestration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use agents::{
    Agent, AgentDefinition, AgentId, AgentsError, AgentsService, Connection, ConnectionName,
    MessageRole, Run, RunError, RunId, RunStatus, RunStep, Thread, ThreadId, ThreadMessage,
};
use async_trait::async_trait;
use serde_json::json;
use session::config::{BROWSER_CONNECTION_NAME, MODEL_DEPLOYMENT_NAME, PROJECT_ENDPOINT};
use session::{ExporterInstaller, TelemetryError, TelemetrySink};

pub const THREAD: &str = "thread_1";
pub const AGENT: &str = "asst_1";
pub const RUN: &str = "run_1";

/// What the telemetry lookup answers.
#[derive(Debug, Clone)]
pub enum Telemetry {
    NotConfigured,
    ConnectionString(String),
    Fails(fn() -> AgentsError),
}

/// An [`AgentsService`] that answers from a fixed script and records every call.
pub struct ScriptedService {
    calls: Mutex<Vec<&'static str>>,
    telemetry: Telemetry,
    connection_exists: bool,
    poll_statuses: Mutex<VecDeque<RunStatus>>,
    final_status: RunStatus,
    cancelled: AtomicBool,
    transient_failures: AtomicUsize,
    last_error: Option<RunError>,
    steps: Vec<RunStep>,
    final_message: Option<ThreadMessage>,
    released: Option<Arc<AtomicBool>>,
}

impl Default for ScriptedService {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            telemetry: Telemetry::NotConfigured,
            connection_exists: true,
            poll_statuses: Mutex::new(VecDeque::new()),
            final_status: RunStatus::Completed,
            cancelled: AtomicBool::new(false),
            transient_failures: AtomicUsize::new(0),
            last_error: None,
            steps: Vec::new(),
            final_message: None,
            released: None,
        }
    }
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn without_connection(mut self) -> Self {
        self.connection_exists = false;
        self
    }

    /// Statuses returned by successive polls before settling on `final_status`.
    pub fn with_polls(mut self, statuses: &[RunStatus], final_status: RunStatus) -> Self {
        self.poll_statuses = Mutex::new(statuses.iter().copied().collect());
        self.final_status = final_status;
        self
    }

    pub fn with_transient_poll_failures(self, count: usize) -> Self {
        self.transient_failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn with_last_error(mut self, code: &str, message: &str) -> Self {
        self.last_error = Some(RunError {
            code: code.into(),
            message: message.into(),
        });
        self
    }

    pub fn with_steps(mut self, steps: serde_json::Value) -> Self {
        self.steps = serde_json::from_value(steps).expect("valid run steps");
        self
    }

    pub fn with_final_message(mut self, message: serde_json::Value) -> Self {
        self.final_message = Some(serde_json::from_value(message).expect("valid message"));
        self
    }

    /// Sets `flag` when the service is dropped.
    pub fn tracking_release(mut self, flag: Arc<AtomicBool>) -> Self {
        self.released = Some(flag);
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| **c == name).count()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    fn run(&self, status: RunStatus) -> Run {
        serde_json::from_value(json!({
            "id": RUN,
            "thread_id": THREAD,
            "assistant_id": AGENT,
            "status": status,
            "last_error": if status == RunStatus::Failed { serde_json::to_value(&self.last_error).unwrap() } else { serde_json::Value::Null },
            "created_at": 1_700_000_000,
            "completed_at": if status.is_terminal() { json!(1_700_000_030) } else { serde_json::Value::Null },
        }))
        .unwrap()
    }
}

impl Drop for ScriptedService {
    fn drop(&mut self) {
        if let Some(flag) = &self.released {
            flag.store(true, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl AgentsService for ScriptedService {
    async fn get_connection(&self, name: &ConnectionName) -> Result<Connection, AgentsError> {
        self.record("get_connection");
        if !self.connection_exists {
            return Err(AgentsError::NotFound {
                resource: format!("connection '{name}'"),
                message: "no connection with this name".into(),
            });
        }
        Ok(serde_json::from_value(json!({ "id": "conn_1", "name": name.as_str() })).unwrap())
    }

    async fn telemetry_connection_string(&self) -> Result<Option<String>, AgentsError> {
        self.record("telemetry_connection_string");
        match &self.telemetry {
            Telemetry::NotConfigured => Ok(None),
            Telemetry::ConnectionString(s) => Ok(Some(s.clone())),
            Telemetry::Fails(make) => Err(make()),
        }
    }

    async fn create_agent(&self, definition: &AgentDefinition) -> Result<Agent, AgentsError> {
        self.record("create_agent");
        Ok(serde_json::from_value(json!({
            "id": AGENT,
            "name": definition.name,
            "model": definition.model.as_str(),
            "tools": definition.tools,
        }))
        .unwrap())
    }

    async fn create_thread(&self) -> Result<Thread, AgentsError> {
        self.record("create_thread");
        Ok(Thread {
            id: ThreadId::new(THREAD).unwrap(),
        })
    }

    async fn create_message(
        &self,
        thread_id: &ThreadId,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage, AgentsError> {
        self.record("create_message");
        Ok(serde_json::from_value(json!({
            "id": "msg_user",
            "thread_id": thread_id.as_str(),
            "role": role,
            "content": [{ "type": "text", "text": { "value": content } }],
        }))
        .unwrap())
    }

    async fn create_run(
        &self,
        _thread_id: &ThreadId,
        _agent_id: &AgentId,
    ) -> Result<Run, AgentsError> {
        self.record("create_run");
        Ok(self.run(RunStatus::Queued))
    }

    async fn get_run(&self, _thread_id: &ThreadId, _run_id: &RunId) -> Result<Run, AgentsError> {
        self.record("get_run");
        if self
            .transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(AgentsError::RemoteService {
                status: 503,
                code: None,
                message: "service unavailable".into(),
                retry_after: None,
            });
        }
        if self.cancelled.load(Ordering::SeqCst) {
            return Ok(self.run(RunStatus::Cancelled));
        }
        let status = self
            .poll_statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.final_status);
        Ok(self.run(status))
    }

    async fn cancel_run(&self, _thread_id: &ThreadId, _run_id: &RunId) -> Result<Run, AgentsError> {
        self.record("cancel_run");
        self.cancelled.store(true, Ordering::SeqCst);
        Ok(self.run(RunStatus::Cancelling))
    }

    async fn list_run_steps(
        &self,
        _thread_id: &ThreadId,
        _run_id: &RunId,
    ) -> Result<Vec<RunStep>, AgentsError> {
        self.record("list_run_steps");
        Ok(self.steps.clone())
    }

    async fn last_message_by_role(
        &self,
        _thread_id: &ThreadId,
        role: MessageRole,
    ) -> Result<Option<ThreadMessage>, AgentsError> {
        self.record("last_message_by_role");
        Ok(self.final_message.clone().filter(|m| m.role == role))
    }
}

// ---------------------------------------------------------------------------
// Exporter installers
// ---------------------------------------------------------------------------

/// Installs nothing and remembers the sink endpoint it was asked for.
#[derive(Default)]
pub struct RecordingInstaller {
    pub installed: Mutex<Vec<(String, bool)>>,
}

impl ExporterInstaller for RecordingInstaller {
    type Exporter = String;

    fn install(
        &self,
        sink: &TelemetrySink,
        record_content: bool,
    ) -> Result<Self::Exporter, TelemetryError> {
        self.installed
            .lock()
            .unwrap()
            .push((sink.endpoint().to_string(), record_content));
        Ok(sink.endpoint().to_string())
    }
}

/// Always fails to install.
pub struct FailingInstaller;

impl ExporterInstaller for FailingInstaller {
    type Exporter = ();

    fn install(&self, _sink: &TelemetrySink, _record_content: bool) -> Result<(), TelemetryError> {
        Err(TelemetryError::Exporter {
            message: "collector unreachable".into(),
            source: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

pub fn complete_env() -> HashMap<String, String> {
    [
        (PROJECT_ENDPOINT, "https://agents.example.com/api/projects/demo"),
        (BROWSER_CONNECTION_NAME, "playwright-connection"),
        (MODEL_DEPLOYMENT_NAME, "gpt-4.1"),
        ("RUN_POLL_INTERVAL_MS", "100"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

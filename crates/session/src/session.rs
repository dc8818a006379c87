//! Agent session: connection lookup, agent, thread, task message and run.
//!
//! Each remote call runs inside its own span. Spans are a side channel only;
//! nothing here reads them back or branches on whether they are exported.

use std::io::Write;

use agents::{
    Agent, AgentDefinition, AgentsService, Connection, MessageRole, Run, RunStatus, Thread,
    ThreadMessage, ToolDefinition,
};
use tokio_util::sync::CancellationToken;
use tracing::{field, info, info_span, Instrument};

use crate::config::Settings;
use crate::runs::create_and_await_run;
use crate::DemoError;

/// Name given to the remote agent.
pub const AGENT_NAME: &str = "browser-automation-agent";

/// System instructions given to the remote agent.
pub const AGENT_INSTRUCTIONS: &str = "You are a helpful assistant with browser automation capabilities. \
You can navigate websites, extract information, and interact with web pages. \
Use the browser automation tool to complete tasks as requested.";

/// The task posted to the thread.
pub const TASK_MESSAGE: &str = "Your goal is to report the Microsoft year-to-date stock price change.

To do that:
1. Go to the website finance.yahoo.com
2. At the top of the page, find the search bar
3. Enter 'MSFT' to get Microsoft stock information
4. On the resulting page, find the default chart showing Microsoft stock price
5. Click on 'YTD' at the top of that chart
6. Report the percent value that shows below the chart

Please complete this task and provide me with the YTD percentage change.";

/// Recorded on the run span to classify the task.
pub const TASK_TYPE: &str = "stock_price_extraction";

/// Everything the session created, in creation order.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub connection: Connection,
    pub agent: Agent,
    pub thread: Thread,
    pub message: ThreadMessage,
    /// The run in its terminal status.
    pub run: Run,
}

impl SessionRecord {
    /// `true` when the run ended in the `failed` status.
    pub fn run_failed(&self) -> bool {
        self.run.status == RunStatus::Failed
    }
}

/// Drives one agent session against `service`.
pub struct AgentSession<'a, S: ?Sized> {
    service: &'a S,
    settings: &'a Settings,
}

impl<'a, S> AgentSession<'a, S>
where
    S: AgentsService + ?Sized,
{
    pub fn new(service: &'a S, settings: &'a Settings) -> Self {
        Self { service, settings }
    }

    /// Creates the agent, thread and task message, then awaits the run.
    ///
    /// Every service error propagates unchanged; a run that ends in `failed`
    /// is returned normally for the caller to inspect.
    pub async fn run<W: Write>(
        &self,
        cancel: &CancellationToken,
        out: &mut W,
    ) -> Result<SessionRecord, DemoError> {
        let settings = self.settings;

        writeln!(out)?;
        writeln!(out, "Retrieving browser connection: {}", settings.connection_name)?;
        let connection = self.service.get_connection(&settings.connection_name).await?;
        info!(connection.id = %connection.id, "connection resolved");
        writeln!(out, "Connected! Connection ID: {}", connection.id)?;

        writeln!(out)?;
        writeln!(out, "Creating agent with the browser automation tool...")?;
        let definition = AgentDefinition {
            model: settings.model.clone(),
            name: AGENT_NAME.to_string(),
            instructions: AGENT_INSTRUCTIONS.to_string(),
            tools: vec![ToolDefinition::browser_automation(connection.id.clone())],
        };
        let agent = async {
            let agent = self.service.create_agent(&definition).await?;
            info!(agent.id = %agent.id, model = %settings.model, "agent created");
            Ok::<_, DemoError>(agent)
        }
        .instrument(info_span!("create_agent", gen_ai.request.model = %settings.model))
        .await?;
        writeln!(out, "Agent created! Agent ID: {}", agent.id)?;

        writeln!(out)?;
        writeln!(out, "Creating conversation thread...")?;
        let thread = async {
            let thread = self.service.create_thread().await?;
            info!(thread.id = %thread.id, "thread created");
            Ok::<_, DemoError>(thread)
        }
        .instrument(info_span!("create_thread"))
        .await?;
        writeln!(out, "Thread created! Thread ID: {}", thread.id)?;

        writeln!(out)?;
        writeln!(out, "Sending task to agent...")?;
        let message_span = info_span!(
            "create_message",
            thread.id = %thread.id,
            gen_ai.message.content = field::Empty,
        );
        if settings.record_content {
            message_span.record("gen_ai.message.content", TASK_MESSAGE);
        }
        let message = async {
            let message = self
                .service
                .create_message(&thread.id, MessageRole::User, TASK_MESSAGE)
                .await?;
            info!(message.id = %message.id, "task message created");
            Ok::<_, DemoError>(message)
        }
        .instrument(message_span)
        .await?;
        writeln!(out, "Message created! Message ID: {}", message.id)?;

        writeln!(out)?;
        writeln!(out, "Agent is working... This may take a minute as it navigates the website...")?;
        writeln!(out, "   (The agent will launch a browser, search for MSFT, and extract the data)")?;
        let run_span = info_span!(
            "agent_run",
            agent.id = %agent.id,
            thread.id = %thread.id,
            "task.type" = TASK_TYPE,
            run.id = field::Empty,
            run.status = field::Empty,
        );
        let run = create_and_await_run(
            self.service,
            &thread.id,
            &agent.id,
            &settings.run,
            cancel,
        )
        .instrument(run_span.clone())
        .await?;
        run_span.record("run.id", field::display(&run.id));
        run_span.record("run.status", field::display(run.status));

        writeln!(out)?;
        writeln!(out, "Agent run completed! Status: {}", run.status)?;

        Ok(SessionRecord {
            connection,
            agent,
            thread,
            message,
            run,
        })
    }
}

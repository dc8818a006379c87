//! The end-to-end demo flow.
//!
//! [`run_demo`] validates configuration, opens the service client through a
//! caller-supplied factory, bootstraps tracing, runs the agent session and
//! reports its results. The client is owned by this function's scope and is
//! dropped on every exit path.

use std::io::Write;

use agents::{AgentId, AgentsError, AgentsService, Run, ThreadId};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, Instrument};

use crate::config::{
    load_settings, ConfigError, Environment, Settings, BROWSER_CONNECTION_NAME,
    CONTENT_RECORDING_ENABLED, MODEL_DEPLOYMENT_NAME, PROJECT_ENDPOINT,
};
use crate::report::report_results;
use crate::session::AgentSession;
use crate::telemetry::{bootstrap_tracing, ExporterInstaller};
use crate::DemoError;

/// How a demo invocation ended without an error.
#[derive(Debug, Clone, PartialEq)]
pub enum DemoOutcome {
    /// Required settings were missing; no client was created.
    MissingConfiguration(Vec<&'static str>),
    /// An optional setting could not be interpreted; no client was created.
    InvalidConfiguration(ConfigError),
    /// The run ended in `failed`; results were not reported.
    RunFailed { run: Run },
    /// The run finished and its results were reported.
    Completed {
        agent_id: AgentId,
        thread_id: ThreadId,
        run: Run,
        tracing_active: bool,
    },
}

/// Runs the demo once.
///
/// `connect` is only invoked after configuration has been validated. Any
/// service error after that point is reported together with troubleshooting
/// guidance and then returned.
pub async fn run_demo<E, C, S, I, W>(
    env: &mut E,
    connect: C,
    installer: &I,
    cancel: &CancellationToken,
    out: &mut W,
) -> Result<DemoOutcome, DemoError>
where
    E: Environment + ?Sized,
    C: FnOnce(&Settings) -> Result<S, AgentsError>,
    S: AgentsService,
    I: ExporterInstaller + ?Sized,
    W: Write,
{
    let settings = match load_settings(env) {
        Ok(settings) => settings,
        Err(ConfigError::Missing(missing)) => {
            write_missing_settings(&missing, out)?;
            return Ok(DemoOutcome::MissingConfiguration(missing));
        }
        Err(invalid) => {
            writeln!(out, "Invalid configuration: {invalid}")?;
            return Ok(DemoOutcome::InvalidConfiguration(invalid));
        }
    };

    if settings.content_recording_defaulted {
        writeln!(out, "Enabled trace content recording")?;
    }

    writeln!(out, "Initializing agent service client...")?;
    let client = match connect(&settings) {
        Ok(client) => client,
        Err(err) => return Err(report_failure(err, out)?),
    };

    let exporter = bootstrap_tracing(&client, installer, settings.record_content, out).await?;
    let tracing_active = exporter.is_some();

    let outcome = drive(&client, &settings, tracing_active, cancel, out)
        .instrument(info_span!("browser_automation_demo"))
        .await;

    match outcome {
        Err(DemoError::Service(err)) => Err(report_failure(err, out)?),
        other => other,
    }
}

async fn drive<S, W>(
    client: &S,
    settings: &Settings,
    tracing_active: bool,
    cancel: &CancellationToken,
    out: &mut W,
) -> Result<DemoOutcome, DemoError>
where
    S: AgentsService + ?Sized,
    W: Write,
{
    let record = AgentSession::new(client, settings).run(cancel, out).await?;

    if record.run_failed() {
        let last_error = record
            .run
            .last_error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "no error details reported".to_string());
        error!(run.id = %record.run.id, error = %last_error, "run failed");
        writeln!(out, "Run failed: {last_error}")?;
        return Ok(DemoOutcome::RunFailed { run: record.run });
    }

    report_results(client, &record.thread.id, &record.run, settings.record_content, out).await?;

    writeln!(out)?;
    writeln!(out, "Agent preserved for future use!")?;
    writeln!(out, "   Agent ID: {}", record.agent.id)?;
    writeln!(out, "   Thread ID: {}", record.thread.id)?;
    writeln!(out)?;
    writeln!(out, "   You can reuse this agent in future runs.")?;
    if let Some(duration) = record.run.duration() {
        writeln!(out, "   Run took {}s", duration.num_seconds())?;
    }

    writeln!(out)?;
    writeln!(out, "Demo completed successfully!")?;
    if tracing_active {
        writeln!(out)?;
        writeln!(out, "View detailed traces in your tracing backend.")?;
        writeln!(out, "   Note: traces can take 1-2 minutes to appear")?;
    } else {
        writeln!(out)?;
        writeln!(out, "Tracing was not enabled for this run.")?;
        writeln!(out, "   Connect a telemetry sink to the project to enable tracing.")?;
    }
    info!(agent.id = %record.agent.id, thread.id = %record.thread.id, "demo completed");

    Ok(DemoOutcome::Completed {
        agent_id: record.agent.id,
        thread_id: record.thread.id,
        run: record.run,
        tracing_active,
    })
}

fn write_missing_settings<W: Write>(missing: &[&str], out: &mut W) -> std::io::Result<()> {
    writeln!(out, "Missing required environment variables:")?;
    for name in missing {
        writeln!(out, "   - {name}")?;
    }
    writeln!(out)?;
    writeln!(out, "Please set these environment variables before running.")?;
    writeln!(out)?;
    writeln!(out, "Example:")?;
    writeln!(out, "export {PROJECT_ENDPOINT}=\"https://your-project.example.com/api/projects/your-project-id\"")?;
    writeln!(out, "export {BROWSER_CONNECTION_NAME}=\"playwright-connection\"")?;
    writeln!(out, "export {MODEL_DEPLOYMENT_NAME}=\"gpt-4.1\"")?;
    writeln!(out)?;
    writeln!(out, "Optional (for tracing):")?;
    writeln!(out, "export {CONTENT_RECORDING_ENABLED}=\"true\"")?;
    Ok(())
}

/// Prints the error and the troubleshooting checklist, then hands the error
/// back for propagation.
fn report_failure<W: Write>(err: AgentsError, out: &mut W) -> Result<DemoError, DemoError> {
    error!(error.kind = err.kind(), error = %err, "demo aborted");
    writeln!(out)?;
    writeln!(out, "Error: {err}")?;
    writeln!(out)?;
    writeln!(out, "Troubleshooting:")?;
    writeln!(out, "1. Ensure the browser automation workspace exists and is reachable")?;
    writeln!(out, "2. Verify the connection is registered in the project under connected resources")?;
    writeln!(out, "3. Check that your {PROJECT_ENDPOINT} is correct")?;
    writeln!(out, "4. Ensure your identity has the contributor role on the browser workspace")?;
    Ok(DemoError::Service(err))
}

//! Browser agent demo entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Load configuration** — read a `.env` file when present; the demo flow
//!    validates the process environment itself.
//! 2. **Wire observability** — install a `tracing-subscriber` console layer
//!    with an empty slot that the OTLP exporter fills once the agent service
//!    reports a telemetry sink.
//! 3. **Construct infrastructure** — build the [`HttpAgentsClient`] from the
//!    validated settings and the ambient credential, and hand it to
//!    [`session::run_demo`].
//! 4. **Map the outcome to an exit code** — missing configuration, a failed
//!    run, and success all exit 0; a service error exits 1; an unusable
//!    optional setting exits 2.

mod observability;

use std::future::Future;
use std::io;
use std::process::ExitCode;

use agents::AgentsError;
use agents_http::{ClientOptions, Credential, HttpAgentsClient, API_VERSION_VAR};
use session::{run_demo, DemoOutcome, ProcessEnvironment, Settings};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let dotenv = dotenvy::dotenv();
    let installer = observability::init()?;
    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "could not read the environment file"),
    }

    let cancel = CancellationToken::new();
    tokio::spawn(exit_on_second_interrupt(cancel.clone()));

    let mut env = ProcessEnvironment;
    let mut stdout = io::stdout();
    let result = run_demo(&mut env, connect, &installer, &cancel, &mut stdout).await;

    Ok(match result {
        Ok(DemoOutcome::InvalidConfiguration(_)) => ExitCode::from(2),
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "demo failed");
            ExitCode::FAILURE
        }
    })
}

fn connect(settings: &Settings) -> Result<HttpAgentsClient, AgentsError> {
    let mut options = ClientOptions::default();
    if let Some(version) = std::env::var(API_VERSION_VAR)
        .ok()
        .filter(|v| !v.trim().is_empty())
    {
        options.api_version = version;
    }
    HttpAgentsClient::with_options(&settings.endpoint, Credential::from_environment(), options)
}

/// Exit status after a second interrupt, as a shell reports SIGINT.
const INTERRUPTED: i32 = 130;

async fn exit_on_second_interrupt(cancel: CancellationToken) {
    if watch_interrupts(cancel, tokio::signal::ctrl_c).await {
        warn!("second interrupt received; exiting without waiting for the run to cancel");
        std::process::exit(INTERRUPTED);
    }
}

/// Cancels `cancel` on the first interrupt and returns `true` on the second.
///
/// Returns `false` if interrupts cannot be observed.
async fn watch_interrupts<F, Fut>(cancel: CancellationToken, mut interrupt: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if let Err(e) = interrupt().await {
        warn!(error = %e, "cannot listen for interrupts");
        return false;
    }
    warn!("interrupt received; cancelling the run (interrupt again to exit now)");
    cancel.cancel();

    interrupt().await.is_ok()
}
